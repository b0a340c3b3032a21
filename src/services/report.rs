use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::database::models::MarkRecord;
use crate::database::store::{MarkReport, RecordStore};
use crate::utils::logging::log_system_event;

pub const WORKSHEET_NAME: &str = "Marks";

/// Largest magnitude an `f64` cell holds without rounding (2^53).
const MAX_EXACT_NUMBER: i64 = 1 << 53;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub rows: usize,
    /// The workbook exactly as written to `path`.
    pub bytes: Vec<u8>,
}

impl ExportSummary {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "student_report.xlsx".to_string())
    }
}

/// Writes the marks table to a spreadsheet at a fixed path. Each export
/// overwrites the previous file. Exports run one at a time so the file on
/// disk is always a complete workbook.
#[derive(Clone)]
pub struct ReportService {
    store: RecordStore,
    path: PathBuf,
    export_lock: Arc<Mutex<()>>,
}

impl ReportService {
    pub fn new(store: RecordStore, path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            path: path.into(),
            export_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn export(&self) -> Result<ExportSummary> {
        let _guard = self.export_lock.lock().await;

        let report = self.store.export_all().await?;
        let rows = report.len();
        if report.is_empty() {
            log_system_event("Exporting empty report", Some("header row only"));
        }

        // rust_xlsxwriter is CPU bound; keep it off the runtime threads.
        let bytes = tokio::task::spawn_blocking(move || render_workbook(&report))
            .await
            .context("Report writer task failed")?
            .context("Failed to render report")?;

        tokio::fs::write(&self.path, &bytes)
            .await
            .with_context(|| format!("Failed to write report to {}", self.path.display()))?;

        log_system_event("Report exported", Some(&format!("{} rows to {}", rows, self.path.display())));
        Ok(ExportSummary {
            path: self.path.clone(),
            rows,
            bytes,
        })
    }
}

/// Serializes `report` as a single-sheet workbook with a bold header row.
/// An empty report still produces the header.
pub fn render_workbook(report: &MarkReport) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(WORKSHEET_NAME)?;

    for (col, title) in MarkReport::COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header_format)?;
    }

    for (index, record) in report.rows.iter().enumerate() {
        write_record(worksheet, index as u32 + 1, record)?;
    }

    workbook.save_to_buffer()
}

fn write_record(worksheet: &mut Worksheet, row: u32, record: &MarkRecord) -> Result<(), XlsxError> {
    write_integer(worksheet, row, 0, record.id)?;
    write_integer(worksheet, row, 1, record.student_id)?;
    worksheet.write_string(row, 2, &record.student_name)?;
    worksheet.write_string(row, 3, &record.class)?;
    worksheet.write_string(row, 4, &record.subject)?;
    worksheet.write_string(row, 5, &record.test_type)?;
    write_integer(worksheet, row, 6, record.practical_marks)?;
    write_integer(worksheet, row, 7, record.theoretical_marks)?;
    write_integer(worksheet, row, 8, record.total())?;
    Ok(())
}

// Numbers beyond 2^53 would be rounded by the f64 cell type, so they are
// written as text instead.
fn write_integer(worksheet: &mut Worksheet, row: u32, col: u16, value: i64) -> Result<(), XlsxError> {
    if value.unsigned_abs() <= MAX_EXACT_NUMBER as u64 {
        worksheet.write_number(row, col, value as f64)?;
    } else {
        worksheet.write_string(row, col, &value.to_string())?;
    }
    Ok(())
}
