//! Record store for students and their marks.
//!
//! The dialogue only ever writes through [`RecordStore::commit_entry`], which
//! resolves the student and appends the mark in one transaction.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::database::connection::DatabaseManager;
use crate::database::models::{Mark, MarkRecord, NewMark, Student};
use crate::utils::logging::{log_database_error, log_database_operation};

/// The five fields collected by one completed dialogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkEntry {
    pub student_name: String,
    pub subject: String,
    pub test_type: String,
    pub practical_marks: i64,
    pub theoretical_marks: i64,
}

/// Result of a successful [`RecordStore::commit_entry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedEntry {
    pub student_id: i64,
    pub student_created: bool,
    pub mark: Mark,
}

/// Snapshot of the marks table handed to the spreadsheet exporter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkReport {
    pub rows: Vec<MarkRecord>,
}

impl MarkReport {
    pub const COLUMNS: [&'static str; 9] = [
        "ID",
        "Student ID",
        "Student",
        "Class",
        "Subject",
        "Test Type",
        "Practical",
        "Theoretical",
        "Total",
    ];

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordCounts {
    pub students: i64,
    pub marks: i64,
}

#[derive(Clone)]
pub struct RecordStore {
    db: DatabaseManager,
    // Serializes writers so two first-time submissions of one name cannot
    // both take the insert path.
    write_lock: Arc<Mutex<()>>,
}

impl RecordStore {
    pub fn new(db: DatabaseManager) -> Self {
        Self {
            db,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn database(&self) -> &DatabaseManager {
        &self.db
    }

    /// Looks a student up by exact name, creating the row if needed.
    pub async fn find_or_create_student(&self, name: &str) -> Result<i64> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.db.pool.begin().await?;
        let (student_id, created) = Student::find_or_create(&mut *tx, name).await?;
        tx.commit().await?;

        if created {
            log_database_operation("INSERT", "students", Some(&format!("id={student_id}")));
        }
        Ok(student_id)
    }

    /// Appends one mark for an existing student.
    pub async fn insert_mark(
        &self,
        student_id: i64,
        subject: &str,
        test_type: &str,
        practical_marks: i64,
        theoretical_marks: i64,
    ) -> Result<Mark> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.db.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students WHERE id = ?")
            .bind(student_id)
            .fetch_one(&mut *tx)
            .await?;
        if exists == 0 {
            return Err(anyhow!("Student {} does not exist", student_id));
        }

        let mark = Mark::insert(
            &mut *tx,
            NewMark {
                student_id,
                subject: subject.to_string(),
                test_type: test_type.to_string(),
                practical_marks,
                theoretical_marks,
            },
        )
        .await?;
        tx.commit().await?;

        log_database_operation("INSERT", "marks", Some(&format!("id={} student_id={}", mark.id, student_id)));
        Ok(mark)
    }

    /// Resolves the student and stores the mark atomically. On any error the
    /// transaction is dropped uncommitted, so neither row is persisted.
    pub async fn commit_entry(&self, entry: &MarkEntry) -> Result<CommittedEntry> {
        let _guard = self.write_lock.lock().await;

        let result = async {
            let mut tx = self.db.pool.begin().await?;
            let (student_id, student_created) =
                Student::find_or_create(&mut *tx, &entry.student_name).await?;
            let mark = Mark::insert(
                &mut *tx,
                NewMark {
                    student_id,
                    subject: entry.subject.clone(),
                    test_type: entry.test_type.clone(),
                    practical_marks: entry.practical_marks,
                    theoretical_marks: entry.theoretical_marks,
                },
            )
            .await?;
            tx.commit().await?;
            Ok::<_, sqlx::Error>(CommittedEntry { student_id, student_created, mark })
        }
        .await;

        match result {
            Ok(committed) => {
                log_database_operation(
                    "COMMIT_ENTRY",
                    "students,marks",
                    Some(&format!(
                        "student_id={} created={} mark_id={}",
                        committed.student_id, committed.student_created, committed.mark.id
                    )),
                );
                Ok(committed)
            }
            Err(e) => {
                log_database_error("COMMIT_ENTRY", "students,marks", &e.to_string(), None);
                Err(e.into())
            }
        }
    }

    /// Reads every mark joined with its student, ordered by mark id.
    pub async fn export_all(&self) -> Result<MarkReport> {
        log_database_operation("SELECT", "marks", Some("export"));
        let rows = Mark::find_all_with_students(&self.db.pool).await?;
        Ok(MarkReport { rows })
    }

    pub async fn counts(&self) -> Result<RecordCounts> {
        Ok(RecordCounts {
            students: Student::count(&self.db.pool).await?,
            marks: Mark::count(&self.db.pool).await?,
        })
    }
}
