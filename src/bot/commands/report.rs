use teloxide::prelude::*;
use teloxide::types::InputFile;
use crate::services::report::ReportService;
use crate::utils::feedback::{CommandFeedback, ProgressTracker};

pub async fn handle_view_report(
    bot: Bot,
    msg: Message,
    reports: &ReportService,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;

    let feedback = CommandFeedback::new(bot.clone(), chat_id);
    let mut progress = ProgressTracker::new(feedback, 2);
    progress.start("Exporting recorded marks...").await?;

    let summary = match reports.export().await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Report export failed for chat {}: {:#}", chat_id.0, e);
            progress.error("Failed to export marks. Please try again later.").await?;
            return Ok(());
        }
    };

    progress.next_step(&format!("Exported {} rows, sending the file...", summary.rows)).await?;

    let file_name = summary.file_name();
    bot.send_document(chat_id, InputFile::memory(summary.bytes).file_name(file_name)).await?;

    let completion_message = if summary.rows == 0 {
        "No marks recorded yet. The report only contains the header row.\n\n💡 Use /add_marks to record marks".to_string()
    } else {
        format!("Report ready with {} marks.", summary.rows)
    };
    progress.complete(&completion_message).await?;

    Ok(())
}
