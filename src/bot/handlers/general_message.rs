use teloxide::prelude::*;
use crate::bot::handlers::{send_reply, BotHandler, HandlerResult};
use crate::utils::feedback::CommandFeedback;

/// Free text is dialogue input while a session is open. Anything that looks
/// like a command is never stored as a field.
pub async fn text_handler(
    bot: Bot,
    msg: Message,
    text: String,
    handler: BotHandler,
) -> HandlerResult {
    let chat_id = msg.chat.id;

    if text.starts_with('/') {
        handle_general_message(bot, msg).await?;
        return Ok(());
    }

    match handler.dialogue.handle_text(chat_id, &text).await {
        Ok(Some(reply)) => {
            send_reply(bot, chat_id, &reply).await?;
        }
        Ok(None) => {
            handle_general_message(bot, msg).await?;
        }
        Err(e) => {
            tracing::error!("Dialogue storage error in chat {}: {:#}", chat_id.0, e);
            CommandFeedback::new(bot, chat_id)
                .error("Something went wrong, please try again.")
                .await?;
        }
    }

    Ok(())
}

pub async fn handle_general_message(
    bot: Bot,
    msg: Message,
) -> ResponseResult<()> {
    let feedback = CommandFeedback::new(bot.clone(), msg.chat.id);

    if let Some(text) = msg.text() {
        let lowered = text.to_lowercase();
        // Check if it looks like a malformed command
        if text.starts_with('/') {
            let error_msg = format!("Unknown command: {}", text.split_whitespace().next().unwrap_or(text));
            let suggestion = "Use /help to see all available commands.";
            feedback.validation_error(&error_msg, suggestion).await?;
        } else if lowered.contains("mark") || lowered.contains("score") {
            feedback.info("Want to record marks? Use /add_marks and answer the questions.").await?;
        } else if lowered.contains("report") || lowered.contains("export") {
            feedback.info("Use /view_report to download all recorded marks as a spreadsheet.").await?;
        } else if lowered.contains("help") {
            feedback.info("Use /help to see all available commands!").await?;
        }
        // For other messages, we don't respond to avoid spam
    }

    Ok(())
}
