use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use crate::bot::commands::Command;
use crate::bot::handlers::{send_reply, sender, BotHandler, HandlerResult};
use crate::utils::feedback::CommandFeedback;
use crate::utils::logging::{log_command_error, log_command_start, log_command_success};

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    handler: BotHandler,
) -> HandlerResult {
    let chat_id = msg.chat.id;
    let (username, user_id) = sender(&msg);
    log_command_start(cmd.name(), &username, user_id, chat_id.0, None);

    match cmd {
        Command::Help => {
            bot.send_message(chat_id, Command::descriptions().to_string()).await?;
        }
        Command::Start => {
            bot.send_message(
                chat_id,
                "📚 Welcome to Teacher Marks Bot!\n\nUse /add_marks to record a student's marks.\nUse /view_report to download every recorded mark as a spreadsheet.\nUse /help to see all commands.",
            ).await?;
        }
        Command::AddMarks | Command::Cancel => {
            let outcome = if cmd == Command::AddMarks {
                handler.dialogue.begin(chat_id).await
            } else {
                handler.dialogue.cancel(chat_id).await
            };

            match outcome {
                Ok(reply) => {
                    send_reply(bot, chat_id, &reply).await?;
                }
                Err(e) => {
                    log_command_error(cmd.name(), &username, user_id, chat_id.0, &e.to_string());
                    CommandFeedback::new(bot, chat_id)
                        .error("Something went wrong, please try again.")
                        .await?;
                    return Ok(());
                }
            }
        }
        Command::ViewReport => {
            crate::bot::commands::report::handle_view_report(bot, msg, &handler.reports).await?;
        }
    }

    log_command_success(cmd.name(), &username, user_id, chat_id.0, None);
    Ok(())
}
