pub mod general_message;
pub mod message;

use teloxide::{
    dispatching::{HandlerExt, MessageFilterExt, UpdateFilterExt, UpdateHandler},
    prelude::*,
};
use crate::bot::commands::Command;
use crate::dialogue::{DialogueController, Reply};
use crate::services::report::ReportService;
use crate::utils::feedback::CommandFeedback;

pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type HandlerResult = Result<(), HandlerError>;

#[derive(Clone)]
pub struct BotHandler {
    pub dialogue: DialogueController,
    pub reports: ReportService,
}

impl BotHandler {
    pub fn new(dialogue: DialogueController, reports: ReportService) -> Self {
        Self { dialogue, reports }
    }

    /// Commands are matched first; any other text goes to the chat's
    /// data-entry session.
    pub fn schema(&self) -> UpdateHandler<HandlerError> {
        let commands = self.clone();
        let texts = self.clone();

        Update::filter_message()
            .branch(
                dptree::entry()
                    .filter_command::<Command>()
                    .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                        let handler = commands.clone();
                        async move { message::command_handler(bot, msg, cmd, handler).await }
                    }),
            )
            .branch(
                Message::filter_text().endpoint(move |bot: Bot, msg: Message, text: String| {
                    let handler = texts.clone();
                    async move { general_message::text_handler(bot, msg, text, handler).await }
                }),
            )
    }
}

/// Sends a dialogue reply with the emoji and escaping of its feedback kind.
pub async fn send_reply(bot: Bot, chat_id: ChatId, reply: &Reply) -> ResponseResult<Message> {
    CommandFeedback::new(bot, chat_id).send(reply.kind, &reply.text).await
}

/// Username and id of the sender, for log lines.
pub fn sender(msg: &Message) -> (String, i64) {
    let user_id = msg.from().map(|u| u.id.0 as i64).unwrap_or(0);
    let username = msg
        .from()
        .and_then(|u| u.username.clone())
        .unwrap_or_else(|| "unknown".to_string());
    (username, user_id)
}
