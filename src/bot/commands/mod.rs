pub mod report;

use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "snake_case", description = "Teacher Marks Bot commands:")]
pub enum Command {
    #[command(description = "Display this help message")]
    Help,
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Record practical and theoretical marks for a student")]
    AddMarks,
    #[command(description = "Cancel the current data entry")]
    Cancel,
    #[command(description = "Export all recorded marks to a spreadsheet")]
    ViewReport,
}

impl Command {
    /// Name as typed in chat, used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Help => "/help",
            Command::Start => "/start",
            Command::AddMarks => "/add_marks",
            Command::Cancel => "/cancel",
            Command::ViewReport => "/view_report",
        }
    }
}
