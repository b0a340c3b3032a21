use anyhow::{anyhow, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:teacher_bot.db";
pub const DEFAULT_REPORT_PATH: &str = "student_report.xlsx";
pub const DEFAULT_HTTP_PORT: u16 = 3000;

/// Process configuration, read once at startup and passed to constructors.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub database_url: String,
    pub report_path: PathBuf,
    pub http_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let token = env::var("BOT_TOKEN")
            .map_err(|_| anyhow!("BOT_TOKEN must be set"))?;

        if token.trim().is_empty() {
            return Err(anyhow!("BOT_TOKEN must be set"));
        }

        let database_url = Self::database_url_from_env();

        let report_path = optional_var("REPORT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_PATH));

        let http_port = match optional_var("HTTP_PORT") {
            Some(port_str) => port_str.trim()
                .parse()
                .map_err(|_| anyhow!("Invalid HTTP_PORT"))?,
            None => DEFAULT_HTTP_PORT,
        };

        Ok(Config {
            bot_token: token,
            database_url,
            report_path,
            http_port,
        })
    }

    /// The database location alone; the migration tool needs no bot token.
    pub fn database_url_from_env() -> String {
        optional_var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
    }
}

/// Unset and blank variables are treated the same.
fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
