//! Configuration management.
//!
//! Configuration is read from environment variables once at startup and
//! passed into constructors; nothing reads the environment after that.
//!
//! - `BOT_TOKEN` - Required. Telegram bot token.
//! - `TECH_CHAT_ID` - Required. Chat id of the shared technical channel.
//! - `DB_PATH` - Optional. SQLite database path. Defaults to `tasks.db`.
//! - `TELEGRAM_API_BASE_URL` - Optional. Bot API base URL. Defaults to
//!   `https://api.telegram.org`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token
    pub bot_token: String,

    /// Chat id of the technical channel where tasks are announced
    pub tech_chat_id: i64,

    /// SQLite database path
    pub db_path: PathBuf,

    /// Telegram Bot API base URL
    pub api_base_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `BOT_TOKEN` or `TECH_CHAT_ID`
    /// is not set, and `ConfigError::InvalidValue` if `TECH_CHAT_ID` is not
    /// a valid integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = std::env::var("BOT_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("BOT_TOKEN".to_string()))?;

        let tech_chat_id = std::env::var("TECH_CHAT_ID")
            .map_err(|_| ConfigError::MissingEnvVar("TECH_CHAT_ID".to_string()))?
            .parse()
            .map_err(|e| ConfigError::InvalidValue("TECH_CHAT_ID".to_string(), format!("{}", e)))?;

        let db_path = std::env::var("DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("tasks.db"));

        let api_base_url = std::env::var("TELEGRAM_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.telegram.org".to_string());

        Ok(Self {
            bot_token,
            tech_chat_id,
            db_path,
            api_base_url,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(bot_token: String, tech_chat_id: i64, db_path: PathBuf) -> Self {
        Self {
            bot_token,
            tech_chat_id,
            db_path,
            api_base_url: "https://api.telegram.org".to_string(),
        }
    }
}
