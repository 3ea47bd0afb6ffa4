//! Telegram Bot API transport.
//!
//! The wire protocol is owned by Telegram; this module is a thin reqwest
//! wrapper around the handful of methods the bot uses, plus the `BotApi`
//! trait the workflow handler is written against so tests can substitute a
//! recording fake.

mod client;
mod types;

pub use client::TelegramClient;
pub use types::{ApiResponse, CallbackQuery, Chat, Message, Update, User};

use async_trait::async_trait;
use thiserror::Error;

/// Error from Bot API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("telegram request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("telegram api error: {0}")]
    Api(String),
}

/// Outbound messaging surface used by the workflow handler.
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Send a message; returns the id of the sent message.
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<serde_json::Value>,
    ) -> Result<i64, ApiError>;

    /// Edit a previously sent message in place. `reply_markup: None`
    /// removes any buttons.
    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        reply_markup: Option<serde_json::Value>,
    ) -> Result<(), ApiError>;

    /// Acknowledge a button click, optionally with a notice to the clicking
    /// user (an alert dialog when `show_alert` is set).
    async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), ApiError>;
}

/// One button of an inline keyboard.
#[derive(Clone, Debug)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: &str, callback_data: &str) -> Self {
        Self {
            text: text.to_string(),
            callback_data: callback_data.to_string(),
        }
    }
}

/// Build `reply_markup` JSON for an inline keyboard.
pub fn inline_keyboard(rows: Vec<Vec<InlineButton>>) -> serde_json::Value {
    let inline_keyboard = rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|b| {
                    serde_json::json!({
                        "text": b.text,
                        "callback_data": b.callback_data,
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    serde_json::json!({ "inline_keyboard": inline_keyboard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_keyboard_layout() {
        let markup = inline_keyboard(vec![
            vec![InlineButton::new("Done", "done:1"), InlineButton::new("Hold", "hold:1")],
            vec![InlineButton::new("Cancel", "cancel:1")],
        ]);

        let rows = markup["inline_keyboard"].as_array().expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1]["callback_data"], "hold:1");
        assert_eq!(rows[1][0]["text"], "Cancel");
    }
}
