//! Reqwest-based Bot API client.

use super::types::{ApiResponse, GetMeResult, SendMessageResult, Update};
use super::{ApiError, BotApi};
use async_trait::async_trait;
use std::time::Duration;

const LONG_POLL_TIMEOUT_SECS: u64 = 20;
// Must exceed the long-poll timeout or getUpdates times out client-side.
const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct TelegramClient {
    http: reqwest::Client,
    token: String,
    api_base: String,
}

impl TelegramClient {
    pub fn new(token: String, api_base: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            token,
            api_base,
        }
    }

    fn url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base.trim_end_matches('/'),
            self.token,
            method
        )
    }

    /// Unwrap the `{ok, result, description}` envelope.
    fn into_result<T>(parsed: ApiResponse<T>, method: &str) -> Result<T, ApiError> {
        if parsed.ok {
            Ok(parsed.result)
        } else {
            Err(ApiError::Api(
                parsed
                    .description
                    .unwrap_or_else(|| format!("{} failed", method)),
            ))
        }
    }

    /// Identify the bot account; used at startup to validate the token.
    pub async fn get_me(&self) -> Result<String, ApiError> {
        let parsed = self
            .http
            .get(self.url("getMe"))
            .send()
            .await?
            .json::<ApiResponse<GetMeResult>>()
            .await?;
        let result = Self::into_result(parsed, "getMe")?;
        result
            .username
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Api("bot username is missing".to_string()))
    }

    /// Long-poll for updates newer than `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, ApiError> {
        let url = format!(
            "{}?timeout={}&offset={}",
            self.url("getUpdates"),
            LONG_POLL_TIMEOUT_SECS,
            offset
        );
        let parsed = self
            .http
            .get(url)
            .send()
            .await?
            .json::<ApiResponse<Vec<Update>>>()
            .await?;
        Self::into_result(parsed, "getUpdates")
    }
}

#[async_trait]
impl BotApi for TelegramClient {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<serde_json::Value>,
    ) -> Result<i64, ApiError> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(markup) = reply_markup {
            body["reply_markup"] = markup;
        }

        let parsed = self
            .http
            .post(self.url("sendMessage"))
            .json(&body)
            .send()
            .await?
            .json::<ApiResponse<SendMessageResult>>()
            .await?;
        let result = Self::into_result(parsed, "sendMessage")?;
        Ok(result.message_id)
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        reply_markup: Option<serde_json::Value>,
    ) -> Result<(), ApiError> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
        });
        if let Some(markup) = reply_markup {
            body["reply_markup"] = markup;
        }

        let parsed = self
            .http
            .post(self.url("editMessageText"))
            .json(&body)
            .send()
            .await?
            .json::<ApiResponse<serde_json::Value>>()
            .await?;
        Self::into_result(parsed, "editMessageText").map(|_| ())
    }

    async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), ApiError> {
        let mut body = serde_json::json!({
            "callback_query_id": callback_query_id,
        });
        if let Some(text) = text {
            body["text"] = serde_json::json!(text);
            body["show_alert"] = serde_json::json!(show_alert);
        }

        let parsed = self
            .http
            .post(self.url("answerCallbackQuery"))
            .json(&body)
            .send()
            .await?
            .json::<ApiResponse<serde_json::Value>>()
            .await?;
        Self::into_result(parsed, "answerCallbackQuery").map(|_| ())
    }
}
