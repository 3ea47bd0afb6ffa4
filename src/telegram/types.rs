//! Telegram Bot API wire types (the subset this bot consumes).

use serde::Deserialize;

/// Envelope every Bot API method returns.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(default)]
    pub result: T,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
}

impl User {
    /// Display name: username, falling back to the first name. May be empty
    /// for accounts that expose neither.
    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.first_name.clone())
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SendMessageResult {
    #[serde(default)]
    pub message_id: i64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GetMeResult {
    #[serde(default)]
    pub username: Option<String>,
}
