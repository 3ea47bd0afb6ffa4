//! Task workflow handler.
//!
//! Interprets inbound commands and button clicks, enforces the task state
//! machine, renders messages, and drives the task store. All failures are
//! handled at the point of occurrence; nothing is retried.
//!
//! ```text
//! new --(claim)--> in_progress --(done/hold/cancel)--> [terminal]
//! ```

mod format;

pub use format::{
    claim_keyboard, claimed_line, format_task_list, format_task_message, resolve_keyboard,
    status_label,
};

use crate::store::{StoreError, Task, TaskStatus, TaskStore};
use crate::telegram::{ApiError, BotApi, CallbackQuery, Message, Update};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

const START_TEXT: &str = "Hi! I am the tech task bot.\n\
    Managers: /connect <task text>\n\
    /mytasks — list your tasks";

const HELP_TEXT: &str = "/connect <text> — create a task\n\
    /mytasks — list your tasks\n\
    /start — greeting\n\
    /help — this message";

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A terminal outcome a technician can pick for a claimed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Done,
    Hold,
    Cancel,
}

impl Resolution {
    fn status(self) -> TaskStatus {
        match self {
            Resolution::Done => TaskStatus::Done,
            Resolution::Hold => TaskStatus::OnHold,
            Resolution::Cancel => TaskStatus::Cancelled,
        }
    }

    fn status_line(self, tech_username: &str) -> String {
        match self {
            Resolution::Done => format!("🟢 Done by @{}", tech_username),
            Resolution::Hold => format!("🟡 On hold by @{}", tech_username),
            Resolution::Cancel => format!("🔴 Cancelled by @{}", tech_username),
        }
    }
}

/// Action encoded in a button's callback data as `<action>:<task id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallbackAction {
    Take(i64),
    Resolve(Resolution, i64),
}

fn parse_callback_data(raw: &str) -> Option<CallbackAction> {
    let (action, id) = raw.trim().split_once(':')?;
    let id = id.parse::<i64>().ok()?;
    match action {
        "take" => Some(CallbackAction::Take(id)),
        "done" => Some(CallbackAction::Resolve(Resolution::Done, id)),
        "hold" => Some(CallbackAction::Resolve(Resolution::Hold, id)),
        "cancel" => Some(CallbackAction::Resolve(Resolution::Cancel, id)),
        _ => None,
    }
}

/// Split a command message into its token and argument remainder. The token
/// may carry a `@BotName` suffix in group chats; it is stripped before
/// dispatch.
fn parse_command(text: &str) -> Option<(&str, &str)> {
    if !text.starts_with('/') {
        return None;
    }
    let (token, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    let token = token.split('@').next().unwrap_or(token);
    Some((token, rest))
}

fn non_empty_or(name: String, fallback: &str) -> String {
    if name.is_empty() {
        fallback.to_string()
    } else {
        name
    }
}

/// Drives one inbound event at a time: command or button click in, store
/// mutation plus outbound messages out. Holds no state between events.
pub struct WorkflowHandler {
    store: Arc<dyn TaskStore>,
    api: Arc<dyn BotApi>,
    tech_chat_id: i64,
}

impl WorkflowHandler {
    pub fn new(store: Arc<dyn TaskStore>, api: Arc<dyn BotApi>, tech_chat_id: i64) -> Self {
        Self {
            store,
            api,
            tech_chat_id,
        }
    }

    pub async fn handle_update(&self, update: Update) -> Result<(), WorkflowError> {
        if let Some(cb) = update.callback_query {
            return self.handle_callback(cb).await;
        }
        if let Some(msg) = update.message {
            return self.handle_message(msg).await;
        }
        Ok(())
    }

    async fn handle_message(&self, msg: Message) -> Result<(), WorkflowError> {
        let Some(text) = msg.text.clone() else {
            return Ok(());
        };
        let Some((command, args)) = parse_command(text.trim()) else {
            return Ok(());
        };

        match command {
            "/connect" => self.cmd_connect(&msg, args).await,
            "/mytasks" => self.cmd_mytasks(&msg).await,
            "/start" => {
                self.api.send_message(msg.chat.id, START_TEXT, None).await?;
                Ok(())
            }
            "/help" => {
                self.api.send_message(msg.chat.id, HELP_TEXT, None).await?;
                Ok(())
            }
            _ => {
                self.api
                    .send_message(msg.chat.id, "Unknown command. Use /help.", None)
                    .await?;
                Ok(())
            }
        }
    }

    /// `/connect <text>`: create a task and announce it in the technical
    /// channel with a claim button.
    async fn cmd_connect(&self, msg: &Message, args: &str) -> Result<(), WorkflowError> {
        let content = args.trim();
        if content.is_empty() {
            self.api
                .send_message(
                    msg.chat.id,
                    "Please provide the task text after /connect.",
                    None,
                )
                .await?;
            return Ok(());
        }

        let Some(manager) = msg.from.as_ref() else {
            return Ok(());
        };
        let manager_username = non_empty_or(manager.display_name(), "manager");

        let task_id = self
            .store
            .create_task(manager.id, &manager_username, content)
            .await?;
        info!(task_id, manager = %manager_username, "task created");

        let text = format_task_message(task_id, &manager_username, content, None);
        match self
            .api
            .send_message(self.tech_chat_id, &text, Some(claim_keyboard(task_id)))
            .await
        {
            Ok(message_id) => {
                self.store
                    .set_announcement_message_id(task_id, message_id)
                    .await?;
                self.api
                    .send_message(
                        msg.chat.id,
                        &format!("✅ Task #{} sent to the technical team.", task_id),
                        None,
                    )
                    .await?;
            }
            Err(err) => {
                // The task row is kept even though it was never announced.
                error!(task_id, error = %err, "failed to announce task in the technical channel");
                self.api
                    .send_message(
                        msg.chat.id,
                        "Error: could not deliver the task to the technical channel. \
                         Check that the bot is in the channel and allowed to post.",
                        None,
                    )
                    .await?;
            }
        }
        Ok(())
    }

    /// `/mytasks`: the caller's tasks, newest first.
    async fn cmd_mytasks(&self, msg: &Message) -> Result<(), WorkflowError> {
        let Some(manager) = msg.from.as_ref() else {
            return Ok(());
        };
        let tasks = self.store.list_by_manager(manager.id).await?;
        if tasks.is_empty() {
            self.api
                .send_message(msg.chat.id, "You have no tasks yet.", None)
                .await?;
            return Ok(());
        }
        self.api
            .send_message(msg.chat.id, &format_task_list(&tasks), None)
            .await?;
        Ok(())
    }

    async fn handle_callback(&self, cb: CallbackQuery) -> Result<(), WorkflowError> {
        let data = cb.data.as_deref().unwrap_or_default();
        let Some(action) = parse_callback_data(data) else {
            self.api
                .answer_callback_query(&cb.id, Some("Invalid action data."), true)
                .await?;
            return Ok(());
        };

        match action {
            CallbackAction::Take(task_id) => self.handle_claim(&cb, task_id).await,
            CallbackAction::Resolve(resolution, task_id) => {
                self.handle_resolve(&cb, resolution, task_id).await
            }
        }
    }

    /// Claim is only valid from `new`; the store performs the conditional
    /// update, so first click wins.
    async fn handle_claim(&self, cb: &CallbackQuery, task_id: i64) -> Result<(), WorkflowError> {
        let Some(task) = self.store.get_task(task_id).await? else {
            self.api
                .answer_callback_query(&cb.id, Some("Task not found."), true)
                .await?;
            return Ok(());
        };

        let tech_username = non_empty_or(cb.from.display_name(), "tech");
        if !self.store.claim(task_id, cb.from.id, &tech_username).await? {
            self.api
                .answer_callback_query(&cb.id, Some("This task is already taken or closed."), true)
                .await?;
            return Ok(());
        }
        info!(task_id, tech = %tech_username, "task claimed");

        let text = format_task_message(
            task_id,
            &task.manager_username,
            &task.content,
            Some(&claimed_line(&tech_username)),
        );
        self.edit_announcement(&task, cb.message.as_ref(), &text, Some(resolve_keyboard(task_id)))
            .await;

        self.api
            .answer_callback_query(&cb.id, Some("Task claimed ✅"), false)
            .await?;
        Ok(())
    }

    /// Resolution is gated on `in_progress`: unclaimed and already-closed
    /// tasks reject the click with a notice and no mutation.
    async fn handle_resolve(
        &self,
        cb: &CallbackQuery,
        resolution: Resolution,
        task_id: i64,
    ) -> Result<(), WorkflowError> {
        let Some(task) = self.store.get_task(task_id).await? else {
            self.api
                .answer_callback_query(&cb.id, Some("Task not found."), true)
                .await?;
            return Ok(());
        };

        if task.status != TaskStatus::InProgress {
            self.api
                .answer_callback_query(&cb.id, Some("Only tasks in progress can be resolved."), true)
                .await?;
            return Ok(());
        }

        let tech_username = non_empty_or(cb.from.display_name(), "tech");
        let status_line = resolution.status_line(&tech_username);
        self.store
            .set_status(
                task_id,
                resolution.status(),
                Some(cb.from.id),
                Some(&tech_username),
            )
            .await?;
        info!(task_id, status = %resolution.status(), tech = %tech_username, "task resolved");

        let text = format_task_message(
            task_id,
            &task.manager_username,
            &task.content,
            Some(&status_line),
        );
        self.edit_announcement(&task, cb.message.as_ref(), &text, None)
            .await;

        if task.manager_id != 0 {
            if let Err(err) = self
                .api
                .send_message(
                    task.manager_id,
                    &format!("🔔 Task #{} updated: {}", task_id, status_line),
                    None,
                )
                .await
            {
                warn!(task_id, error = %err, "failed to notify the manager");
            }
        }

        self.api
            .answer_callback_query(&cb.id, Some("Status updated."), false)
            .await?;
        Ok(())
    }

    /// Edit the announcement in the technical channel: first via the stored
    /// message id, falling back to the message the callback arrived on.
    async fn edit_announcement(
        &self,
        task: &Task,
        source: Option<&Message>,
        text: &str,
        reply_markup: Option<serde_json::Value>,
    ) {
        if let Some(message_id) = task.tech_chat_message_id {
            match self
                .api
                .edit_message_text(self.tech_chat_id, message_id, text, reply_markup.clone())
                .await
            {
                Ok(()) => return,
                Err(err) => {
                    warn!(task_id = task.id, error = %err, "failed to edit stored announcement, trying callback message");
                }
            }
        }

        let Some(source) = source else {
            error!(task_id = task.id, "no reachable announcement message to edit");
            return;
        };
        if let Err(err) = self
            .api
            .edit_message_text(source.chat.id, source.message_id, text, reply_markup)
            .await
        {
            error!(task_id = task.id, error = %err, "failed to edit announcement");
        }
    }
}
