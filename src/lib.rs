//! # techtask
//!
//! Telegram task-routing bot: managers submit free-text tasks with
//! `/connect`, the bot announces them in a shared technical channel with a
//! claim button, a technician claims the task (first click wins) and then
//! resolves it to done / on-hold / cancelled, with the originating manager
//! notified of the outcome.
//!
//! ## Task Flow
//! 1. Manager sends `/connect <text>`
//! 2. Task row is inserted, announcement posted to the technical channel
//! 3. Technician claims via the inline button (`new` → `in_progress`)
//! 4. Technician resolves via the terminal buttons; the announcement is
//!    edited in place and the manager is notified
//!
//! ## Modules
//! - `config`: environment-backed configuration, read once at startup
//! - `store`: task persistence (SQLite in production, in-memory for tests)
//! - `telegram`: Bot API transport and wire types
//! - `workflow`: command/button handling, state machine, message rendering
//! - `bot`: the long-polling event loop

pub mod bot;
pub mod config;
pub mod store;
pub mod telegram;
pub mod workflow;

pub use config::Config;
pub use store::{InMemoryTaskStore, SqliteTaskStore, Task, TaskStatus, TaskStore};
pub use telegram::TelegramClient;
pub use workflow::WorkflowHandler;
