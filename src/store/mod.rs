//! Task storage module with pluggable backends.
//!
//! Supports:
//! - `memory`: In-memory storage (non-persistent, for testing)
//! - `sqlite`: SQLite database, the production backend

mod memory;
mod sqlite;

pub use memory::InMemoryTaskStore;
pub use sqlite::SqliteTaskStore;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status of a task.
///
/// A task starts as `New`, moves to `InProgress` when a technician claims
/// it, and ends in exactly one of the three terminal states. It never moves
/// back to `New`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    New,
    InProgress,
    Done,
    OnHold,
    Cancelled,
}

impl TaskStatus {
    /// Stable string form used in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::New => "new",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::OnHold => "on_hold",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Parse from the database string form. Unknown values map to `New`.
    pub fn parse(s: &str) -> Self {
        match s {
            "new" => TaskStatus::New,
            "in_progress" => TaskStatus::InProgress,
            "done" => TaskStatus::Done,
            "on_hold" => TaskStatus::OnHold,
            "cancelled" => TaskStatus::Cancelled,
            _ => TaskStatus::New,
        }
    }

    /// Whether this status ends the task lifecycle.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Done | TaskStatus::OnHold | TaskStatus::Cancelled
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A task submitted by a manager and routed to the technical channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub manager_id: i64,
    pub manager_username: String,
    pub content: String,
    pub status: TaskStatus,
    /// Claiming technician; unset until the task is claimed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_username: Option<String>,
    /// Id of the announcement message in the technical channel, used to
    /// locate it for later edits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_chat_message_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

/// The subset of a task returned by manager listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: i64,
    pub content: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_username: Option<String>,
    pub created_at: String,
}

/// Get current timestamp as RFC3339 string.
pub fn now_string() -> String {
    Utc::now().to_rfc3339()
}

/// Error from storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("blocking task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Task store trait - implemented by all storage backends.
///
/// The store is durable CRUD only; the state machine lives in the workflow
/// handler. The one exception is `claim`, which is a conditional update so
/// that first-claim-wins holds even under concurrent delivery.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Whether this store persists data across restarts.
    fn is_persistent(&self) -> bool;

    /// Insert a new task with status `new`; returns the generated id.
    async fn create_task(
        &self,
        manager_id: i64,
        manager_username: &str,
        content: &str,
    ) -> Result<i64, StoreError>;

    /// Record where the task's announcement was posted.
    async fn set_announcement_message_id(
        &self,
        task_id: i64,
        message_id: i64,
    ) -> Result<(), StoreError>;

    /// Full-row fetch.
    async fn get_task(&self, task_id: i64) -> Result<Option<Task>, StoreError>;

    /// Move the task to `in_progress` and record the technician, but only
    /// if its current status is exactly `new`. Returns whether the claim
    /// took effect.
    async fn claim(
        &self,
        task_id: i64,
        tech_id: i64,
        tech_username: &str,
    ) -> Result<bool, StoreError>;

    /// Update status and the updated-at timestamp. Technician identity is
    /// back-filled only if not already attributed. Returns whether the task
    /// existed.
    async fn set_status(
        &self,
        task_id: i64,
        status: TaskStatus,
        tech_id: Option<i64>,
        tech_username: Option<&str>,
    ) -> Result<bool, StoreError>;

    /// All tasks for a manager, most recently created first.
    async fn list_by_manager(&self, manager_id: i64) -> Result<Vec<TaskSummary>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            TaskStatus::New,
            TaskStatus::InProgress,
            TaskStatus::Done,
            TaskStatus::OnHold,
            TaskStatus::Cancelled,
        ] {
            assert_eq!(TaskStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!TaskStatus::New.is_terminal());
        assert!(!TaskStatus::InProgress.is_terminal());
        assert!(TaskStatus::Done.is_terminal());
        assert!(TaskStatus::OnHold.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
    }

    /// Ids must be strictly increasing so `#<id>` references stay unique.
    #[tokio::test]
    async fn test_create_task_ids_increase() {
        let store = InMemoryTaskStore::new();

        let first = store
            .create_task(10, "alice", "Fix the printer")
            .await
            .expect("create first task");
        let second = store
            .create_task(10, "alice", "Replace the toner")
            .await
            .expect("create second task");

        assert!(second > first, "ids must be strictly increasing");

        let task = store
            .get_task(first)
            .await
            .expect("get task")
            .expect("task exists");
        assert_eq!(task.status, TaskStatus::New);
        assert!(task.tech_id.is_none());
    }

    /// First claim wins; the second attempt must not change anything.
    #[tokio::test]
    async fn test_claim_is_first_click_wins() {
        let store = InMemoryTaskStore::new();
        let id = store
            .create_task(10, "alice", "Fix the printer")
            .await
            .expect("create task");

        assert!(store.claim(id, 77, "bob").await.expect("first claim"));
        assert!(!store.claim(id, 88, "carol").await.expect("second claim"));

        let task = store
            .get_task(id)
            .await
            .expect("get task")
            .expect("task exists");
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.tech_id, Some(77));
        assert_eq!(task.tech_username.as_deref(), Some("bob"));
    }

    /// Technician identity on `set_status` merges only if absent.
    #[tokio::test]
    async fn test_set_status_keeps_existing_technician() {
        let store = InMemoryTaskStore::new();
        let id = store
            .create_task(10, "alice", "Fix the printer")
            .await
            .expect("create task");
        store.claim(id, 77, "bob").await.expect("claim");

        let existed = store
            .set_status(id, TaskStatus::Done, Some(88), Some("carol"))
            .await
            .expect("set status");
        assert!(existed);

        let task = store
            .get_task(id)
            .await
            .expect("get task")
            .expect("task exists");
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.tech_id, Some(77));
        assert_eq!(task.tech_username.as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn test_set_status_backfills_missing_technician() {
        let store = InMemoryTaskStore::new();
        let id = store
            .create_task(10, "alice", "Fix the printer")
            .await
            .expect("create task");

        store
            .set_status(id, TaskStatus::Cancelled, Some(77), Some("bob"))
            .await
            .expect("set status");

        let task = store
            .get_task(id)
            .await
            .expect("get task")
            .expect("task exists");
        assert_eq!(task.tech_id, Some(77));
        assert_eq!(task.tech_username.as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn test_set_status_unknown_task_reports_missing() {
        let store = InMemoryTaskStore::new();
        let existed = store
            .set_status(999, TaskStatus::Done, None, None)
            .await
            .expect("set status");
        assert!(!existed);
    }

    #[tokio::test]
    async fn test_list_by_manager_filters_and_orders() {
        let store = InMemoryTaskStore::new();
        let a = store
            .create_task(10, "alice", "First")
            .await
            .expect("create");
        store
            .create_task(20, "dave", "Other manager")
            .await
            .expect("create");
        let b = store
            .create_task(10, "alice", "Second")
            .await
            .expect("create");

        let tasks = store.list_by_manager(10).await.expect("list");
        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![b, a], "newest first, other managers excluded");
    }
}
