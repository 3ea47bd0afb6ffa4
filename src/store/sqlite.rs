//! SQLite-based task store.

use super::{now_string, StoreError, Task, TaskStatus, TaskStore, TaskSummary};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

const SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    manager_id INTEGER NOT NULL,
    manager_username TEXT NOT NULL DEFAULT '',
    content TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'new',
    tech_id INTEGER,
    tech_username TEXT,
    tech_chat_message_id INTEGER,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_manager ON tasks(manager_id, id DESC);
"#;

/// Production store. The connection is opened once and shared; every query
/// runs on the blocking pool.
pub struct SqliteTaskStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTaskStore {
    pub async fn new(db_path: &Path) -> Result<Self, StoreError> {
        let db_path = db_path.to_path_buf();

        let conn = tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&db_path)?;
            conn.execute_batch(SCHEMA)?;
            Ok::<_, rusqlite::Error>(conn)
        })
        .await??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn task_from_row(row: &rusqlite::Row<'_>) -> Result<Task, rusqlite::Error> {
    let status: String = row.get(4)?;
    Ok(Task {
        id: row.get(0)?,
        manager_id: row.get(1)?,
        manager_username: row.get(2)?,
        content: row.get(3)?,
        status: TaskStatus::parse(&status),
        tech_id: row.get(5)?,
        tech_username: row.get(6)?,
        tech_chat_message_id: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    fn is_persistent(&self) -> bool {
        true
    }

    async fn create_task(
        &self,
        manager_id: i64,
        manager_username: &str,
        content: &str,
    ) -> Result<i64, StoreError> {
        let conn = self.conn.clone();
        let manager_username = manager_username.to_string();
        let content = content.to_string();
        let now = now_string();

        let id = tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT INTO tasks (manager_id, manager_username, content, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 'new', ?4, ?5)",
                params![manager_id, manager_username, content, now, now],
            )?;
            Ok::<_, rusqlite::Error>(conn.last_insert_rowid())
        })
        .await??;

        Ok(id)
    }

    async fn set_announcement_message_id(
        &self,
        task_id: i64,
        message_id: i64,
    ) -> Result<(), StoreError> {
        let conn = self.conn.clone();
        let now = now_string();

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "UPDATE tasks SET tech_chat_message_id = ?2, updated_at = ?3 WHERE id = ?1",
                params![task_id, message_id, now],
            )?;
            Ok::<_, rusqlite::Error>(())
        })
        .await??;

        Ok(())
    }

    async fn get_task(&self, task_id: i64) -> Result<Option<Task>, StoreError> {
        let conn = self.conn.clone();

        let task = tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.query_row(
                "SELECT id, manager_id, manager_username, content, status,
                        tech_id, tech_username, tech_chat_message_id, created_at, updated_at
                 FROM tasks WHERE id = ?1",
                params![task_id],
                task_from_row,
            )
            .optional()
        })
        .await??;

        Ok(task)
    }

    async fn claim(
        &self,
        task_id: i64,
        tech_id: i64,
        tech_username: &str,
    ) -> Result<bool, StoreError> {
        let conn = self.conn.clone();
        let tech_username = tech_username.to_string();
        let now = now_string();

        // Conditional update: the status check and the write are one
        // statement, so two racing claims cannot both succeed.
        let rows = tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "UPDATE tasks
                 SET status = 'in_progress', tech_id = ?2, tech_username = ?3, updated_at = ?4
                 WHERE id = ?1 AND status = 'new'",
                params![task_id, tech_id, tech_username, now],
            )
        })
        .await??;

        Ok(rows > 0)
    }

    async fn set_status(
        &self,
        task_id: i64,
        status: TaskStatus,
        tech_id: Option<i64>,
        tech_username: Option<&str>,
    ) -> Result<bool, StoreError> {
        let conn = self.conn.clone();
        let tech_username = tech_username.map(|s| s.to_string());
        let now = now_string();

        // COALESCE keeps an already-attributed technician.
        let rows = tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "UPDATE tasks
                 SET status = ?2,
                     tech_id = COALESCE(tech_id, ?3),
                     tech_username = COALESCE(tech_username, ?4),
                     updated_at = ?5
                 WHERE id = ?1",
                params![task_id, status.as_str(), tech_id, tech_username, now],
            )
        })
        .await??;

        Ok(rows > 0)
    }

    async fn list_by_manager(&self, manager_id: i64) -> Result<Vec<TaskSummary>, StoreError> {
        let conn = self.conn.clone();

        let tasks = tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(
                "SELECT id, content, status, tech_username, created_at
                 FROM tasks WHERE manager_id = ?1 ORDER BY id DESC",
            )?;
            let summaries = stmt
                .query_map(params![manager_id], |row| {
                    let status: String = row.get(2)?;
                    Ok(TaskSummary {
                        id: row.get(0)?,
                        content: row.get(1)?,
                        status: TaskStatus::parse(&status),
                        tech_username: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok::<_, rusqlite::Error>(summaries)
        })
        .await??;

        Ok(tasks)
    }
}
