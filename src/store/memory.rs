//! In-memory task store (non-persistent).

use super::{now_string, StoreError, Task, TaskStatus, TaskStore, TaskSummary};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryTaskStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    tasks: BTreeMap<i64, Task>,
    next_id: i64,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    fn is_persistent(&self) -> bool {
        false
    }

    async fn create_task(
        &self,
        manager_id: i64,
        manager_username: &str,
        content: &str,
    ) -> Result<i64, StoreError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = inner.next_id;
        let now = now_string();
        inner.tasks.insert(
            id,
            Task {
                id,
                manager_id,
                manager_username: manager_username.to_string(),
                content: content.to_string(),
                status: TaskStatus::New,
                tech_id: None,
                tech_username: None,
                tech_chat_message_id: None,
                created_at: now.clone(),
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn set_announcement_message_id(
        &self,
        task_id: i64,
        message_id: i64,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(task) = inner.tasks.get_mut(&task_id) {
            task.tech_chat_message_id = Some(message_id);
            task.updated_at = now_string();
        }
        Ok(())
    }

    async fn get_task(&self, task_id: i64) -> Result<Option<Task>, StoreError> {
        Ok(self.inner.read().await.tasks.get(&task_id).cloned())
    }

    async fn claim(
        &self,
        task_id: i64,
        tech_id: i64,
        tech_username: &str,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(task) = inner.tasks.get_mut(&task_id) else {
            return Ok(false);
        };
        if task.status != TaskStatus::New {
            return Ok(false);
        }
        task.status = TaskStatus::InProgress;
        task.tech_id = Some(tech_id);
        task.tech_username = Some(tech_username.to_string());
        task.updated_at = now_string();
        Ok(true)
    }

    async fn set_status(
        &self,
        task_id: i64,
        status: TaskStatus,
        tech_id: Option<i64>,
        tech_username: Option<&str>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(task) = inner.tasks.get_mut(&task_id) else {
            return Ok(false);
        };
        task.status = status;
        if task.tech_id.is_none() {
            task.tech_id = tech_id;
        }
        if task.tech_username.is_none() {
            task.tech_username = tech_username.map(|s| s.to_string());
        }
        task.updated_at = now_string();
        Ok(true)
    }

    async fn list_by_manager(&self, manager_id: i64) -> Result<Vec<TaskSummary>, StoreError> {
        let inner = self.inner.read().await;
        let mut tasks: Vec<TaskSummary> = inner
            .tasks
            .values()
            .filter(|t| t.manager_id == manager_id)
            .map(|t| TaskSummary {
                id: t.id,
                content: t.content.clone(),
                status: t.status,
                tech_username: t.tech_username.clone(),
                created_at: t.created_at.clone(),
            })
            .collect();
        tasks.sort_by_key(|t| std::cmp::Reverse(t.id));
        Ok(tasks)
    }
}
