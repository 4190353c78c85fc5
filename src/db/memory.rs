use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::TaskStore;
use crate::brain::Ability;
use crate::models::{Task, TaskStatus, UserProfile};
use crate::types::{AppError, AppResult};

#[derive(Default)]
struct Inner {
    tasks: Vec<Task>,
    profiles: HashMap<i64, UserProfile>,
}

/// Process-local store for running without Postgres, and for tests
#[derive(Default)]
pub struct MemoryTaskStore {
    inner: RwLock<Inner>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn create_task(&self, user_id: i64, description: &str, ability: Option<Ability>) -> AppResult<Task> {
        let mut inner = self.inner.write().await;
        let task = Task {
            id: inner.tasks.len() as i64 + 1,
            user_id,
            description: description.to_string(),
            ability,
            status: TaskStatus::Running,
            result: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        inner.tasks.push(task.clone());
        Ok(task)
    }

    async fn finish_task(&self, task_id: i64, status: TaskStatus, result: &str) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let task = inner
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| AppError::NotFound(format!("task {}", task_id)))?;
        task.status = status;
        task.result = Some(result.to_string());
        task.completed_at = Some(Utc::now());
        Ok(())
    }

    async fn list_tasks(&self, user_id: i64, limit: i64) -> AppResult<Vec<Task>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tasks
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count_tasks_since(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
        ability: Option<Ability>,
    ) -> AppResult<i64> {
        let inner = self.inner.read().await;
        Ok(inner
            .tasks
            .iter()
            .filter(|t| t.user_id == user_id && t.created_at >= since)
            .filter(|t| ability.is_none() || t.ability == ability)
            .count() as i64)
    }

    async fn get_profile(&self, user_id: i64) -> AppResult<Option<UserProfile>> {
        Ok(self.inner.read().await.profiles.get(&user_id).cloned())
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> AppResult<()> {
        self.inner
            .write()
            .await
            .profiles
            .insert(profile.user_id, profile.clone());
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
