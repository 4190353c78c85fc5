//! Task and profile persistence
//!
//! [`TaskStore`] is the seam between the runner and storage. Postgres backs it
//! when `DATABASE_URL` is set; otherwise everything lives in process memory
//! and is lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use tracing::{info, warn};

use crate::brain::Ability;
use crate::config::DatabaseConfig;
use crate::models::{Task, TaskStatus, UserProfile};
use crate::types::AppResult;

pub mod memory;
pub mod operations;

pub use memory::MemoryTaskStore;
pub use operations::PgTaskStore;

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Record a new task in `running` state
    async fn create_task(&self, user_id: i64, description: &str, ability: Option<Ability>) -> AppResult<Task>;

    /// Mark a task finished with its serialized result. Called once per task.
    async fn finish_task(&self, task_id: i64, status: TaskStatus, result: &str) -> AppResult<()>;

    /// Most recent first
    async fn list_tasks(&self, user_id: i64, limit: i64) -> AppResult<Vec<Task>>;

    /// Tasks created at or after `since`, optionally only those routed to `ability`
    async fn count_tasks_since(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
        ability: Option<Ability>,
    ) -> AppResult<i64>;

    async fn get_profile(&self, user_id: i64) -> AppResult<Option<UserProfile>>;

    async fn upsert_profile(&self, profile: &UserProfile) -> AppResult<()>;

    /// Name reported by the health endpoint
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> AppResult<()>;
}

pub async fn create_pool(config: &DatabaseConfig, url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect(url)
        .await?;

    // Test connection
    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    Ok(pool)
}

/// Postgres (with migrations applied) when configured, memory otherwise
pub async fn create_store(config: &DatabaseConfig) -> anyhow::Result<Arc<dyn TaskStore>> {
    let Some(url) = config.url.as_deref() else {
        warn!("DATABASE_URL not set, tasks and profiles are kept in memory");
        return Ok(Arc::new(MemoryTaskStore::new()));
    };

    let pool = create_pool(config, url).await?;

    info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
    info!("Database migrations completed");

    Ok(Arc::new(PgTaskStore::new(pool)))
}
