use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::warn;

use super::TaskStore;
use crate::brain::Ability;
use crate::models::{Subscription, Task, TaskStatus, UserProfile};
use crate::types::{AppError, AppResult};

#[derive(FromRow)]
struct TaskRow {
    id: i64,
    user_id: i64,
    description: String,
    ability: Option<String>,
    status: String,
    result: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<TaskRow> for Task {
    type Error = AppError;

    fn try_from(row: TaskRow) -> AppResult<Self> {
        let status = TaskStatus::parse(&row.status)
            .ok_or_else(|| AppError::Internal(format!("task {} has unknown status '{}'", row.id, row.status)))?;
        let ability = row.ability.as_deref().and_then(|a| match a.parse::<Ability>() {
            Ok(ability) => Some(ability),
            Err(e) => {
                warn!(task_id = row.id, error = %e, "Ignoring unknown ability");
                None
            }
        });

        Ok(Task {
            id: row.id,
            user_id: row.user_id,
            description: row.description,
            ability,
            status,
            result: row.result,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

#[derive(FromRow)]
struct ProfileRow {
    user_id: i64,
    full_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    pincode: Option<String>,
    skills: Option<String>,
    preferred_job_title: Option<String>,
    preferred_location: Option<String>,
    expected_salary: Option<String>,
    subscription: String,
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        UserProfile {
            user_id: row.user_id,
            full_name: row.full_name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            city: row.city,
            state: row.state,
            pincode: row.pincode,
            skills: row.skills,
            preferred_job_title: row.preferred_job_title,
            preferred_location: row.preferred_location,
            expected_salary: row.expected_salary,
            subscription: Subscription::parse(&row.subscription),
        }
    }
}

const TASK_COLUMNS: &str = "id, user_id, description, ability, status, result, created_at, completed_at";

pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn create_task(&self, user_id: i64, description: &str, ability: Option<Ability>) -> AppResult<Task> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            INSERT INTO tasks (user_id, description, ability, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(user_id)
        .bind(description)
        .bind(ability.map(|a| a.id()))
        .bind(TaskStatus::Running.as_str())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn finish_task(&self, task_id: i64, status: TaskStatus, result: &str) -> AppResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE tasks SET status = $2, result = $3, completed_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(task_id)
        .bind(status.as_str())
        .bind(result)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("task {}", task_id)));
        }
        Ok(())
    }

    async fn list_tasks(&self, user_id: i64, limit: i64) -> AppResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2",
            TASK_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    async fn count_tasks_since(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
        ability: Option<Ability>,
    ) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM tasks
            WHERE user_id = $1 AND created_at >= $2 AND ($3::text IS NULL OR ability = $3)
            "#,
        )
        .bind(user_id)
        .bind(since)
        .bind(ability.map(|a| a.id()))
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn get_profile(&self, user_id: i64) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(UserProfile::from))
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, full_name, email, phone, address, city, state, pincode,
                                  skills, preferred_job_title, preferred_location, expected_salary,
                                  subscription, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                full_name = EXCLUDED.full_name,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                address = EXCLUDED.address,
                city = EXCLUDED.city,
                state = EXCLUDED.state,
                pincode = EXCLUDED.pincode,
                skills = EXCLUDED.skills,
                preferred_job_title = EXCLUDED.preferred_job_title,
                preferred_location = EXCLUDED.preferred_location,
                expected_salary = EXCLUDED.expected_salary,
                subscription = EXCLUDED.subscription,
                updated_at = NOW()
            "#,
        )
        .bind(profile.user_id)
        .bind(&profile.full_name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.address)
        .bind(&profile.city)
        .bind(&profile.state)
        .bind(&profile.pincode)
        .bind(&profile.skills)
        .bind(&profile.preferred_job_title)
        .bind(&profile.preferred_location)
        .bind(&profile.expected_salary)
        .bind(profile.subscription.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
