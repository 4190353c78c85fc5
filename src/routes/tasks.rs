use axum::{
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use crate::middleware::CurrentUser;
use crate::models::{AppState, LimitStatus, RunTaskRequest, RunTaskResponse, Task};
use crate::types::AppResult;

const DEFAULT_HISTORY: i64 = 50;
const MAX_HISTORY: i64 = 500;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/run-task", post(run_task))
        .route("/api/tasks", get(list_tasks))
        .route("/api/check-limits", get(check_limits))
        .with_state(state)
}

pub async fn run_task(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(request): Json<RunTaskRequest>,
) -> AppResult<ResponseJson<RunTaskResponse>> {
    info!(user_id, task = %request.task, "Received task");
    let response = state
        .runner
        .run(user_id, &request.task, request.confirm_submit)
        .await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    limit: Option<i64>,
}

async fn list_tasks(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<HistoryParams>,
) -> AppResult<ResponseJson<Vec<Task>>> {
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY).clamp(1, MAX_HISTORY);
    Ok(Json(state.store.list_tasks(user_id, limit).await?))
}

async fn check_limits(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<ResponseJson<LimitStatus>> {
    Ok(Json(state.runner.check_limits(user_id).await?))
}
