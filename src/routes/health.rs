use axum::{extract::State, response::Json as ResponseJson, routing::get, Json, Router};
use tracing::warn;

use crate::models::{AppState, HealthResponse};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> ResponseJson<HealthResponse> {
    let backend = state.store.backend();
    let (status, database) = match state.store.ping().await {
        Ok(()) => ("ok", format!("{}: connected", backend)),
        Err(e) => {
            warn!(backend, error = %e, "Health check could not reach the task store");
            ("degraded", format!("{}: unavailable", backend))
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        database,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::testing::Harness;
    use crate::routes::testing::{call, state};
    use crate::scrapers::fetch::fake::FakeFetcher;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health_reports_memory_backend() {
        let harness = Harness::new(FakeFetcher::new());
        let (status, body) = call(router(state(&harness)), "GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "memory: connected");
    }
}
