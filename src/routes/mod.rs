//! API Routes
//!
//! This module organizes all HTTP endpoints for the application:
//! - `/api/run-task`, `/api/tasks`, `/api/check-limits` - Task submission and history
//! - `/api/profile` - The caller's profile
//! - `/api/abilities` - Ability catalog
//! - `/api/health` - Health checks
//! - `/api/ws` - Progress events over WebSocket
//!
//! Everything except health, the catalog and the event stream requires the
//! `x-user-id` header.

pub mod abilities;
pub mod health;
pub mod profile;
pub mod tasks;
pub mod ws;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::cors_layer;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let cors = cors_layer(&state.config.server);
    Router::new()
        .merge(tasks::router(state.clone()))
        .merge(profile::router(state.clone()))
        .merge(ws::router(state.clone()))
        .merge(health::router(state))
        .merge(abilities::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
pub(crate) mod testing {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use std::sync::Arc;
    use tokio::sync::broadcast;
    use tower::ServiceExt;

    use crate::abilities::testing::Harness;
    use crate::middleware::USER_HEADER;
    use crate::models::AppState;
    use crate::runner::TaskRunner;

    pub fn state(harness: &Harness) -> AppState {
        let (progress, _) = broadcast::channel(64);
        AppState {
            config: harness.services.config.clone(),
            store: harness.services.store.clone(),
            runner: Arc::new(TaskRunner::new(harness.services.clone(), progress.clone())),
            progress,
        }
    }

    /// Send one request and decode the JSON body
    pub async fn call(
        app: Router,
        method: &str,
        uri: &str,
        user: Option<i64>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_HEADER, user.to_string());
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}
