//! Progress events over WebSocket.
//!
//! Each connection gets its own broadcast receiver and only sees the caller's
//! own tasks. Events are advisory: a client that falls behind skips the
//! missed ones and keeps going.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::middleware::CurrentUser;
use crate::models::{AppState, ProgressEvent};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/ws", get(ws_handler))
        .with_state(state)
}

// The caller is checked before the upgrade so anonymous clients get a 401
async fn ws_handler(
    CurrentUser(user_id): CurrentUser,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_events(socket, state, user_id))
}

fn is_for_user(event: &ProgressEvent, user_id: i64) -> bool {
    let owner = match event {
        ProgressEvent::TaskStarted { user_id, .. }
        | ProgressEvent::TaskUpdate { user_id, .. }
        | ProgressEvent::TaskCompleted { user_id, .. } => *user_id,
    };
    owner == user_id
}

async fn stream_events(socket: WebSocket, state: AppState, user_id: i64) {
    info!(user_id, "WebSocket connected");
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.progress.subscribe();

    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!(error = %e, "WebSocket receive error");
                    break;
                }
                Some(Ok(_)) => {}
            },
            event = events.recv() => match event {
                Ok(event) => {
                    if !is_for_user(&event, user_id) {
                        continue;
                    }
                    let Ok(json) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "WebSocket client lagging, dropped progress events");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    info!(user_id, "WebSocket disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::testing::Harness;
    use crate::models::TaskStatus;
    use crate::routes::testing::{call, state};
    use crate::scrapers::fetch::fake::FakeFetcher;
    use axum::http::StatusCode;

    #[test]
    fn test_events_filtered_by_owner() {
        let completed = ProgressEvent::TaskCompleted {
            task_id: 3,
            user_id: 12,
            status: TaskStatus::Failed,
        };
        let update = ProgressEvent::TaskUpdate {
            task_id: 4,
            user_id: 7,
            message: "Searching...".to_string(),
        };
        assert!(is_for_user(&completed, 12));
        assert!(!is_for_user(&completed, 7));
        assert!(is_for_user(&update, 7));
    }

    #[tokio::test]
    async fn test_anonymous_stream_rejected() {
        let harness = Harness::new(FakeFetcher::new());
        let app = router(state(&harness));

        let (status, body) = call(app.clone(), "GET", "/api/ws", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Not logged in");

        // A user id in the query string is not a login
        let (status, _) = call(app, "GET", "/api/ws?user_id=5", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
