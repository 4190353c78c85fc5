use axum::{extract::State, response::Json as ResponseJson, routing::get, Json, Router};
use serde::Serialize;
use tracing::info;

use crate::middleware::CurrentUser;
use crate::models::{AppState, UserProfile};
use crate::types::AppResult;

#[derive(Debug, Serialize)]
pub struct ProfileUpdated {
    pub success: bool,
    pub message: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/profile", get(get_profile).put(update_profile))
        .with_state(state)
}

/// A user without a stored profile gets an empty one
async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<ResponseJson<UserProfile>> {
    let profile = state.store.get_profile(user_id).await?.unwrap_or(UserProfile {
        user_id,
        ..Default::default()
    });
    Ok(Json(profile))
}

/// Replace the caller's profile. The subscription tier is not user-editable.
async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(mut profile): Json<UserProfile>,
) -> AppResult<ResponseJson<ProfileUpdated>> {
    let existing = state.store.get_profile(user_id).await?;
    profile.user_id = user_id;
    profile.subscription = existing.map(|p| p.subscription).unwrap_or_default();

    state.store.upsert_profile(&profile).await?;
    info!(user_id, "Profile updated");

    Ok(Json(ProfileUpdated {
        success: true,
        message: "Profile updated".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::testing::Harness;
    use crate::db::TaskStore;
    use crate::models::Subscription;
    use crate::routes::testing::{call, state};
    use crate::scrapers::fetch::fake::FakeFetcher;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_profile_roundtrip_keeps_subscription() {
        let harness = Harness::new(FakeFetcher::new());
        harness
            .store
            .upsert_profile(&UserProfile {
                user_id: 4,
                subscription: Subscription::Pro,
                ..Default::default()
            })
            .await
            .unwrap();
        let app = router(state(&harness));

        let (status, body) = call(
            app.clone(),
            "PUT",
            "/api/profile",
            Some(4),
            Some(json!({
                "user_id": 99,
                "full_name": "Asha Rao",
                "city": "Pune",
                "skills": "rust, sql",
                "subscription": "free"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Profile updated");

        let (_, body) = call(app, "GET", "/api/profile", Some(4), None).await;
        assert_eq!(body["user_id"], 4);
        assert_eq!(body["full_name"], "Asha Rao");
        assert_eq!(body["subscription"], "pro");
    }

    #[tokio::test]
    async fn test_missing_profile_is_empty() {
        let harness = Harness::new(FakeFetcher::new());
        let (status, body) = call(router(state(&harness)), "GET", "/api/profile", Some(6), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], 6);
        assert!(body["email"].is_null());
    }
}
