use axum::{response::Json as ResponseJson, routing::get, Json, Router};

use crate::brain::Ability;
use crate::models::AbilityInfo;

pub fn router() -> Router {
    Router::new().route("/api/abilities", get(list_abilities))
}

async fn list_abilities() -> ResponseJson<Vec<AbilityInfo>> {
    Json(Ability::ALL.iter().copied().map(AbilityInfo::from).collect())
}
