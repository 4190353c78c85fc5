//! Caller identity.
//!
//! Session handling lives in front of this service; whatever terminates the
//! session forwards the numeric user id in the `x-user-id` header.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::types::AppError;

pub const USER_HEADER: &str = "x-user-id";

/// The authenticated caller. Handlers that take this reject anonymous requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub i64);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}
