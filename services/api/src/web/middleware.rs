//! services/api/src/web/middleware.rs
//!
//! Identity middleware for protecting routes.

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use tracing::warn;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The already-authenticated user identity, as resolved by the hosted auth service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserIdentity(pub String);

/// Middleware that reads the resolved identity from the `x-user-id` header.
///
/// If present, inserts a [`UserIdentity`] into request extensions for handlers to use.
/// If missing or blank, returns 401 Unauthorized.
pub async fn require_user(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            warn!("Rejected request without {} header", USER_ID_HEADER);
            StatusCode::UNAUTHORIZED
        })?;

    req.extensions_mut().insert(UserIdentity(user_id));
    Ok(next.run(req).await)
}
