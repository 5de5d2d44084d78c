//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::web::identity::{resolve_user, Credentials};
use crate::web::state::AppState;
use tabs_declutter_core::protocol::ErrorBody;

/// Middleware that resolves the acting user from the request credentials and
/// extracts the user_id.
///
/// If a user resolves, inserts the user_id into request extensions for
/// handlers to use. If none resolves, returns 401 Unauthorized with the
/// standard error body.
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorBody>)> {
    let credentials = Credentials::from_headers(req.headers());

    let user_id = resolve_user(&state, &credentials).await.ok_or((
        StatusCode::UNAUTHORIZED,
        Json(ErrorBody::new(
            "No user found. Please sign in or configure an API key.",
        )),
    ))?;

    req.extensions_mut().insert(user_id);

    Ok(next.run(req).await)
}
