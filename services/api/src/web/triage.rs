//! services/api/src/web/triage.rs
//!
//! The triage store: status transitions on captured tabs, the viewer's read
//! surface, and session lifecycle updates.
//!
//! Transitions are unconditional given ownership - any status is reachable
//! from any other, and concurrent updates resolve last-write-wins.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::web::state::AppState;
use tabs_declutter_core::ports::PortError;
use tabs_declutter_core::protocol::{
    ErrorBody, SessionPayload, SessionStatusRequest, TabItemPayload, TriageRequest,
};

/// Maps a port error onto the HTTP status and standard error body.
fn port_error_response(e: PortError) -> (StatusCode, Json<ErrorBody>) {
    match e {
        PortError::NotFound(message) => (StatusCode::NOT_FOUND, Json(ErrorBody::new(message))),
        PortError::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody::new("Unauthorized")),
        ),
        PortError::Unexpected(message) => {
            error!("Triage store error: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("An unexpected error occurred")),
            )
        }
    }
}

//=========================================================================================
// Tab Triage
//=========================================================================================

/// PUT /tabs/{id}/status - Apply a triage transition to one tab item
///
/// Entering `read` or `delete` stamps `processedAt`; entering `unread` or
/// `keep` clears it. An unknown id, or an id owned by another user, is 404.
#[utoipa::path(
    put,
    path = "/tabs/{id}/status",
    params(("id" = Uuid, Path, description = "Tab item id")),
    responses(
        (status = 200, description = "Updated tab item"),
        (status = 404, description = "Unknown tab item or not owned by the requesting user"),
        (status = 401, description = "No resolvable user")
    )
)]
pub async fn update_tab_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(tab_item_id): Path<Uuid>,
    Json(req): Json<TriageRequest>,
) -> Result<Json<TabItemPayload>, (StatusCode, Json<ErrorBody>)> {
    let item = state
        .db
        .set_tab_status(tab_item_id, user_id, req.status, Utc::now())
        .await
        .map_err(port_error_response)?;

    Ok(Json(TabItemPayload::from(item)))
}

//=========================================================================================
// Viewer Read Surface
//=========================================================================================

/// GET /sessions - The requesting user's capture sessions, newest first
#[utoipa::path(
    get,
    path = "/sessions",
    responses(
        (status = 200, description = "Capture sessions for the requesting user"),
        (status = 401, description = "No resolvable user")
    )
)]
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<Vec<SessionPayload>>, (StatusCode, Json<ErrorBody>)> {
    let sessions = state
        .db
        .list_capture_sessions(user_id)
        .await
        .map_err(port_error_response)?;

    let payload: Vec<SessionPayload> = sessions.into_iter().map(Into::into).collect();
    Ok(Json(payload))
}

/// GET /sessions/{id} - One capture session
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "Capture session id")),
    responses(
        (status = 200, description = "The capture session"),
        (status = 404, description = "Unknown session or not owned by the requesting user")
    )
)]
pub async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionPayload>, (StatusCode, Json<ErrorBody>)> {
    let session = state
        .db
        .get_capture_session(session_id, user_id)
        .await
        .map_err(port_error_response)?;

    Ok(Json(SessionPayload::from(session)))
}

/// GET /sessions/{id}/tabs - A session's tab items in capture order
#[utoipa::path(
    get,
    path = "/sessions/{id}/tabs",
    params(("id" = Uuid, Path, description = "Capture session id")),
    responses(
        (status = 200, description = "Tab items of the session"),
        (status = 404, description = "Unknown session or not owned by the requesting user")
    )
)]
pub async fn list_session_tabs_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Vec<TabItemPayload>>, (StatusCode, Json<ErrorBody>)> {
    // Ownership check first so a foreign session reads as 404, not as an
    // empty list.
    state
        .db
        .get_capture_session(session_id, user_id)
        .await
        .map_err(port_error_response)?;

    let items = state
        .db
        .list_tab_items(session_id, user_id)
        .await
        .map_err(port_error_response)?;

    let payload: Vec<TabItemPayload> = items.into_iter().map(Into::into).collect();
    Ok(Json(payload))
}

//=========================================================================================
// Session Lifecycle
//=========================================================================================

/// PUT /sessions/{id}/status - Update a session's lifecycle status
///
/// Entering `completed` stamps `completedAt`; returning to `active` clears
/// it. The declared tab count never changes.
#[utoipa::path(
    put,
    path = "/sessions/{id}/status",
    params(("id" = Uuid, Path, description = "Capture session id")),
    responses(
        (status = 200, description = "Updated session"),
        (status = 404, description = "Unknown session or not owned by the requesting user")
    )
)]
pub async fn update_session_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<SessionStatusRequest>,
) -> Result<Json<SessionPayload>, (StatusCode, Json<ErrorBody>)> {
    let session = state
        .db
        .update_session_status(session_id, user_id, req.status, Utc::now())
        .await
        .map_err(port_error_response)?;

    Ok(Json(SessionPayload::from(session)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_state, MockDb};
    use tabs_declutter_core::domain::{SessionStatus, TabStatus};

    #[tokio::test]
    async fn delete_then_unread_toggles_processed_at() {
        let db = MockDb::new();
        let user_id = db.seed_user("a@example.com");
        let (_, tab_id) = db.seed_session_with_tab(user_id, "https://a.com");
        let state = test_state(db.clone());

        let Json(updated) = update_tab_status_handler(
            State(state.clone()),
            Extension(user_id),
            Path(tab_id),
            Json(TriageRequest {
                status: TabStatus::Delete,
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.status, TabStatus::Delete);
        assert!(updated.processed_at.is_some());

        let Json(updated) = update_tab_status_handler(
            State(state),
            Extension(user_id),
            Path(tab_id),
            Json(TriageRequest {
                status: TabStatus::Unread,
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.status, TabStatus::Unread);
        assert!(updated.processed_at.is_none());
    }

    #[tokio::test]
    async fn keep_and_read_couple_processed_at() {
        let db = MockDb::new();
        let user_id = db.seed_user("a@example.com");
        let (_, tab_id) = db.seed_session_with_tab(user_id, "https://a.com");
        let state = test_state(db.clone());

        for (status, processed) in [
            (TabStatus::Read, true),
            (TabStatus::Keep, false),
            (TabStatus::Delete, true),
            (TabStatus::Keep, false),
        ] {
            let Json(updated) = update_tab_status_handler(
                State(state.clone()),
                Extension(user_id),
                Path(tab_id),
                Json(TriageRequest { status }),
            )
            .await
            .unwrap();
            assert_eq!(updated.status, status);
            assert_eq!(updated.processed_at.is_some(), processed);
        }
    }

    #[tokio::test]
    async fn foreign_items_read_as_not_found() {
        let db = MockDb::new();
        let owner = db.seed_user("owner@example.com");
        let intruder = db.seed_user("intruder@example.com");
        let (_, tab_id) = db.seed_session_with_tab(owner, "https://a.com");
        let state = test_state(db);

        let result = update_tab_status_handler(
            State(state),
            Extension(intruder),
            Path(tab_id),
            Json(TriageRequest {
                status: TabStatus::Read,
            }),
        )
        .await;

        let (status, _) = result.err().unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_item_reads_as_not_found() {
        let db = MockDb::new();
        let user_id = db.seed_user("a@example.com");
        let state = test_state(db);

        let result = update_tab_status_handler(
            State(state),
            Extension(user_id),
            Path(Uuid::new_v4()),
            Json(TriageRequest {
                status: TabStatus::Read,
            }),
        )
        .await;

        let (status, _) = result.err().unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn completing_a_session_stamps_completed_at() {
        let db = MockDb::new();
        let user_id = db.seed_user("a@example.com");
        let (session_id, tab_id) = db.seed_session_with_tab(user_id, "https://a.com");
        let state = test_state(db);

        // One processed tab, so the recount on completion has something to see.
        update_tab_status_handler(
            State(state.clone()),
            Extension(user_id),
            Path(tab_id),
            Json(TriageRequest {
                status: TabStatus::Read,
            }),
        )
        .await
        .unwrap();

        let Json(updated) = update_session_status_handler(
            State(state.clone()),
            Extension(user_id),
            Path(session_id),
            Json(SessionStatusRequest {
                status: SessionStatus::Completed,
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.status, SessionStatus::Completed);
        assert!(updated.completed_at.is_some());
        assert_eq!(updated.tab_count, 1);
        assert_eq!(updated.processed_tabs, 1);

        let Json(updated) = update_session_status_handler(
            State(state),
            Extension(user_id),
            Path(session_id),
            Json(SessionStatusRequest {
                status: SessionStatus::Active,
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.status, SessionStatus::Active);
        assert!(updated.completed_at.is_none());
    }

    #[tokio::test]
    async fn foreign_session_tabs_read_as_not_found() {
        let db = MockDb::new();
        let owner = db.seed_user("owner@example.com");
        let intruder = db.seed_user("intruder@example.com");
        let (session_id, _) = db.seed_session_with_tab(owner, "https://a.com");
        let state = test_state(db);

        let result = list_session_tabs_handler(
            State(state),
            Extension(intruder),
            Path(session_id),
        )
        .await;

        let (status, _) = result.err().unwrap();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
