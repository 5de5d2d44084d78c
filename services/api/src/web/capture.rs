//! services/api/src/web/capture.rs
//!
//! The capture ingestor: POST /captureTabs turns a submitted batch of tabs
//! into one capture session plus one tab item per valid entry.
//!
//! The batch is best-effort, not all-or-nothing: a per-item failure is
//! recorded against the item's URL and never rolls back the session or the
//! other items. Only session creation itself (or an unresolvable user,
//! handled by the auth middleware) fails the whole request.

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::web::state::AppState;
use tabs_declutter_core::capture::CapturedTab;
use tabs_declutter_core::domain::{CaptureSession, TabItem};
use tabs_declutter_core::ports::{DatabaseService, NewTabItem, PortResult};
use tabs_declutter_core::protocol::{CaptureResponse, ErrorBody, TabCaptureError};

//=========================================================================================
// Batch Validation
//=========================================================================================

/// Pulls the `tabs` array out of a request body. Returns `None` when the
/// field is missing, not an array, or empty - the three `InvalidBatch`
/// shapes.
pub fn batch_from_body(body: &Value) -> Option<&Vec<Value>> {
    match body.get("tabs") {
        Some(Value::Array(tabs)) if !tabs.is_empty() => Some(tabs),
        _ => None,
    }
}

/// How a tab's `url` field is reported in the errors list when it is not a
/// usable string.
fn describe_url_field(tab: &Value) -> String {
    match tab.get("url") {
        Some(value) => value.to_string(),
        None => "(missing)".to_string(),
    }
}

//=========================================================================================
// Ingestion
//=========================================================================================

/// The settled result of one capture batch.
pub struct CaptureOutcome {
    pub session: CaptureSession,
    pub created: Vec<TabItem>,
    pub errors: Vec<TabCaptureError>,
}

/// Creates one capture session and then one tab item per valid input tab.
///
/// Item creations run concurrently once the session exists; the outcome
/// waits for every attempt to settle. There is no transaction spanning the
/// session and its items - a crash in between leaves an empty session, which
/// the best-effort policy accepts.
pub async fn ingest_batch(
    db: &dyn DatabaseService,
    user_id: Uuid,
    tabs: &[Value],
) -> PortResult<CaptureOutcome> {
    // One instant stamps the whole batch: started_at, captured_at, and every
    // item's captured_at are the same moment.
    let now = Utc::now();

    let session = db
        .create_capture_session(user_id, tabs.len() as i32, now)
        .await?;
    let session_id = session.id;

    let attempts = tabs.iter().enumerate().map(|(index, tab)| async move {
        let Some(url) = tab.get("url").and_then(Value::as_str) else {
            return Err(TabCaptureError {
                url: describe_url_field(tab),
                error: "Missing or invalid url".to_string(),
            });
        };

        let captured = CapturedTab::new(
            url,
            tab.get("title").and_then(Value::as_str),
            tab.get("favIconUrl")
                .and_then(Value::as_str)
                .map(str::to_string),
        );

        db.create_tab_item(NewTabItem {
            user_id,
            session_id,
            url: captured.url,
            title: captured.title,
            favicon: captured.favicon,
            captured_at: now,
            position: Some(index as i32),
        })
        .await
        .map_err(|e| TabCaptureError {
            url: url.to_string(),
            error: e.to_string(),
        })
    });

    let mut created = Vec::new();
    let mut errors = Vec::new();
    for outcome in futures::future::join_all(attempts).await {
        match outcome {
            Ok(item) => created.push(item),
            Err(e) => errors.push(e),
        }
    }

    Ok(CaptureOutcome {
        session,
        created,
        errors,
    })
}

//=========================================================================================
// Handler
//=========================================================================================

/// POST /captureTabs - Capture a batch of tabs into a new session
///
/// Accepts tabs from the browser extension and creates one session plus one
/// tab item per entry, reporting per-item failures without aborting the
/// batch.
#[utoipa::path(
    post,
    path = "/captureTabs",
    responses(
        (status = 200, description = "Batch captured; body reports the session id, created items, and any per-item errors"),
        (status = 400, description = "Missing, non-array, or empty 'tabs'"),
        (status = 401, description = "No resolvable user"),
        (status = 500, description = "Session creation failed")
    )
)]
pub async fn capture_tabs_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(body): Json<Value>,
) -> Result<Json<CaptureResponse>, (StatusCode, Json<ErrorBody>)> {
    let Some(tabs) = batch_from_body(&body) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new(
                "Request body must include a non-empty 'tabs' array with { url, title? } objects.",
            )),
        ));
    };

    let outcome = ingest_batch(state.db.as_ref(), user_id, tabs)
        .await
        .map_err(|e| {
            error!("captureTabs failed: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("Failed to capture tabs")),
            )
        })?;

    let response = CaptureResponse {
        success: true,
        session_id: outcome.session.id,
        tabs_captured: outcome.created.len(),
        tabs: outcome.created.into_iter().map(Into::into).collect(),
        errors: (!outcome.errors.is_empty()).then_some(outcome.errors),
    };

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_state, MockDb};
    use serde_json::json;
    use tabs_declutter_core::domain::TabStatus;

    #[tokio::test]
    async fn batch_creates_one_session_with_fixed_tab_count() {
        let db = MockDb::new();
        let user_id = db.seed_user("a@example.com");
        let tabs = vec![
            json!({"url": "https://a.com", "title": "A"}),
            json!({"url": "https://b.com"}),
            json!({"url": "https://c.com", "title": "C"}),
        ];

        let outcome = ingest_batch(&db, user_id, &tabs).await.unwrap();

        assert_eq!(db.session_count(), 1);
        assert_eq!(outcome.session.tab_count, 3);
        assert_eq!(outcome.session.started_at, outcome.session.captured_at);
        assert_eq!(outcome.created.len(), 3);
        assert!(outcome.errors.is_empty());

        // Missing title defaults to the placeholder; every item starts unread.
        let b = outcome
            .created
            .iter()
            .find(|t| t.url == "https://b.com")
            .unwrap();
        assert_eq!(b.title, "Untitled");
        for item in &outcome.created {
            assert_eq!(item.status, TabStatus::Unread);
            assert_eq!(item.session_id, outcome.session.id);
            assert_eq!(item.user_id, user_id);
            assert!(item.processed_at.is_none());
        }
    }

    #[tokio::test]
    async fn item_failure_does_not_abort_the_batch() {
        let db = MockDb::new();
        let user_id = db.seed_user("a@example.com");
        db.fail_url("https://b.com");
        let tabs = vec![
            json!({"url": "https://a.com", "title": "A"}),
            json!({"url": "https://b.com", "title": "B"}),
            json!({"url": "https://c.com", "title": "C"}),
        ];

        let outcome = ingest_batch(&db, user_id, &tabs).await.unwrap();

        // The session still records the full declared batch size.
        assert_eq!(db.session_count(), 1);
        assert_eq!(outcome.session.tab_count, 3);
        assert_eq!(outcome.created.len(), 2);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].url, "https://b.com");
    }

    #[tokio::test]
    async fn invalid_url_is_recorded_not_fatal() {
        let db = MockDb::new();
        let user_id = db.seed_user("a@example.com");
        let tabs = vec![
            json!({"title": "no url"}),
            json!({"url": 42, "title": "numeric url"}),
            json!({"url": "https://ok.com"}),
        ];

        let outcome = ingest_batch(&db, user_id, &tabs).await.unwrap();

        assert_eq!(outcome.created.len(), 1);
        assert_eq!(outcome.errors.len(), 2);
        assert_eq!(outcome.errors[0].url, "(missing)");
        assert_eq!(outcome.errors[1].url, "42");
    }

    #[tokio::test]
    async fn positions_follow_input_order() {
        let db = MockDb::new();
        let user_id = db.seed_user("a@example.com");
        let tabs = vec![
            json!({"url": "https://a.com"}),
            json!({"url": "https://b.com"}),
        ];

        let outcome = ingest_batch(&db, user_id, &tabs).await.unwrap();
        let mut positions: Vec<_> = outcome
            .created
            .iter()
            .map(|t| (t.url.clone(), t.position))
            .collect();
        positions.sort();
        assert_eq!(
            positions,
            vec![
                ("https://a.com".to_string(), Some(0)),
                ("https://b.com".to_string(), Some(1)),
            ]
        );
    }

    #[tokio::test]
    async fn empty_batch_is_rejected_before_any_session_exists() {
        let db = MockDb::new();
        let user_id = db.seed_user("a@example.com");
        let state = test_state(db.clone());

        let result = capture_tabs_handler(
            State(state),
            Extension(user_id),
            Json(json!({"tabs": []})),
        )
        .await;

        let (status, Json(body)) = result.err().unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!body.success);
        assert_eq!(db.session_count(), 0);
    }

    #[tokio::test]
    async fn missing_tabs_field_is_rejected() {
        assert!(batch_from_body(&json!({})).is_none());
        assert!(batch_from_body(&json!({"tabs": "not a list"})).is_none());
        assert!(batch_from_body(&json!({"tabs": []})).is_none());
        assert!(batch_from_body(&json!({"tabs": [{"url": "https://a.com"}]})).is_some());
    }

    #[tokio::test]
    async fn duplicate_urls_are_not_deduplicated() {
        let db = MockDb::new();
        let user_id = db.seed_user("a@example.com");
        let tabs = vec![
            json!({"url": "https://a.com"}),
            json!({"url": "https://a.com"}),
        ];

        let outcome = ingest_batch(&db, user_id, &tabs).await.unwrap();
        assert_eq!(outcome.created.len(), 2);
    }
}
