//! crates/tabs_declutter_core/src/protocol.rs
//!
//! Defines the HTTP wire contract between the collector (browser side) and
//! the API service: the capture submission body, the capture result, and the
//! triage update shapes. Both sides depend on this module so the contract
//! cannot drift.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{CaptureSession, SessionStatus, TabItem, TabStatus};

//=========================================================================================
// Capture Submission (Collector -> Ingestor)
//=========================================================================================

/// One tab as submitted by the collector. `title` and `favIconUrl` are
/// optional on the wire; the ingestor applies the title placeholder itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingTab {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "favIconUrl", skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
}

/// POST /captureTabs request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureRequest {
    pub tabs: Vec<IncomingTab>,
}

/// A per-item creation failure, keyed by the URL that failed. Collected and
/// reported, never fatal to the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabCaptureError {
    pub url: String,
    pub error: String,
}

/// POST /captureTabs success response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResponse {
    pub success: bool,
    pub session_id: Uuid,
    pub tabs_captured: usize,
    pub tabs: Vec<TabItemPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<TabCaptureError>>,
}

/// The body every failed request carries: `{ "success": false, "error": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

//=========================================================================================
// Triage and Session Management (Viewer -> Store)
//=========================================================================================

/// PUT /tabs/{id}/status request body.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TriageRequest {
    pub status: TabStatus,
}

/// PUT /sessions/{id}/status request body.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SessionStatusRequest {
    pub status: SessionStatus,
}

//=========================================================================================
// JSON Projections of the Domain Records
//=========================================================================================

/// A tab item as it appears in HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabItemPayload {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    pub captured_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub status: TabStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
}

impl From<TabItem> for TabItemPayload {
    fn from(item: TabItem) -> Self {
        Self {
            id: item.id,
            user_id: item.user_id,
            session_id: item.session_id,
            url: item.url,
            title: item.title,
            favicon: item.favicon,
            captured_at: item.captured_at,
            processed_at: item.processed_at,
            status: item.status,
            position: item.position,
        }
    }
}

/// A capture session as it appears in HTTP responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub id: Uuid,
    pub user_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub captured_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub tab_count: i32,
    pub processed_tabs: i32,
}

impl From<CaptureSession> for SessionPayload {
    fn from(session: CaptureSession) -> Self {
        Self {
            id: session.id,
            user_id: session.user_id,
            started_at: session.started_at,
            captured_at: session.captured_at,
            completed_at: session.completed_at,
            status: session.status,
            tab_count: session.tab_count,
            processed_tabs: session.processed_tabs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_request_accepts_optional_title() {
        let body = r#"{"tabs":[{"url":"https://a.com","title":"A"},{"url":"https://b.com"}]}"#;
        let req: CaptureRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.tabs.len(), 2);
        assert_eq!(req.tabs[0].title.as_deref(), Some("A"));
        assert!(req.tabs[1].title.is_none());
    }

    #[test]
    fn statuses_serialize_lowercase() {
        let req = TriageRequest {
            status: TabStatus::Delete,
        };
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"status":"delete"}"#
        );

        let req = SessionStatusRequest {
            status: SessionStatus::Abandoned,
        };
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"status":"abandoned"}"#
        );
    }

    #[test]
    fn error_list_is_omitted_when_absent() {
        let response = CaptureResponse {
            success: true,
            session_id: Uuid::new_v4(),
            tabs_captured: 0,
            tabs: vec![],
            errors: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("errors"));
    }
}
