//! crates/tabs_declutter_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format,
//! except for the two status enums, which carry their lowercase wire names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Represents a user - used throughout the app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: Option<String>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// A bearer credential handed to the browser extension at signup.
#[derive(Debug, Clone)]
pub struct ApiKey {
    pub key: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle status of a capture session.
///
/// `Active` is the initial state; `Completed` and `Abandoned` are set later
/// by session management, never by the capture flow itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SessionStatus::Active),
            "completed" => Ok(SessionStatus::Completed),
            "abandoned" => Ok(SessionStatus::Abandoned),
            other => Err(format!("'{}' is not a valid session status", other)),
        }
    }
}

/// Triage status of a captured tab.
///
/// Every tab starts as `Unread`. Any status is reachable from any other
/// status; `Delete` is a soft marker, not row removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Unread,
    Keep,
    Read,
    Delete,
}

impl TabStatus {
    /// Whether entering this status stamps `processed_at`. Entering one of
    /// the other statuses clears it.
    pub fn is_processed(&self) -> bool {
        matches!(self, TabStatus::Read | TabStatus::Delete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TabStatus::Unread => "unread",
            TabStatus::Keep => "keep",
            TabStatus::Read => "read",
            TabStatus::Delete => "delete",
        }
    }
}

impl std::str::FromStr for TabStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unread" => Ok(TabStatus::Unread),
            "keep" => Ok(TabStatus::Keep),
            "read" => Ok(TabStatus::Read),
            "delete" => Ok(TabStatus::Delete),
            other => Err(format!("'{}' is not a valid tab status", other)),
        }
    }
}

/// Represents one batch-capture event grouping a set of tab items.
///
/// `tab_count` is fixed at creation time to the size of the originating
/// batch and never changes afterwards.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub captured_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub tab_count: i32,
    pub processed_tabs: i32,
}

/// Represents one captured browser tab and its triage status.
#[derive(Debug, Clone)]
pub struct TabItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub url: String,
    pub title: String,
    pub favicon: Option<String>,
    pub captured_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub status: TabStatus,
    pub position: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn processed_statuses_are_read_and_delete() {
        assert!(TabStatus::Read.is_processed());
        assert!(TabStatus::Delete.is_processed());
        assert!(!TabStatus::Unread.is_processed());
        assert!(!TabStatus::Keep.is_processed());
    }

    #[test]
    fn tab_status_round_trips_through_str() {
        for status in [
            TabStatus::Unread,
            TabStatus::Keep,
            TabStatus::Read,
            TabStatus::Delete,
        ] {
            assert_eq!(TabStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(TabStatus::from_str("archived").is_err());
    }

    #[test]
    fn session_status_round_trips_through_str() {
        for status in [
            SessionStatus::Active,
            SessionStatus::Completed,
            SessionStatus::Abandoned,
        ] {
            assert_eq!(SessionStatus::from_str(status.as_str()).unwrap(), status);
        }
    }
}
