//! crates/tabs_declutter_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    ApiKey, CaptureSession, SessionStatus, TabItem, TabStatus, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Everything the API service needs from the persistence layer.
///
/// All triage operations are ownership-scoped: a tab item that exists but
/// belongs to another user is reported as `NotFound`, never leaked.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;

    /// Development fallback: the first user record in the system, if any.
    async fn first_user(&self) -> PortResult<Option<User>>;

    // --- Auth Sessions (browser cookie) ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- API Keys (extension bearer credential) ---
    async fn create_api_key(&self, user_id: Uuid) -> PortResult<ApiKey>;

    async fn find_user_by_api_key(&self, key: &str) -> PortResult<Option<Uuid>>;

    // --- Capture Sessions ---
    async fn create_capture_session(
        &self,
        user_id: Uuid,
        tab_count: i32,
        captured_at: DateTime<Utc>,
    ) -> PortResult<CaptureSession>;

    async fn get_capture_session(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> PortResult<CaptureSession>;

    async fn list_capture_sessions(&self, user_id: Uuid) -> PortResult<Vec<CaptureSession>>;

    /// Updates a session's lifecycle status. Entering `Completed` stamps
    /// `completed_at`; returning to `Active` clears it. `tab_count` is
    /// never touched.
    async fn update_session_status(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        status: SessionStatus,
        now: DateTime<Utc>,
    ) -> PortResult<CaptureSession>;

    // --- Tab Items ---
    async fn create_tab_item(&self, item: NewTabItem) -> PortResult<TabItem>;

    async fn list_tab_items(&self, session_id: Uuid, user_id: Uuid) -> PortResult<Vec<TabItem>>;

    /// Applies a triage transition. Entering `Read` or `Delete` stamps
    /// `processed_at = now`; entering `Unread` or `Keep` clears it.
    /// Last write wins; there is no optimistic-concurrency check.
    async fn set_tab_status(
        &self,
        tab_item_id: Uuid,
        user_id: Uuid,
        status: TabStatus,
        now: DateTime<Utc>,
    ) -> PortResult<TabItem>;
}

/// The fields the ingestor supplies when creating one tab item.
#[derive(Debug, Clone)]
pub struct NewTabItem {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub url: String,
    pub title: String,
    pub favicon: Option<String>,
    pub captured_at: DateTime<Utc>,
    pub position: Option<i32>,
}
