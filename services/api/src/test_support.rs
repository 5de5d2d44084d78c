//! services/api/src/test_support.rs
//!
//! An in-memory `DatabaseService` double for handler tests, with per-URL
//! failure injection to exercise the partial-failure policy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::config::Config;
use crate::web::state::AppState;
use tabs_declutter_core::domain::{
    ApiKey, CaptureSession, SessionStatus, TabItem, TabStatus, User, UserCredentials,
};
use tabs_declutter_core::ports::{DatabaseService, NewTabItem, PortError, PortResult};

#[derive(Default)]
struct MockDbInner {
    users: Mutex<Vec<User>>,
    credentials: Mutex<HashMap<String, UserCredentials>>,
    auth_sessions: Mutex<HashMap<String, (Uuid, DateTime<Utc>)>>,
    api_keys: Mutex<HashMap<String, Uuid>>,
    sessions: Mutex<HashMap<Uuid, CaptureSession>>,
    tabs: Mutex<HashMap<Uuid, TabItem>>,
    fail_urls: Mutex<HashSet<String>>,
}

/// In-memory stand-in for the database adapter.
#[derive(Clone, Default)]
pub struct MockDb {
    inner: Arc<MockDbInner>,
}

impl MockDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `create_tab_item` fail for this URL, as a unique-constraint
    /// violation would.
    pub fn fail_url(&self, url: &str) {
        self.inner.fail_urls.lock().unwrap().insert(url.to_string());
    }

    pub fn session_count(&self) -> usize {
        self.inner.sessions.lock().unwrap().len()
    }

    pub fn seed_user(&self, email: &str) -> Uuid {
        let user_id = Uuid::new_v4();
        self.inner.users.lock().unwrap().push(User {
            user_id,
            email: Some(email.to_string()),
        });
        user_id
    }

    pub fn seed_auth_session(&self, session_id: &str, user_id: Uuid) {
        self.inner
            .auth_sessions
            .lock()
            .unwrap()
            .insert(session_id.to_string(), (user_id, Utc::now() + chrono::Duration::days(1)));
    }

    pub fn seed_api_key(&self, key: &str, user_id: Uuid) {
        self.inner
            .api_keys
            .lock()
            .unwrap()
            .insert(key.to_string(), user_id);
    }

    /// Seeds one active session holding one unread tab; returns their ids.
    pub fn seed_session_with_tab(&self, user_id: Uuid, url: &str) -> (Uuid, Uuid) {
        let now = Utc::now();
        let session_id = Uuid::new_v4();
        self.inner.sessions.lock().unwrap().insert(
            session_id,
            CaptureSession {
                id: session_id,
                user_id,
                started_at: now,
                captured_at: now,
                completed_at: None,
                status: SessionStatus::Active,
                tab_count: 1,
                processed_tabs: 0,
            },
        );

        let tab_id = Uuid::new_v4();
        self.inner.tabs.lock().unwrap().insert(
            tab_id,
            TabItem {
                id: tab_id,
                user_id,
                session_id,
                url: url.to_string(),
                title: "Untitled".to_string(),
                favicon: None,
                captured_at: now,
                processed_at: None,
                status: TabStatus::Unread,
                position: Some(0),
            },
        );

        (session_id, tab_id)
    }
}

#[async_trait]
impl DatabaseService for MockDb {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let user_id = self.seed_user(email);
        self.inner.credentials.lock().unwrap().insert(
            email.to_string(),
            UserCredentials {
                user_id,
                email: email.to_string(),
                hashed_password: hashed_password.to_string(),
            },
        );
        Ok(User {
            user_id,
            email: Some(email.to_string()),
        })
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.inner
            .credentials
            .lock()
            .unwrap()
            .get(email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        self.inner
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.user_id == user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }

    async fn first_user(&self) -> PortResult<Option<User>> {
        Ok(self.inner.users.lock().unwrap().first().cloned())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.inner
            .auth_sessions
            .lock()
            .unwrap()
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        match self.inner.auth_sessions.lock().unwrap().get(session_id) {
            Some((user_id, expires_at)) if *expires_at > Utc::now() => Ok(*user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.inner.auth_sessions.lock().unwrap().remove(session_id);
        Ok(())
    }

    async fn create_api_key(&self, user_id: Uuid) -> PortResult<ApiKey> {
        let key = format!("tdk_{}", Uuid::new_v4().simple());
        self.seed_api_key(&key, user_id);
        Ok(ApiKey {
            key,
            user_id,
            created_at: Utc::now(),
        })
    }

    async fn find_user_by_api_key(&self, key: &str) -> PortResult<Option<Uuid>> {
        Ok(self.inner.api_keys.lock().unwrap().get(key).copied())
    }

    async fn create_capture_session(
        &self,
        user_id: Uuid,
        tab_count: i32,
        captured_at: DateTime<Utc>,
    ) -> PortResult<CaptureSession> {
        let session = CaptureSession {
            id: Uuid::new_v4(),
            user_id,
            started_at: captured_at,
            captured_at,
            completed_at: None,
            status: SessionStatus::Active,
            tab_count,
            processed_tabs: 0,
        };
        self.inner
            .sessions
            .lock()
            .unwrap()
            .insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_capture_session(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> PortResult<CaptureSession> {
        self.inner
            .sessions
            .lock()
            .unwrap()
            .get(&session_id)
            .filter(|s| s.user_id == user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))
    }

    async fn list_capture_sessions(&self, user_id: Uuid) -> PortResult<Vec<CaptureSession>> {
        let mut sessions: Vec<_> = self
            .inner
            .sessions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.captured_at.cmp(&a.captured_at));
        Ok(sessions)
    }

    async fn update_session_status(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        status: SessionStatus,
        now: DateTime<Utc>,
    ) -> PortResult<CaptureSession> {
        let processed_tabs = self
            .inner
            .tabs
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.session_id == session_id && t.processed_at.is_some())
            .count() as i32;

        let mut sessions = self.inner.sessions.lock().unwrap();
        let session = sessions
            .get_mut(&session_id)
            .filter(|s| s.user_id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))?;

        session.status = status;
        session.completed_at = matches!(status, SessionStatus::Completed).then_some(now);
        session.processed_tabs = processed_tabs;
        Ok(session.clone())
    }

    async fn create_tab_item(&self, item: NewTabItem) -> PortResult<TabItem> {
        if self.inner.fail_urls.lock().unwrap().contains(&item.url) {
            return Err(PortError::Unexpected(format!(
                "duplicate key value violates unique constraint: {}",
                item.url
            )));
        }

        let tab = TabItem {
            id: Uuid::new_v4(),
            user_id: item.user_id,
            session_id: item.session_id,
            url: item.url,
            title: item.title,
            favicon: item.favicon,
            captured_at: item.captured_at,
            processed_at: None,
            status: TabStatus::Unread,
            position: item.position,
        };
        self.inner.tabs.lock().unwrap().insert(tab.id, tab.clone());
        Ok(tab)
    }

    async fn list_tab_items(&self, session_id: Uuid, user_id: Uuid) -> PortResult<Vec<TabItem>> {
        let mut items: Vec<_> = self
            .inner
            .tabs
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.session_id == session_id && t.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by_key(|t| (t.position.is_none(), t.position, t.captured_at));
        Ok(items)
    }

    async fn set_tab_status(
        &self,
        tab_item_id: Uuid,
        user_id: Uuid,
        status: TabStatus,
        now: DateTime<Utc>,
    ) -> PortResult<TabItem> {
        let mut tabs = self.inner.tabs.lock().unwrap();
        let tab = tabs
            .get_mut(&tab_item_id)
            .filter(|t| t.user_id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("Tab item {} not found", tab_item_id)))?;

        tab.status = status;
        tab.processed_at = status.is_processed().then_some(now);
        Ok(tab.clone())
    }
}

/// Builds an `AppState` around a mock database, fallback resolution off.
pub fn test_state(db: MockDb) -> Arc<AppState> {
    test_state_with_config(db, false)
}

/// Builds an `AppState` with the dev first-user fallback toggled.
pub fn test_state_with_config(db: MockDb, dev_fallback_user: bool) -> Arc<AppState> {
    let config = Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: "postgres://unused".to_string(),
        log_level: tracing::Level::INFO,
        cors_allowed_origin: "http://localhost:5173".to_string(),
        dev_fallback_user,
    };
    Arc::new(AppState {
        db: Arc::new(db),
        config: Arc::new(config),
    })
}
