//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

use tabs_declutter_core::domain::{
    ApiKey, CaptureSession, SessionStatus, TabItem, TabStatus, User, UserCredentials,
};
use tabs_declutter_core::ports::{DatabaseService, NewTabItem, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: Option<String>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct UserCredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl UserCredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct CaptureSessionRecord {
    id: Uuid,
    user_id: Uuid,
    started_at: DateTime<Utc>,
    captured_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    status: String,
    tab_count: i32,
    processed_tabs: i32,
}
impl CaptureSessionRecord {
    fn to_domain(self) -> PortResult<CaptureSession> {
        let status = SessionStatus::from_str(&self.status).map_err(PortError::Unexpected)?;
        Ok(CaptureSession {
            id: self.id,
            user_id: self.user_id,
            started_at: self.started_at,
            captured_at: self.captured_at,
            completed_at: self.completed_at,
            status,
            tab_count: self.tab_count,
            processed_tabs: self.processed_tabs,
        })
    }
}

#[derive(FromRow)]
struct TabItemRecord {
    id: Uuid,
    user_id: Uuid,
    session_id: Uuid,
    url: String,
    title: String,
    favicon: Option<String>,
    captured_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
    status: String,
    position: Option<i32>,
}
impl TabItemRecord {
    fn to_domain(self) -> PortResult<TabItem> {
        let status = TabStatus::from_str(&self.status).map_err(PortError::Unexpected)?;
        Ok(TabItem {
            id: self.id,
            user_id: self.user_id,
            session_id: self.session_id,
            url: self.url,
            title: self.title,
            favicon: self.favicon,
            captured_at: self.captured_at,
            processed_at: self.processed_at,
            status,
            position: self.position,
        })
    }
}

const TAB_ITEM_COLUMNS: &str =
    "id, user_id, session_id, url, title, favicon, captured_at, processed_at, status, position";

const SESSION_COLUMNS: &str =
    "id, user_id, started_at, captured_at, completed_at, status, tab_count, processed_tabs";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) \
             RETURNING user_id, email",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserCredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;

        Ok(record.to_domain())
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        let record =
            sqlx::query_as::<_, UserRecord>("SELECT user_id, email FROM users WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| match e {
                    sqlx::Error::RowNotFound => {
                        PortError::NotFound(format!("User {} not found", user_id))
                    }
                    _ => unexpected(e),
                })?;

        Ok(record.to_domain())
    }

    async fn first_user(&self) -> PortResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email FROM users ORDER BY created_at ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.map(|r| r.to_domain()))
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        user_id.ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_api_key(&self, user_id: Uuid) -> PortResult<ApiKey> {
        let key = format!("tdk_{}", Uuid::new_v4().simple());
        let created_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            "INSERT INTO api_keys (key, user_id) VALUES ($1, $2) RETURNING created_at",
        )
        .bind(&key)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(ApiKey {
            key,
            user_id,
            created_at,
        })
    }

    async fn find_user_by_api_key(&self, key: &str) -> PortResult<Option<Uuid>> {
        sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM api_keys WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn create_capture_session(
        &self,
        user_id: Uuid,
        tab_count: i32,
        captured_at: DateTime<Utc>,
    ) -> PortResult<CaptureSession> {
        // started_at and captured_at are stamped with the same instant so the
        // two timestamps of one batch can never diverge.
        let record = sqlx::query_as::<_, CaptureSessionRecord>(&format!(
            "INSERT INTO capture_sessions \
             (id, user_id, started_at, captured_at, status, tab_count, processed_tabs) \
             VALUES ($1, $2, $3, $3, 'active', $4, 0) \
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(captured_at)
        .bind(tab_count)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        record.to_domain()
    }

    async fn get_capture_session(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> PortResult<CaptureSession> {
        let record = sqlx::query_as::<_, CaptureSessionRecord>(&format!(
            "SELECT {SESSION_COLUMNS} FROM capture_sessions WHERE id = $1 AND user_id = $2"
        ))
        .bind(session_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Session {} not found", session_id))
            }
            _ => unexpected(e),
        })?;

        record.to_domain()
    }

    async fn list_capture_sessions(&self, user_id: Uuid) -> PortResult<Vec<CaptureSession>> {
        let records = sqlx::query_as::<_, CaptureSessionRecord>(&format!(
            "SELECT {SESSION_COLUMNS} FROM capture_sessions \
             WHERE user_id = $1 ORDER BY captured_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn update_session_status(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        status: SessionStatus,
        now: DateTime<Utc>,
    ) -> PortResult<CaptureSession> {
        let completed_at = matches!(status, SessionStatus::Completed).then_some(now);

        // processed_tabs is recounted on every lifecycle change; the capture
        // and triage flows themselves never touch it.
        let record = sqlx::query_as::<_, CaptureSessionRecord>(&format!(
            "UPDATE capture_sessions SET status = $1, completed_at = $2, \
             processed_tabs = (SELECT COUNT(*)::int FROM tab_items \
                               WHERE session_id = $3 AND processed_at IS NOT NULL) \
             WHERE id = $3 AND user_id = $4 \
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(completed_at)
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))?;

        record.to_domain()
    }

    async fn create_tab_item(&self, item: NewTabItem) -> PortResult<TabItem> {
        let record = sqlx::query_as::<_, TabItemRecord>(&format!(
            "INSERT INTO tab_items \
             (id, user_id, session_id, url, title, favicon, captured_at, status, position) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'unread', $8) \
             RETURNING {TAB_ITEM_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(item.user_id)
        .bind(item.session_id)
        .bind(&item.url)
        .bind(&item.title)
        .bind(&item.favicon)
        .bind(item.captured_at)
        .bind(item.position)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        record.to_domain()
    }

    async fn list_tab_items(&self, session_id: Uuid, user_id: Uuid) -> PortResult<Vec<TabItem>> {
        let records = sqlx::query_as::<_, TabItemRecord>(&format!(
            "SELECT {TAB_ITEM_COLUMNS} FROM tab_items \
             WHERE session_id = $1 AND user_id = $2 \
             ORDER BY position ASC NULLS LAST, captured_at ASC"
        ))
        .bind(session_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn set_tab_status(
        &self,
        tab_item_id: Uuid,
        user_id: Uuid,
        status: TabStatus,
        now: DateTime<Utc>,
    ) -> PortResult<TabItem> {
        // Entering read/delete stamps processed_at; entering unread/keep
        // clears it. Plain UPDATE, last write wins.
        let processed_at = status.is_processed().then_some(now);

        let record = sqlx::query_as::<_, TabItemRecord>(&format!(
            "UPDATE tab_items SET status = $1, processed_at = $2 \
             WHERE id = $3 AND user_id = $4 \
             RETURNING {TAB_ITEM_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(processed_at)
        .bind(tab_item_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Tab item {} not found", tab_item_id)))?;

        record.to_domain()
    }
}
