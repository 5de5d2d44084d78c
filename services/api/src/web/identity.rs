//! services/api/src/web/identity.rs
//!
//! Credential extraction and the ordered user-resolution chain.
//!
//! Every protected request presents either a browser session cookie or a
//! bearer API key. Resolution walks an explicit list of resolvers and stops
//! at the first one that yields a user; the first-user fallback only joins
//! the chain when `dev_fallback_user` is enabled in the configuration.

use axum::http::{header, HeaderMap};
use tracing::{debug, info};
use uuid::Uuid;

use crate::web::state::AppState;
use tabs_declutter_core::ports::DatabaseService;

/// The credentials presented on one request, as extracted from its headers.
#[derive(Debug, Default)]
pub struct Credentials {
    pub auth_session_id: Option<String>,
    pub api_key: Option<String>,
}

impl Credentials {
    /// Pulls the `session=` cookie and the `Authorization: Bearer` token out
    /// of the request headers. Either or both may be absent.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let auth_session_id = headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|cookies| {
                cookies
                    .split(';')
                    .find_map(|c| c.trim().strip_prefix("session="))
            })
            .map(str::to_string);

        let api_key = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string);

        Self {
            auth_session_id,
            api_key,
        }
    }
}

/// One step of the resolution chain. Each resolver either yields a user id
/// or yields nothing and hands over to the next one.
#[derive(Debug, Clone, Copy)]
enum UserResolver {
    CookieSession,
    BearerApiKey,
    /// Development fallback: the first user record in the system. Weak on
    /// purpose; only reachable when the config flag enables it.
    FirstUserFallback,
}

impl UserResolver {
    async fn resolve(&self, db: &dyn DatabaseService, credentials: &Credentials) -> Option<Uuid> {
        match self {
            UserResolver::CookieSession => {
                let session_id = credentials.auth_session_id.as_deref()?;
                match db.validate_auth_session(session_id).await {
                    Ok(user_id) => Some(user_id),
                    Err(e) => {
                        debug!("Cookie session did not resolve: {:?}", e);
                        None
                    }
                }
            }
            UserResolver::BearerApiKey => {
                let key = credentials.api_key.as_deref()?;
                match db.find_user_by_api_key(key).await {
                    Ok(user_id) => user_id,
                    Err(e) => {
                        debug!("API key did not resolve: {:?}", e);
                        None
                    }
                }
            }
            UserResolver::FirstUserFallback => match db.first_user().await {
                Ok(Some(user)) => {
                    info!(user_id = %user.user_id, "Using first user from database");
                    Some(user.user_id)
                }
                Ok(None) => None,
                Err(e) => {
                    debug!("First-user fallback did not resolve: {:?}", e);
                    None
                }
            },
        }
    }
}

/// Resolves the acting user for a request: cookie session first, then API
/// key, then (in development only) the first user in the database.
pub async fn resolve_user(state: &AppState, credentials: &Credentials) -> Option<Uuid> {
    let mut chain = vec![UserResolver::CookieSession, UserResolver::BearerApiKey];
    if state.config.dev_fallback_user {
        chain.push(UserResolver::FirstUserFallback);
    }

    for resolver in chain {
        if let Some(user_id) = resolver.resolve(state.db.as_ref(), credentials).await {
            return Some(user_id);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_session_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session=abc123; lang=en"),
        );
        let credentials = Credentials::from_headers(&headers);
        assert_eq!(credentials.auth_session_id.as_deref(), Some("abc123"));
        assert!(credentials.api_key.is_none());
    }

    #[test]
    fn extracts_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer tdk_deadbeef"),
        );
        let credentials = Credentials::from_headers(&headers);
        assert_eq!(credentials.api_key.as_deref(), Some("tdk_deadbeef"));
        assert!(credentials.auth_session_id.is_none());
    }

    #[test]
    fn missing_headers_yield_empty_credentials() {
        let credentials = Credentials::from_headers(&HeaderMap::new());
        assert!(credentials.auth_session_id.is_none());
        assert!(credentials.api_key.is_none());
    }

    mod chain {
        use super::super::*;
        use crate::test_support::{test_state, test_state_with_config, MockDb};

        #[tokio::test]
        async fn cookie_session_wins_over_api_key() {
            let db = MockDb::new();
            let session_user = db.seed_user("session@example.com");
            let key_user = db.seed_user("key@example.com");
            db.seed_auth_session("sess-1", session_user);
            db.seed_api_key("tdk_abc", key_user);
            let state = test_state(db);

            let credentials = Credentials {
                auth_session_id: Some("sess-1".to_string()),
                api_key: Some("tdk_abc".to_string()),
            };
            assert_eq!(resolve_user(&state, &credentials).await, Some(session_user));
        }

        #[tokio::test]
        async fn api_key_resolves_when_session_is_invalid() {
            let db = MockDb::new();
            let key_user = db.seed_user("key@example.com");
            db.seed_api_key("tdk_abc", key_user);
            let state = test_state(db);

            let credentials = Credentials {
                auth_session_id: Some("stale-session".to_string()),
                api_key: Some("tdk_abc".to_string()),
            };
            assert_eq!(resolve_user(&state, &credentials).await, Some(key_user));
        }

        #[tokio::test]
        async fn fallback_never_fires_when_disabled() {
            let db = MockDb::new();
            db.seed_user("only@example.com");
            let state = test_state(db);

            assert_eq!(resolve_user(&state, &Credentials::default()).await, None);
        }

        #[tokio::test]
        async fn fallback_yields_first_user_when_enabled() {
            let db = MockDb::new();
            let first = db.seed_user("first@example.com");
            db.seed_user("second@example.com");
            let state = test_state_with_config(db, true);

            assert_eq!(
                resolve_user(&state, &Credentials::default()).await,
                Some(first)
            );
        }

        #[tokio::test]
        async fn fallback_with_no_users_resolves_nothing() {
            let state = test_state_with_config(MockDb::new(), true);
            assert_eq!(resolve_user(&state, &Credentials::default()).await, None);
        }
    }
}
