//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification.

use utoipa::OpenApi;

use crate::web::auth::{
    AuthResponse, CurrentUserResponse, LoginRequest, SignupRequest, SignupResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::auth::signup_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::auth::current_user_handler,
        crate::web::capture::capture_tabs_handler,
        crate::web::triage::update_tab_status_handler,
        crate::web::triage::list_sessions_handler,
        crate::web::triage::get_session_handler,
        crate::web::triage::list_session_tabs_handler,
        crate::web::triage::update_session_status_handler,
    ),
    components(
        schemas(SignupRequest, LoginRequest, AuthResponse, SignupResponse, CurrentUserResponse)
    ),
    tags(
        (name = "Tabs Declutter API", description = "API endpoints for capturing and triaging browser tabs.")
    )
)]
pub struct ApiDoc;
