pub mod auth;
pub mod capture;
pub mod identity;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod triage;

// Re-export the handlers the binary wires into the router.
pub use capture::capture_tabs_handler;
pub use middleware::require_user;
pub use triage::{
    get_session_handler, list_session_tabs_handler, list_sessions_handler,
    update_session_status_handler, update_tab_status_handler,
};
