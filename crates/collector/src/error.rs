//! crates/collector/src/error.rs
//!
//! Error types for the collector.

use reqwest::StatusCode;
use thiserror::Error;

use crate::settings::SettingsError;

/// Errors that can occur while planning or submitting a capture batch.
///
/// `Transport` and `Api` are deliberately distinct: a socket-level failure is
/// not the same thing as a well-formed error response from the server.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Every open tab matched an internal-scheme prefix; nothing to submit.
    /// Raised before any network call is attempted.
    #[error("No valid tabs to capture")]
    NoEligibleTabs,

    #[error("Configuration error: {0}")]
    Config(#[from] SettingsError),

    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with an error status. `message` comes from the
    /// response body when it parses, or is a generic placeholder when the
    /// body is malformed.
    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid tab listing: {0}")]
    InvalidTabListing(#[from] serde_json::Error),
}

/// A convenience type alias for `Result<T, CollectorError>`.
pub type CollectorResult<T> = Result<T, CollectorError>;
