//! crates/collector/src/settings.rs
//!
//! Persisted collector configuration: the endpoint base address, the API
//! credential, and the internal-scheme prefix set.
//!
//! A missing address or credential is a configuration error reported to the
//! operator before any capture is planned - never a protocol error.

use url::Url;

use tabs_declutter_core::capture::default_internal_prefixes;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Everything the collector needs to submit a batch.
#[derive(Clone, Debug)]
pub struct Settings {
    pub api_url: Url,
    pub api_key: String,
    pub internal_prefixes: Vec<String>,
}

impl Settings {
    /// Builds settings with the default internal-scheme prefix set.
    pub fn new(api_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            api_url,
            api_key: api_key.into(),
            internal_prefixes: default_internal_prefixes(),
        }
    }

    /// Loads settings from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, SettingsError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let api_url_str = std::env::var("TABS_API_URL")
            .map_err(|_| SettingsError::MissingVar("TABS_API_URL".to_string()))?;
        let api_url = api_url_str
            .parse::<Url>()
            .map_err(|e| SettingsError::InvalidValue("TABS_API_URL".to_string(), e.to_string()))?;

        let api_key = std::env::var("TABS_API_KEY")
            .map_err(|_| SettingsError::MissingVar("TABS_API_KEY".to_string()))?;

        // The prefix set is configuration; the env var overrides the default.
        let internal_prefixes = match std::env::var("TABS_INTERNAL_PREFIXES") {
            Ok(list) => list
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            Err(_) => default_internal_prefixes(),
        };

        Ok(Self {
            api_url,
            api_key,
            internal_prefixes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_default_prefixes() {
        let settings = Settings::new("https://api.example.com".parse().unwrap(), "tdk_abc");
        assert!(settings
            .internal_prefixes
            .iter()
            .any(|p| p == "chrome://"));
        assert!(settings
            .internal_prefixes
            .iter()
            .any(|p| p == "about:"));
    }
}
