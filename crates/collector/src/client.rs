//! crates/collector/src/client.rs
//!
//! The HTTP client that submits capture batches to the API service.

use reqwest::{header, Client as HttpClient, Response};
use tracing::debug;
use url::Url;

use crate::error::{CollectorError, CollectorResult};
use tabs_declutter_core::capture::CapturedTab;
use tabs_declutter_core::protocol::{CaptureRequest, CaptureResponse, ErrorBody, IncomingTab};

/// REST client for the Tabs Declutter API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: HttpClient,
    base_url: Url,
    api_key: String,
}

impl ApiClient {
    /// Create a new API client.
    pub fn new(base_url: Url, api_key: impl Into<String>) -> Self {
        let http_client = HttpClient::builder()
            .user_agent("tabs-declutter-collector/0.1")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            base_url,
            api_key: api_key.into(),
        }
    }

    /// Create a client from a base URL string.
    pub fn from_url(base_url: &str, api_key: impl Into<String>) -> CollectorResult<Self> {
        let base_url = Url::parse(base_url)?;
        Ok(Self::new(base_url, api_key))
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Submit one capture batch: a single call creates the session and all
    /// tab items for the user behind the API key.
    pub async fn capture_tabs(&self, batch: &[CapturedTab]) -> CollectorResult<CaptureResponse> {
        let request = CaptureRequest {
            tabs: batch
                .iter()
                .map(|tab| IncomingTab {
                    url: tab.url.clone(),
                    title: Some(tab.title.clone()),
                    fav_icon_url: tab.favicon.clone(),
                })
                .collect(),
        };

        let url = self.base_url.join("captureTabs")?;
        debug!("POST {} ({} tabs)", url, request.tabs.len());
        let response = self
            .http_client
            .post(url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    async fn handle_response(&self, response: Response) -> CollectorResult<CaptureResponse> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&text)
                .map_err(|_| CollectorError::UnexpectedResponse(text));
        }

        // A malformed error body is coerced into a generic message rather
        // than failing the error-handling path itself.
        let message = match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => body.error,
            Err(_) => format!("HTTP {}", status),
        };
        Err(CollectorError::Api { status, message })
    }
}
