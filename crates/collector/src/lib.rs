//! crates/collector/src/lib.rs
//!
//! The capture collector: filters a snapshot of open tabs down to an
//! eligible batch and submits it to the API service in one call.

pub mod client;
pub mod error;
pub mod filter;
pub mod settings;

use chrono::{DateTime, Utc};

use crate::client::ApiClient;
use crate::error::CollectorResult;
use crate::filter::{plan_batch, CaptureMode, OpenTab};
use crate::settings::Settings;
use tabs_declutter_core::protocol::CaptureResponse;

/// What the collector remembers about its most recent successful capture,
/// for display purposes only.
#[derive(Debug, Clone)]
pub struct LastCapture {
    pub at: DateTime<Utc>,
    pub count: usize,
}

/// The collector's application-local context: settings, the API client, and
/// the last-capture marker. Constructed once at initialization and passed by
/// reference to whatever drives it.
pub struct Collector {
    settings: Settings,
    client: ApiClient,
    last_capture: Option<LastCapture>,
}

impl Collector {
    pub fn new(settings: Settings) -> Self {
        let client = ApiClient::new(settings.api_url.clone(), settings.api_key.clone());
        Self {
            settings,
            client,
            last_capture: None,
        }
    }

    pub fn last_capture(&self) -> Option<&LastCapture> {
        self.last_capture.as_ref()
    }

    /// How many of the given tabs would survive filtering, for display.
    pub fn eligible_count(&self, tabs: &[OpenTab]) -> usize {
        tabs.iter()
            .filter(|tab| {
                tabs_declutter_core::capture::is_capturable(
                    &tab.url,
                    &self.settings.internal_prefixes,
                )
            })
            .count()
    }

    /// Plans and submits one capture. Fails with `NoEligibleTabs` before any
    /// network call when filtering leaves nothing; on success records the
    /// last-capture marker.
    pub async fn capture(
        &mut self,
        mode: CaptureMode,
        tabs: &[OpenTab],
    ) -> CollectorResult<CaptureResponse> {
        let batch = plan_batch(tabs, mode, &self.settings.internal_prefixes)?;
        let response = self.client.capture_tabs(&batch).await?;

        // Never report success off a body that says otherwise.
        if !response.success {
            return Err(crate::error::CollectorError::UnexpectedResponse(
                "Server reported failure in a success response".to_string(),
            ));
        }

        self.last_capture = Some(LastCapture {
            at: Utc::now(),
            count: response.tabs_captured,
        });
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectorError;

    fn collector() -> Collector {
        // Port 9 is the discard service; nothing listens there in tests, so
        // any attempted network call would surface as Transport, not
        // NoEligibleTabs.
        let settings = Settings::new("http://127.0.0.1:9/".parse().unwrap(), "tdk_test");
        Collector::new(settings)
    }

    #[tokio::test]
    async fn fully_filtered_batch_fails_before_the_network() {
        let mut collector = collector();
        let tabs = vec![
            OpenTab {
                url: "chrome://settings".to_string(),
                title: None,
                fav_icon_url: None,
                active: true,
            },
            OpenTab {
                url: "about:blank".to_string(),
                title: None,
                fav_icon_url: None,
                active: false,
            },
        ];

        let result = collector.capture(CaptureMode::All, &tabs).await;
        assert!(matches!(result, Err(CollectorError::NoEligibleTabs)));
        assert!(collector.last_capture().is_none());
    }

    #[test]
    fn eligible_count_ignores_internal_tabs() {
        let collector = collector();
        let tabs = vec![
            OpenTab {
                url: "https://a.com".to_string(),
                title: None,
                fav_icon_url: None,
                active: false,
            },
            OpenTab {
                url: "chrome://history".to_string(),
                title: None,
                fav_icon_url: None,
                active: false,
            },
        ];
        assert_eq!(collector.eligible_count(&tabs), 1);
    }
}
