//! crates/collector/src/filter.rs
//!
//! Turns a snapshot of open tabs into a clean, ordered capture batch.
//!
//! Duplicates are allowed, input order is preserved, and a batch that ends
//! up empty after filtering is a `NoEligibleTabs` failure - reported before
//! any network call happens.

use serde::Deserialize;

use crate::error::{CollectorError, CollectorResult};
use tabs_declutter_core::capture::{is_capturable, CapturedTab};

/// One open browser tab as reported by the host environment.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenTab {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "favIconUrl", default)]
    pub fav_icon_url: Option<String>,
    /// Whether this is the active tab of the focused window.
    #[serde(default)]
    pub active: bool,
}

/// Which tabs a capture includes: every open tab, or only the active one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    All,
    Current,
}

/// Builds the ordered `{url, title}` batch for one capture.
pub fn plan_batch<S: AsRef<str>>(
    tabs: &[OpenTab],
    mode: CaptureMode,
    internal_prefixes: &[S],
) -> CollectorResult<Vec<CapturedTab>> {
    let batch: Vec<CapturedTab> = tabs
        .iter()
        .filter(|tab| match mode {
            CaptureMode::All => true,
            CaptureMode::Current => tab.active,
        })
        .filter(|tab| is_capturable(&tab.url, internal_prefixes))
        .map(|tab| {
            CapturedTab::new(
                tab.url.clone(),
                tab.title.as_deref(),
                tab.fav_icon_url.clone(),
            )
        })
        .collect();

    if batch.is_empty() {
        return Err(CollectorError::NoEligibleTabs);
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabs_declutter_core::capture::{default_internal_prefixes, UNTITLED_TITLE};

    fn tab(url: &str, title: Option<&str>) -> OpenTab {
        OpenTab {
            url: url.to_string(),
            title: title.map(str::to_string),
            fav_icon_url: None,
            active: false,
        }
    }

    #[test]
    fn filters_internal_urls_and_defaults_titles() {
        let tabs = vec![
            tab("https://a.com", Some("A")),
            tab("chrome://settings", None),
            tab("https://b.com", None),
        ];

        let batch = plan_batch(&tabs, CaptureMode::All, &default_internal_prefixes()).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].url, "https://a.com");
        assert_eq!(batch[0].title, "A");
        assert_eq!(batch[1].url, "https://b.com");
        assert_eq!(batch[1].title, UNTITLED_TITLE);
    }

    #[test]
    fn no_retained_url_matches_a_prefix() {
        let prefixes = default_internal_prefixes();
        let tabs = vec![
            tab("https://a.com", None),
            tab("edge://flags", None),
            tab("about:blank", None),
            tab("https://b.com/about:page", None),
        ];

        let batch = plan_batch(&tabs, CaptureMode::All, &prefixes).unwrap();
        for captured in &batch {
            assert!(!prefixes.iter().any(|p| captured.url.starts_with(p)));
        }
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn all_internal_urls_fail_with_no_eligible_tabs() {
        let tabs = vec![
            tab("chrome://settings", None),
            tab("about:blank", None),
            tab("chrome-extension://abc/popup.html", None),
        ];

        let result = plan_batch(&tabs, CaptureMode::All, &default_internal_prefixes());
        assert!(matches!(result, Err(CollectorError::NoEligibleTabs)));
    }

    #[test]
    fn empty_tab_list_fails_with_no_eligible_tabs() {
        let result = plan_batch(&[], CaptureMode::All, &default_internal_prefixes());
        assert!(matches!(result, Err(CollectorError::NoEligibleTabs)));
    }

    #[test]
    fn current_mode_selects_only_the_active_tab() {
        let mut active = tab("https://b.com", Some("B"));
        active.active = true;
        let tabs = vec![tab("https://a.com", Some("A")), active];

        let batch = plan_batch(&tabs, CaptureMode::Current, &default_internal_prefixes()).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].url, "https://b.com");
    }

    #[test]
    fn current_mode_with_internal_active_tab_fails() {
        let mut active = tab("chrome://settings", None);
        active.active = true;
        let tabs = vec![tab("https://a.com", Some("A")), active];

        let result = plan_batch(&tabs, CaptureMode::Current, &default_internal_prefixes());
        assert!(matches!(result, Err(CollectorError::NoEligibleTabs)));
    }

    #[test]
    fn duplicates_are_kept_in_order() {
        let tabs = vec![
            tab("https://a.com", Some("first")),
            tab("https://a.com", Some("second")),
        ];

        let batch = plan_batch(&tabs, CaptureMode::All, &default_internal_prefixes()).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].title, "first");
        assert_eq!(batch[1].title, "second");
    }
}
