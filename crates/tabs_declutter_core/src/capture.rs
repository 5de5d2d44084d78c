//! crates/tabs_declutter_core/src/capture.rs
//!
//! The capture eligibility rules shared by the collector and its tests:
//! which URLs may be captured, and how missing titles are defaulted.

/// Placeholder title applied when a tab has no title of its own.
pub const UNTITLED_TITLE: &str = "Untitled";

/// Internal-scheme prefixes that are never eligible for capture, covering
/// Chromium-based browsers plus Firefox extension pages. This set is a
/// default: collector settings may replace it.
pub const DEFAULT_INTERNAL_PREFIXES: &[&str] = &[
    "chrome://",
    "edge://",
    "brave://",
    "about:",
    "chrome-extension://",
    "moz-extension://",
    "vivaldi://",
    "opera://",
];

/// Returns the default internal-scheme prefix set as owned strings, the form
/// collector settings store.
pub fn default_internal_prefixes() -> Vec<String> {
    DEFAULT_INTERNAL_PREFIXES
        .iter()
        .map(|p| p.to_string())
        .collect()
}

/// A tab is eligible for capture only if its URL is non-empty and does not
/// start with any of the configured internal-scheme prefixes.
pub fn is_capturable<S: AsRef<str>>(url: &str, internal_prefixes: &[S]) -> bool {
    if url.is_empty() {
        return false;
    }
    !internal_prefixes
        .iter()
        .any(|prefix| url.starts_with(prefix.as_ref()))
}

/// One `{url, title}` pair ready for transmission, with title defaulting
/// already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedTab {
    pub url: String,
    pub title: String,
    pub favicon: Option<String>,
}

impl CapturedTab {
    /// Builds a captured tab, replacing a missing or empty title with the
    /// fixed placeholder.
    pub fn new(url: impl Into<String>, title: Option<&str>, favicon: Option<String>) -> Self {
        let title = match title {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => UNTITLED_TITLE.to_string(),
        };
        Self {
            url: url.into(),
            title,
            favicon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_urls_are_not_capturable() {
        let prefixes = default_internal_prefixes();
        assert!(!is_capturable("chrome://settings", &prefixes));
        assert!(!is_capturable("about:blank", &prefixes));
        assert!(!is_capturable("chrome-extension://abc/popup.html", &prefixes));
        assert!(!is_capturable("", &prefixes));
    }

    #[test]
    fn ordinary_urls_are_capturable() {
        let prefixes = default_internal_prefixes();
        assert!(is_capturable("https://a.com", &prefixes));
        // "aboutface.com" must not be caught by the "about:" prefix
        assert!(is_capturable("https://aboutface.com", &prefixes));
    }

    #[test]
    fn prefix_set_is_configuration() {
        let prefixes = vec!["intranet://".to_string()];
        assert!(!is_capturable("intranet://wiki", &prefixes));
        assert!(is_capturable("chrome://settings", &prefixes));
    }

    #[test]
    fn missing_or_empty_title_gets_placeholder() {
        let tab = CapturedTab::new("https://a.com", Some("A"), None);
        assert_eq!(tab.title, "A");

        let tab = CapturedTab::new("https://b.com", None, None);
        assert_eq!(tab.title, UNTITLED_TITLE);

        let tab = CapturedTab::new("https://c.com", Some(""), None);
        assert_eq!(tab.title, UNTITLED_TITLE);
    }
}
