//! URL and container filtering for organic-result extraction.

use crate::config::ExtractionConfig;
use crate::domain::host_of;

/// Filters hyperlinks down to plausible organic-result URLs.
///
/// A URL survives when it is a well-formed http(s) URL with a
/// two-label-or-more host and matches no exclusion pattern.
#[derive(Debug, Clone, Copy)]
pub struct UrlFilter<'a> {
    config: &'a ExtractionConfig,
}

impl<'a> UrlFilter<'a> {
    /// Creates a filter over the configured exclusion patterns.
    #[must_use]
    pub fn new(config: &'a ExtractionConfig) -> Self {
        Self { config }
    }

    /// Whether a raw href is a plausible organic-result URL.
    #[must_use]
    pub fn accepts(&self, url: &str) -> bool {
        if url.is_empty() {
            return false;
        }

        let url_lower = url.to_lowercase();
        if !url_lower.starts_with("http://") && !url_lower.starts_with("https://") {
            return false;
        }

        if self
            .config
            .exclusion_patterns
            .iter()
            .any(|pattern| url_lower.contains(pattern.as_str()))
        {
            return false;
        }

        let host = host_of(&url_lower);
        if host.len() < 3 || host.starts_with('[') {
            return false;
        }

        let labels: Vec<&str> = host.split('.').collect();
        if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
            return false;
        }

        // Numeric hosts are IP literals, never ranked sites.
        if labels.iter().all(|l| l.chars().all(|c| c.is_ascii_digit())) {
            return false;
        }

        true
    }
}

/// Outcome of scanning a result container's serialized markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerScan {
    /// No non-organic marker was found in the markup.
    pub markers_absent: bool,
    /// The markup exposes a heading node.
    pub has_heading: bool,
    /// The markup exposes a snippet/description node.
    pub has_snippet: bool,
}

impl ContainerScan {
    /// Whether the container passes all organic checks.
    #[must_use]
    pub fn is_organic(&self) -> bool {
        self.markers_absent && self.has_heading && self.has_snippet
    }
}

/// Scans lowercase container markup against the configured marker lists.
#[must_use]
pub fn scan_container(markup_lower: &str, config: &ExtractionConfig) -> ContainerScan {
    let markers_absent = !config
        .container_blocklist
        .iter()
        .any(|marker| markup_lower.contains(marker.as_str()));
    let has_heading = config
        .heading_markers
        .iter()
        .any(|marker| markup_lower.contains(marker.as_str()));
    let has_snippet = config
        .snippet_markers
        .iter()
        .any(|marker| markup_lower.contains(marker.as_str()));

    ContainerScan {
        markers_absent,
        has_heading,
        has_snippet,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter_fixture() -> ExtractionConfig {
        ExtractionConfig::default()
    }

    #[test]
    fn test_accepts_plain_organic_url() {
        let config = filter_fixture();
        let filter = UrlFilter::new(&config);
        assert!(filter.accepts("https://www.shop.example.com/sale"));
        assert!(filter.accepts("http://example.org"));
    }

    #[test]
    fn test_rejects_non_http_schemes() {
        let config = filter_fixture();
        let filter = UrlFilter::new(&config);
        assert!(!filter.accepts(""));
        assert!(!filter.accepts("javascript:void(0)"));
        assert!(!filter.accepts("mailto:x@example.com"));
        assert!(!filter.accepts("ftp://example.com/file"));
    }

    #[test]
    fn test_rejects_excluded_domains_and_patterns() {
        let config = filter_fixture();
        let filter = UrlFilter::new(&config);
        assert!(!filter.accepts("https://www.google.com/search?q=shoes"));
        assert!(!filter.accepts("https://accounts.google.com/signin"));
        assert!(!filter.accepts("https://example.com/url?q=redirect"));
        assert!(!filter.accepts("https://googleads.g.doubleclick.net/aclk?x=1"));
        assert!(!filter.accepts("https://www.google.com/search?tbm=isch&q=x"));
        assert!(!filter.accepts("https://bit.ly/abc"));
    }

    #[test]
    fn test_rejects_structurally_invalid_hosts() {
        let config = filter_fixture();
        let filter = UrlFilter::new(&config);
        assert!(!filter.accepts("https://localhost/page"));
        assert!(!filter.accepts("https://192.168.0.1/admin"));
        assert!(!filter.accepts("https://x./page"));
    }

    #[test]
    fn test_container_scan_flags() {
        let config = filter_fixture();

        let organic = scan_container(
            "<div class=\"g\"><h3>title</h3><div class=\"vwic3b\">snippet</div></div>",
            &config,
        );
        assert!(organic.is_organic());

        let sponsored = scan_container(
            "<div class=\"g\" data-text-ad><h3>t</h3><span>sponsored</span><div class=\"vwic3b\">s</div></div>",
            &config,
        );
        assert!(!sponsored.markers_absent);
        assert!(!sponsored.is_organic());

        let headless = scan_container("<div class=\"vwic3b\">snippet only</div>", &config);
        assert!(!headless.has_heading);
        assert!(headless.has_snippet);
        assert!(!headless.is_organic());
    }
}
