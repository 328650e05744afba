//! Configuration types for the crawl pipeline.
//!
//! Every list here (selectors, exclusion patterns, markers) is data, not
//! code: callers can retarget the extractor at a different results feed by
//! swapping configuration, without touching the pipeline.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for issuing the query and recognizing result pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// URL template for the query; `{query}` is replaced with the
    /// percent-encoded keyword.
    #[serde(default = "default_query_url")]
    pub query_url_template: String,
    /// Selectors whose presence signals that results have rendered.
    #[serde(default = "default_results_selectors")]
    pub results_selectors: Vec<String>,
    /// Bounded wait for the results-presence signal, in seconds.
    #[serde(default = "default_results_timeout")]
    pub results_timeout_seconds: f64,
    /// Lowercase page-source markers that indicate a block/challenge page.
    #[serde(default = "default_challenge_markers")]
    pub challenge_markers: Vec<String>,
    /// Selectors for the next-page control, most specific first.
    #[serde(default = "default_next_page_selectors")]
    pub next_page_selectors: Vec<String>,
    /// Bounded wait for pagination to complete, in seconds.
    #[serde(default = "default_pagination_timeout")]
    pub pagination_timeout_seconds: f64,
}

fn default_query_url() -> String {
    "https://www.google.com/search?q={query}".to_string()
}

fn default_results_selectors() -> Vec<String> {
    vec!["div.g".into(), "div.tF2Cxc".into(), ".MjjYud".into()]
}

fn default_results_timeout() -> f64 {
    20.0
}

fn default_challenge_markers() -> Vec<String> {
    ["recaptcha", "captcha", "g-recaptcha", "unusual traffic", "challenge"]
        .map(String::from)
        .to_vec()
}

fn default_next_page_selectors() -> Vec<String> {
    [
        "#pnnext",
        "a[aria-label='Next page']",
        "a[id='pnnext']",
        "a[href*='start=']",
    ]
    .map(String::from)
    .to_vec()
}

fn default_pagination_timeout() -> f64 {
    10.0
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            query_url_template: default_query_url(),
            results_selectors: default_results_selectors(),
            results_timeout_seconds: default_results_timeout(),
            challenge_markers: default_challenge_markers(),
            next_page_selectors: default_next_page_selectors(),
            pagination_timeout_seconds: default_pagination_timeout(),
        }
    }
}

impl SearchConfig {
    /// Builds the query URL for a keyword.
    #[must_use]
    pub fn query_url(&self, keyword: &str) -> String {
        self.query_url_template
            .replace("{query}", &urlencoding::encode(keyword))
    }

    /// Results-presence timeout as a [`Duration`].
    #[must_use]
    pub fn results_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.results_timeout_seconds)
    }

    /// Pagination timeout as a [`Duration`].
    #[must_use]
    pub fn pagination_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.pagination_timeout_seconds)
    }
}

/// A named group of selectors tried as one extraction strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySpec {
    /// Strategy name, used in logs and events.
    pub name: String,
    /// Selectors queried by this strategy, in order.
    pub selectors: Vec<String>,
}

impl StrategySpec {
    /// Creates a new strategy spec.
    #[must_use]
    pub fn new(name: impl Into<String>, selectors: Vec<String>) -> Self {
        Self {
            name: name.into(),
            selectors,
        }
    }
}

/// Configuration for organic-result extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Ordered strategy ladder, most specific/modern first.
    #[serde(default = "default_strategies")]
    pub strategies: Vec<StrategySpec>,
    /// Lowercase URL substrings that disqualify a hyperlink.
    #[serde(default = "default_exclusion_patterns")]
    pub exclusion_patterns: Vec<String>,
    /// Class names that identify a result container element.
    #[serde(default = "default_container_classes")]
    pub container_classes: Vec<String>,
    /// Lowercase markup markers that flag a container as non-organic.
    #[serde(default = "default_container_blocklist")]
    pub container_blocklist: Vec<String>,
    /// Lowercase markup fragments that indicate a heading node.
    #[serde(default = "default_heading_markers")]
    pub heading_markers: Vec<String>,
    /// Lowercase markup fragments that indicate a snippet/description node.
    #[serde(default = "default_snippet_markers")]
    pub snippet_markers: Vec<String>,
    /// Element id fragments that identify the main results region.
    #[serde(default = "default_region_markers")]
    pub region_id_markers: Vec<String>,
    /// Maximum candidates returned per page.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// How many elements to inspect per selector before moving on.
    #[serde(default = "default_selector_scan")]
    pub per_selector_scan: usize,
    /// How many anchors the emergency pass inspects.
    #[serde(default = "default_emergency_scan")]
    pub emergency_scan: usize,
}

fn default_strategies() -> Vec<StrategySpec> {
    vec![
        StrategySpec::new(
            "modern-cards",
            [
                "div.g div.yuRUbf a[href]",
                "div.tF2Cxc div.yuRUbf a[href]",
                "div[data-sokoban-container] a[href]",
            ]
            .map(String::from)
            .to_vec(),
        ),
        StrategySpec::new(
            "classic-results",
            [
                "div.g div.r a[href]",
                "div.rc div.r a[href]",
                ".srg .g a[href]",
            ]
            .map(String::from)
            .to_vec(),
        ),
        StrategySpec::new(
            "heading-anchors",
            ["div.g h3 a[href]", "h3 a[href]"].map(String::from).to_vec(),
        ),
        StrategySpec::new(
            "permissive",
            ["a[href^='http']"].map(String::from).to_vec(),
        ),
    ]
}

fn default_exclusion_patterns() -> Vec<String> {
    [
        // First-party search-engine domains and services
        "google.com",
        "googleusercontent.com",
        "googleapis.com",
        "accounts.google",
        "support.google",
        "policies.google",
        "webcache.googleusercontent",
        "translate.google",
        "maps.google",
        "shopping.google",
        "images.google",
        "news.google",
        "books.google",
        "scholar.google",
        "patents.google",
        // Ad and tracking networks
        "googleads",
        "googlesyndication",
        "googleadservices",
        "googletagmanager.com",
        "google-analytics.com",
        "doubleclick.net",
        "adsystem",
        "adsense",
        "adnxs",
        "amazon-adsystem",
        "outbrain.com",
        "/aclk?",
        "/pagead/",
        // Search/preferences/type-filter query patterns
        "/search?",
        "/preferences?",
        "/advanced_search",
        "/imgres?",
        "/url?q=",
        "/url?sa=",
        "tbm=isch",
        "tbm=vid",
        "tbm=nws",
        "tbm=shop",
        "tbm=bks",
        // Non-web schemes
        "javascript:",
        "mailto:",
        "tel:",
        "ftp:",
        "file:",
        "data:",
        // Redirectors and shorteners
        "youtube.com/redirect",
        "facebook.com/l.php",
        "t.co/",
        "bit.ly/",
        "tinyurl.com",
        "goo.gl/",
        "ow.ly/",
        "buff.ly/",
        "amzn.to/",
        "fb.me/",
        "youtu.be/",
    ]
    .map(String::from)
    .to_vec()
}

fn default_container_classes() -> Vec<String> {
    ["g", "tF2Cxc", "MjjYud"].map(String::from).to_vec()
}

fn default_container_blocklist() -> Vec<String> {
    [
        "ads-fr",
        "commercial",
        "sponsored",
        "ad_cclk",
        "ad-slot",
        "advertisement",
        "people also ask",
        "related questions",
        "accordion",
        "related searches",
        "knowledge panel",
        "knowledge-panel",
        "kno-kp",
        "kp-",
        "shopping-",
        "product-",
        "map-",
        "local-",
        "news-carousel",
        "carousel",
        "video-thumbnail",
        "image-thumbnail",
        "featured-snippet",
        "rich-snippet",
        "answer-box",
        "instant-answer",
    ]
    .map(String::from)
    .to_vec()
}

fn default_heading_markers() -> Vec<String> {
    ["<h3", "<h2", "role=\"heading\""].map(String::from).to_vec()
}

fn default_snippet_markers() -> Vec<String> {
    [
        "data-sncf",
        "vwic3b",
        "s3v9rd",
        "data-content-feature",
        "-webkit-line-clamp",
        "class=\"st\"",
    ]
    .map(String::from)
    .to_vec()
}

fn default_region_markers() -> Vec<String> {
    ["search", "rso", "center_col"].map(String::from).to_vec()
}

fn default_max_results() -> usize {
    10
}

fn default_selector_scan() -> usize {
    15
}

fn default_emergency_scan() -> usize {
    50
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            strategies: default_strategies(),
            exclusion_patterns: default_exclusion_patterns(),
            container_classes: default_container_classes(),
            container_blocklist: default_container_blocklist(),
            heading_markers: default_heading_markers(),
            snippet_markers: default_snippet_markers(),
            region_id_markers: default_region_markers(),
            max_results: default_max_results(),
            per_selector_scan: default_selector_scan(),
            emergency_scan: default_emergency_scan(),
        }
    }
}

/// Configuration for the seven-layer validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Aggregate-confidence threshold for a match.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// Worst-layer threshold for a match.
    #[serde(default = "default_min_layer_threshold")]
    pub min_layer_threshold: f64,
    /// TLD suffixes treated as high-authority.
    #[serde(default = "default_recognized_tlds")]
    pub recognized_tlds: Vec<String>,
}

fn default_confidence_threshold() -> f64 {
    0.85
}

fn default_min_layer_threshold() -> f64 {
    0.70
}

fn default_recognized_tlds() -> Vec<String> {
    [".com", ".org", ".net", ".edu", ".gov", ".io", ".co", ".uk"]
        .map(String::from)
        .to_vec()
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            min_layer_threshold: default_min_layer_threshold(),
            recognized_tlds: default_recognized_tlds(),
        }
    }
}

/// Retry/backoff configuration for whole crawl attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Absolute bound on crawl attempts per keyword.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the second attempt, in seconds.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_seconds: f64,
    /// Backoff multiplier applied per additional attempt.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Cap on any single delay, in seconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_seconds: f64,
    /// Jitter factor in [0, 1); 0 disables jitter.
    #[serde(default)]
    pub jitter_factor: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> f64 {
    2.0
}

fn default_backoff_multiplier() -> f64 {
    1.5
}

fn default_max_delay() -> f64 {
    30.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_seconds: default_initial_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_seconds: default_max_delay(),
            jitter_factor: 0.0,
        }
    }
}

impl RetryConfig {
    /// Calculates the delay scheduled after a given 1-based attempt.
    ///
    /// Without jitter the sequence is monotonically non-decreasing and
    /// capped at `max_delay_seconds`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let base = self.initial_delay_seconds * self.backoff_multiplier.powi(exponent);
        let capped = base.min(self.max_delay_seconds);

        let delayed = if self.jitter_factor > 0.0 {
            let spread = capped * self.jitter_factor;
            let jitter = rand::Rng::gen_range(&mut rand::thread_rng(), -spread..=spread);
            (capped + jitter).max(0.0)
        } else {
            capped
        };

        Duration::from_secs_f64(delayed)
    }
}

/// Top-level configuration for the crawl pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CrawlConfig {
    /// Query issuing and page recognition.
    #[serde(default)]
    pub search: SearchConfig,
    /// Organic-result extraction.
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Seven-layer validation.
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Retry/backoff behavior.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl CrawlConfig {
    /// Creates a configuration with all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retry configuration.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the search configuration.
    #[must_use]
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }
}
