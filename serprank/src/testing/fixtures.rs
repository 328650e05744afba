//! Synthetic results-page fixtures.

/// Builds one synthetic results page in the markup shape the default
/// extraction strategies target.
///
/// Blocks are emitted in insertion order inside a main results region, so
/// rank-order assertions hold.
#[derive(Debug, Clone, Default)]
pub struct SerpPage {
    blocks: Vec<String>,
    next_page: bool,
}

impl SerpPage {
    /// Creates an empty results page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a genuine organic result block.
    #[must_use]
    pub fn organic(
        mut self,
        url: impl Into<String>,
        title: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        let url = url.into();
        let title = title.into();
        let snippet = snippet.into();
        self.blocks.push(format!(
            r#"<div class="g"><div class="yuRUbf"><a href="{url}"><h3>{title}</h3></a></div><div class="VwiC3b">{snippet}</div></div>"#
        ));
        self
    }

    /// Appends an advertisement block that must never count as organic.
    #[must_use]
    pub fn ad(mut self, url: impl Into<String>, title: impl Into<String>) -> Self {
        let url = url.into();
        let title = title.into();
        self.blocks.push(format!(
            r#"<div class="g"><span class="label">Sponsored</span><div class="yuRUbf"><a href="{url}"><h3>{title}</h3></a></div><div class="VwiC3b">Ad copy</div></div>"#
        ));
        self
    }

    /// Appends a knowledge-panel block that must never count as organic.
    #[must_use]
    pub fn knowledge_panel(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.blocks.push(format!(
            r#"<div class="g kp-header"><div class="yuRUbf"><a href="https://panel.example.net/entity"><h3>{title}</h3></a></div><div class="VwiC3b">Panel facts</div></div>"#
        ));
        self
    }

    /// Adds a live next-page control.
    #[must_use]
    pub fn with_next_page(mut self) -> Self {
        self.next_page = true;
        self
    }

    /// Serializes the page.
    #[must_use]
    pub fn build(self) -> String {
        let blocks = self.blocks.join("\n");
        let next = if self.next_page {
            r#"<a id="pnnext" href="/search?q=next&amp;start=10">Next</a>"#
        } else {
            ""
        };
        format!(
            r#"<html><body><div id="search"><div id="rso">{blocks}</div>{next}</div></body></html>"#
        )
    }

    /// A block/challenge interstitial with no results on it.
    #[must_use]
    pub fn challenge_page() -> String {
        r#"<html><body><div class="challenge"><form class="g-recaptcha">Our systems have detected unusual traffic. Please complete the reCAPTCHA below.</form></div></body></html>"#
            .to_string()
    }

    /// A loaded shell with neither results nor a challenge on it.
    #[must_use]
    pub fn empty_shell() -> String {
        r#"<html><body><div id="main"><p>Loading results…</p></div></body></html>"#.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_preserves_insertion_order() {
        let html = SerpPage::new()
            .organic("https://a.example.com/", "Alpha", "First snippet")
            .organic("https://b.example.com/", "Beta", "Second snippet")
            .build();

        let alpha = html.find("https://a.example.com/").unwrap();
        let beta = html.find("https://b.example.com/").unwrap();
        assert!(alpha < beta);
        assert!(html.contains(r#"<div id="rso">"#));
    }

    #[test]
    fn test_next_page_control_only_when_requested() {
        assert!(!SerpPage::new().build().contains("pnnext"));
        assert!(SerpPage::new().with_next_page().build().contains("pnnext"));
    }

    #[test]
    fn test_special_pages() {
        assert!(SerpPage::challenge_page().to_lowercase().contains("recaptcha"));
        assert!(!SerpPage::empty_shell().to_lowercase().contains("recaptcha"));
    }
}
