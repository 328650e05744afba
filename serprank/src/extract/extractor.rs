//! Ordered-strategy extraction of organic candidates.

use std::collections::HashSet;
use tracing::debug;

use crate::accessor::{ElementHandle, PageAccessor};
use crate::config::{ExtractionConfig, StrategySpec};
use crate::models::{Candidate, ContainerContext, Traceability};

use super::filters::{scan_container, UrlFilter};

/// Extracts ordered, deduplicated organic candidates from a rendered page.
///
/// Strategies are tried most specific first with first-success-wins
/// semantics; a bounded emergency pass over raw anchors runs only when
/// every strategy fails. Extraction never fails - per-element problems are
/// skipped and an empty list is a valid outcome.
#[derive(Debug, Clone)]
pub struct ResultExtractor {
    config: ExtractionConfig,
}

impl ResultExtractor {
    /// Creates an extractor over the given configuration.
    #[must_use]
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// The extraction configuration.
    #[must_use]
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extracts up to the configured maximum of organic candidates, in
    /// rank order, deduplicated by URL with first occurrence winning.
    #[must_use]
    pub fn extract(&self, page: &dyn PageAccessor, page_number: u32) -> Vec<Candidate> {
        let filter = UrlFilter::new(&self.config);

        for strategy in &self.config.strategies {
            let candidates = self.run_strategy(page, strategy, page_number, filter);
            if !candidates.is_empty() {
                debug!(
                    strategy = %strategy.name,
                    count = candidates.len(),
                    page = page_number,
                    "extraction strategy succeeded"
                );
                return candidates;
            }
        }

        debug!(page = page_number, "all strategies empty, running emergency pass");
        self.emergency_pass(page, page_number, filter)
    }

    fn run_strategy(
        &self,
        page: &dyn PageAccessor,
        strategy: &StrategySpec,
        page_number: u32,
        filter: UrlFilter<'_>,
    ) -> Vec<Candidate> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut accepted: Vec<Candidate> = Vec::new();

        for selector in &strategy.selectors {
            for handle in page
                .query_all(selector)
                .into_iter()
                .take(self.config.per_selector_scan)
            {
                if accepted.len() >= self.config.max_results {
                    return accepted;
                }

                let href = page.attribute(handle, "href");
                if !filter.accepts(&href) || seen.contains(&href) {
                    continue;
                }

                let context = self.inspect_container(page, handle);
                if !context.is_organic() {
                    continue;
                }

                let title = self.title_for(page, handle);
                seen.insert(href.clone());
                accepted.push(Candidate {
                    url: href,
                    title,
                    position: Candidate::position_for(page_number, accepted.len()),
                    page: page_number,
                    context,
                });
            }

            if accepted.len() >= self.config.max_results {
                break;
            }
        }

        accepted
    }

    /// One bounded pass over the page's first anchors, URL filter only.
    ///
    /// Container checks are skipped - candidates are never rejected on
    /// container grounds here - but whatever context facts still resolve
    /// are recorded so validation stays meaningful.
    fn emergency_pass(
        &self,
        page: &dyn PageAccessor,
        page_number: u32,
        filter: UrlFilter<'_>,
    ) -> Vec<Candidate> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut accepted: Vec<Candidate> = Vec::new();

        for handle in page
            .query_all("a[href]")
            .into_iter()
            .take(self.config.emergency_scan)
        {
            if accepted.len() >= self.config.max_results {
                break;
            }

            let href = page.attribute(handle, "href");
            if !filter.accepts(&href) || seen.contains(&href) {
                continue;
            }

            let title = self.title_for(page, handle);
            seen.insert(href.clone());
            accepted.push(Candidate {
                url: href,
                title,
                position: Candidate::position_for(page_number, accepted.len()),
                page: page_number,
                context: self.inspect_container(page, handle),
            });
        }

        accepted
    }

    /// Resolves the candidate's result container and records its facts.
    fn inspect_container(&self, page: &dyn PageAccessor, handle: ElementHandle) -> ContainerContext {
        let container = page.nearest_ancestor_matching(handle, &|facts| {
            facts.has_any_class(&self.config.container_classes)
        });

        let Some(container) = container else {
            return ContainerContext::unverified();
        };

        let markup = page.container_markup(container).to_lowercase();
        let scan = scan_container(&markup, &self.config);

        let traceability = if page
            .nearest_ancestor_matching(handle, &|facts| {
                facts.id_contains_any(&self.config.region_id_markers)
            })
            .is_some()
        {
            Traceability::Confirmed
        } else {
            Traceability::Inconclusive
        };

        ContainerContext {
            markers_absent: scan.markers_absent,
            has_heading: scan.has_heading,
            has_snippet: scan.has_snippet,
            traceability,
        }
    }

    /// Best-effort title: the anchor's own text, then the first meaningful
    /// line of its container.
    fn title_for(&self, page: &dyn PageAccessor, handle: ElementHandle) -> String {
        let own = page.text(handle);
        let own = own.trim();
        if own.len() > 3 {
            return first_line(own);
        }

        let container = page.nearest_ancestor_matching(handle, &|facts| {
            facts.has_any_class(&self.config.container_classes)
        });
        if let Some(container) = container {
            let text = page.text(container);
            for line in text.lines() {
                let line = line.trim();
                if line.len() > 3 {
                    return line.to_string();
                }
            }
        }

        String::new()
    }
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
        .to_string()
}
