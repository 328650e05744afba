//! The page crawl state machine.

use serde_json::json;
use tracing::debug;

use crate::accessor::{ElementHandle, PageAccessor};
use crate::cancellation::CancelToken;
use crate::config::CrawlConfig;
use crate::errors::RankError;
use crate::events::{names, EventSink};
use crate::extract::ResultExtractor;
use crate::models::{RankHit, SearchTask};
use crate::validate::Validator;

/// States of one crawl attempt.
///
/// `MatchFound`, `Exhausted`, and `Aborted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    /// Nothing issued yet.
    Idle,
    /// The query was issued; waiting for the results-presence signal.
    Searching,
    /// Scanning the given 1-based results page.
    ScanningPage(u32),
    /// Advancing from the given page to the next one.
    Paginating(u32),
    /// A validated match was found.
    MatchFound,
    /// Every page was scanned without a match.
    Exhausted,
    /// Cancellation was observed.
    Aborted,
}

impl CrawlState {
    /// Stable state name for events and logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Searching => "searching",
            Self::ScanningPage(_) => "scanning_page",
            Self::Paginating(_) => "paginating",
            Self::MatchFound => "match_found",
            Self::Exhausted => "exhausted",
            Self::Aborted => "aborted",
        }
    }

    /// Whether the state ends the attempt.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::MatchFound | Self::Exhausted | Self::Aborted)
    }
}

/// Terminal outcome of one crawl attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlOutcome {
    /// The first validated match, in rank order.
    MatchFound(RankHit),
    /// All pages scanned, nothing matched.
    Exhausted,
    /// Cancellation was observed.
    Aborted,
}

/// Drives one crawl attempt over a single page-rendering resource.
///
/// Cancellation is checked at every state transition and before every
/// blocking wait; the only suspension points are the results-presence wait
/// and the pagination wait, both bounded by configured timeouts.
pub struct CrawlController<'a> {
    config: &'a CrawlConfig,
    extractor: ResultExtractor,
    validator: Validator,
    events: &'a dyn EventSink,
    cancel: &'a CancelToken,
}

impl<'a> CrawlController<'a> {
    /// Creates a controller for one attempt.
    #[must_use]
    pub fn new(config: &'a CrawlConfig, events: &'a dyn EventSink, cancel: &'a CancelToken) -> Self {
        Self {
            config,
            extractor: ResultExtractor::new(config.extraction.clone()),
            validator: Validator::new(config.validation.clone()),
            events,
            cancel,
        }
    }

    /// Runs the attempt to a terminal outcome.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::NavigationTimeout`], [`RankError::BlockedOrChallenged`],
    /// or [`RankError::Pagination`] on accessor-boundary faults; each consumes
    /// one retry at the retry layer. A "not found" crawl is not an error.
    pub async fn run(
        &self,
        page: &mut dyn PageAccessor,
        task: &SearchTask,
    ) -> Result<CrawlOutcome, RankError> {
        if self.cancel.is_cancelled() {
            return Ok(self.abort(task).await);
        }

        self.transition(task, CrawlState::Searching).await;
        page.navigate(&self.config.search.query_url(&task.keyword)).await?;

        if self.cancel.is_cancelled() {
            return Ok(self.abort(task).await);
        }

        let ready = page
            .wait_for_any(
                &self.config.search.results_selectors,
                self.config.search.results_timeout(),
            )
            .await;
        if !ready {
            return Err(self.classify_unready(page));
        }

        for page_number in 1..=task.max_pages {
            if self.cancel.is_cancelled() {
                return Ok(self.abort(task).await);
            }
            self.transition(task, CrawlState::ScanningPage(page_number)).await;

            let candidates = self.extractor.extract(&*page, page_number);
            self.events
                .try_emit(
                    names::CRAWL_PAGE_SCANNED,
                    Some(json!({
                        "keyword": task.keyword,
                        "page": page_number,
                        "candidates": candidates.len(),
                    })),
                );

            for candidate in &candidates {
                if self.cancel.is_cancelled() {
                    return Ok(self.abort(task).await);
                }

                let score = self
                    .validator
                    .validate(candidate, &task.keyword, &task.target_domain);
                debug!(
                    url = %candidate.url,
                    position = candidate.position,
                    confidence = score.confidence,
                    is_match = score.is_match,
                    "candidate validated"
                );

                if score.is_match {
                    self.transition(task, CrawlState::MatchFound).await;
                    self.events
                        .emit(
                            names::CRAWL_MATCH_FOUND,
                            Some(json!({
                                "keyword": task.keyword,
                                "target_domain": task.target_domain,
                                "position": candidate.position,
                                "page": page_number,
                                "url": candidate.url,
                                "confidence": score.confidence,
                            })),
                        )
                        .await;

                    return Ok(CrawlOutcome::MatchFound(RankHit {
                        position: candidate.position,
                        page: page_number,
                        url: candidate.url.clone(),
                        title: candidate.title.clone(),
                        confidence: score.confidence,
                    }));
                }
            }

            if page_number < task.max_pages {
                if self.cancel.is_cancelled() {
                    return Ok(self.abort(task).await);
                }
                self.transition(task, CrawlState::Paginating(page_number)).await;

                let Some(control) = self.next_page_control(&*page) else {
                    self.transition(task, CrawlState::Exhausted).await;
                    return Ok(CrawlOutcome::Exhausted);
                };

                let advanced = page
                    .click_and_wait(control, self.config.search.pagination_timeout())
                    .await;
                if !advanced {
                    // A dead next-page control means the feed ran out of
                    // pages, not that the accessor failed.
                    self.transition(task, CrawlState::Exhausted).await;
                    return Ok(CrawlOutcome::Exhausted);
                }

                let ready = page
                    .wait_for_any(
                        &self.config.search.results_selectors,
                        self.config.search.pagination_timeout(),
                    )
                    .await;
                if !ready {
                    return Err(RankError::Pagination(format!(
                        "results never reappeared after leaving page {page_number}"
                    )));
                }
            }
        }

        self.transition(task, CrawlState::Exhausted).await;
        Ok(CrawlOutcome::Exhausted)
    }

    /// The first live next-page control, most specific selector first.
    fn next_page_control(&self, page: &dyn PageAccessor) -> Option<ElementHandle> {
        self.config
            .search
            .next_page_selectors
            .iter()
            .find_map(|selector| page.query_all(selector).into_iter().next())
    }

    /// Classifies a missing results-presence signal as a block/challenge
    /// or a plain timeout.
    fn classify_unready(&self, page: &dyn PageAccessor) -> RankError {
        for marker in &self.config.search.challenge_markers {
            if page.page_source_contains(marker) {
                return RankError::BlockedOrChallenged(format!("page source contains '{marker}'"));
            }
        }
        RankError::NavigationTimeout(format!(
            "no results within {:.0}s",
            self.config.search.results_timeout_seconds
        ))
    }

    async fn abort(&self, task: &SearchTask) -> CrawlOutcome {
        self.transition(task, CrawlState::Aborted).await;
        CrawlOutcome::Aborted
    }

    async fn transition(&self, task: &SearchTask, state: CrawlState) {
        self.events
            .emit(
                names::CRAWL_STATE,
                Some(json!({
                    "keyword": task.keyword,
                    "state": state.name(),
                    "terminal": state.is_terminal(),
                })),
            )
            .await;
    }
}

#[cfg(test)]
mod state_tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(CrawlState::MatchFound.is_terminal());
        assert!(CrawlState::Exhausted.is_terminal());
        assert!(CrawlState::Aborted.is_terminal());
        assert!(!CrawlState::Idle.is_terminal());
        assert!(!CrawlState::Searching.is_terminal());
        assert!(!CrawlState::ScanningPage(2).is_terminal());
        assert!(!CrawlState::Paginating(1).is_terminal());
    }

    #[test]
    fn test_state_names() {
        assert_eq!(CrawlState::Searching.name(), "searching");
        assert_eq!(CrawlState::ScanningPage(3).name(), "scanning_page");
    }
}

#[cfg(all(test, feature = "fixtures"))]
mod tests {
    use super::*;
    use crate::events::CollectingEventSink;
    use crate::testing::{SerpPage, StaticPage};
    use pretty_assertions::assert_eq;

    fn task(max_pages: u32) -> SearchTask {
        SearchTask::new("shoes", "shop.example.com", max_pages)
    }

    fn filler(n: usize) -> SerpPage {
        let mut page = SerpPage::new();
        for i in 0..n {
            page = page.organic(
                format!("https://filler{i}.example.org/page"),
                format!("Unrelated Filler Result {i}"),
                "A snippet that does not mention the target",
            );
        }
        page
    }

    #[tokio::test]
    async fn test_match_found_at_rank_four() {
        let html = filler(3)
            .organic(
                "https://www.shop.example.com/sale",
                "Summer Shoes Sale | Shop Example Store",
                "Discounted running shoes from the official store",
            )
            .build();
        let mut page = StaticPage::single(html);
        let events = CollectingEventSink::new();
        let cancel = CancelToken::new();
        let config = CrawlConfig::default();
        let controller = CrawlController::new(&config, &events, &cancel);

        let outcome = controller.run(&mut page, &task(3)).await.unwrap();

        let CrawlOutcome::MatchFound(hit) = outcome else {
            panic!("expected a match, got {outcome:?}");
        };
        assert_eq!(hit.position, 4);
        assert_eq!(hit.page, 1);
        assert_eq!(hit.url, "https://www.shop.example.com/sale");
        assert!(hit.confidence >= 0.85);
        assert_eq!(events.events_of_type(names::CRAWL_MATCH_FOUND).len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_across_pages() {
        let pages = vec![
            filler(10).with_next_page().build(),
            filler(10).with_next_page().build(),
            filler(10).build(),
        ];
        let mut page = StaticPage::new(pages);
        let events = CollectingEventSink::new();
        let cancel = CancelToken::new();
        let config = CrawlConfig::default();
        let controller = CrawlController::new(&config, &events, &cancel);

        let outcome = controller.run(&mut page, &task(3)).await.unwrap();

        assert_eq!(outcome, CrawlOutcome::Exhausted);
        assert_eq!(events.events_of_type(names::CRAWL_PAGE_SCANNED).len(), 3);
    }

    #[tokio::test]
    async fn test_match_on_second_page_uses_position_formula() {
        let pages = vec![
            filler(10).with_next_page().build(),
            filler(3)
                .organic(
                    "https://shop.example.com/",
                    "Shop Example | Shoes And More",
                    "The official shop example storefront",
                )
                .build(),
        ];
        let mut page = StaticPage::new(pages);
        let events = CollectingEventSink::new();
        let cancel = CancelToken::new();
        let config = CrawlConfig::default();
        let controller = CrawlController::new(&config, &events, &cancel);

        let outcome = controller.run(&mut page, &task(3)).await.unwrap();

        let CrawlOutcome::MatchFound(hit) = outcome else {
            panic!("expected a match, got {outcome:?}");
        };
        assert_eq!(hit.page, 2);
        assert_eq!(hit.position, 14);
    }

    #[tokio::test]
    async fn test_missing_next_page_control_exhausts_early() {
        // Two pages requested, but page one carries no pagination control.
        let mut page = StaticPage::single(filler(2).build());
        let events = CollectingEventSink::new();
        let cancel = CancelToken::new();
        let config = CrawlConfig::default();
        let controller = CrawlController::new(&config, &events, &cancel);

        let outcome = controller.run(&mut page, &task(2)).await.unwrap();

        assert_eq!(outcome, CrawlOutcome::Exhausted);
        assert_eq!(events.events_of_type(names::CRAWL_PAGE_SCANNED).len(), 1);
    }

    #[tokio::test]
    async fn test_challenge_page_is_classified_as_blocked() {
        let mut page = StaticPage::single(SerpPage::challenge_page());
        let events = CollectingEventSink::new();
        let cancel = CancelToken::new();
        let config = CrawlConfig::default();
        let controller = CrawlController::new(&config, &events, &cancel);

        let err = controller.run(&mut page, &task(1)).await.unwrap_err();

        assert!(matches!(err, RankError::BlockedOrChallenged(_)));
    }

    #[tokio::test]
    async fn test_empty_shell_times_out() {
        let mut page = StaticPage::single(SerpPage::empty_shell());
        let events = CollectingEventSink::new();
        let cancel = CancelToken::new();
        let config = CrawlConfig::default();
        let controller = CrawlController::new(&config, &events, &cancel);

        let err = controller.run(&mut page, &task(1)).await.unwrap_err();

        assert!(matches!(err, RankError::NavigationTimeout(_)));
    }

    #[tokio::test]
    async fn test_cancellation_before_start_skips_accessor() {
        let mut page = StaticPage::single(filler(1).build());
        let events = CollectingEventSink::new();
        let cancel = CancelToken::new();
        cancel.cancel("shutdown");
        let config = CrawlConfig::default();
        let controller = CrawlController::new(&config, &events, &cancel);

        let outcome = controller.run(&mut page, &task(1)).await.unwrap();

        assert_eq!(outcome, CrawlOutcome::Aborted);
        assert_eq!(page.navigations(), 0);
    }
}
