//! The tracking-session orchestrator.
//!
//! Runs tasks one at a time over pages acquired from the injected
//! provider, owns the statistics aggregator, and writes the event, status,
//! and result streams that collaborators read. The core persists nothing;
//! terminal results are handed off keyed by `(keyword, target_domain)`.

use dashmap::DashMap;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::accessor::PageProvider;
use crate::cancellation::CancelToken;
use crate::config::CrawlConfig;
use crate::crawl::RetryController;
use crate::events::{names, EventSink, NoOpEventSink, NoOpResultSink, ResultSink};
use crate::models::{RankResult, SearchTask};
use crate::stats::{StatsAggregator, StatsSnapshot};

/// One rank-tracking session over a batch of keywords.
pub struct Session {
    id: Uuid,
    config: CrawlConfig,
    events: Arc<dyn EventSink>,
    result_sink: Arc<dyn ResultSink>,
    stats: Arc<StatsAggregator>,
    cancel: Arc<CancelToken>,
    results: DashMap<(String, String), RankResult>,
}

impl Session {
    /// Creates a session with no-op sinks.
    #[must_use]
    pub fn new(config: CrawlConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            events: Arc::new(NoOpEventSink),
            result_sink: Arc::new(NoOpResultSink),
            stats: Arc::new(StatsAggregator::new()),
            cancel: Arc::new(CancelToken::new()),
            results: DashMap::new(),
        }
    }

    /// Sets the event sink collaborators read.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Sets the terminal-result sink.
    #[must_use]
    pub fn with_result_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.result_sink = sink;
        self
    }

    /// The session identifier attached to emitted events.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The cancellation token; cancelling it aborts the running crawl and
    /// resolves the remaining tasks as cancelled.
    #[must_use]
    pub fn cancel_token(&self) -> Arc<CancelToken> {
        Arc::clone(&self.cancel)
    }

    /// A statistics snapshot for pollers.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// The terminal result handed off for a task key, if produced yet.
    #[must_use]
    pub fn result_for(&self, keyword: &str, target_domain: &str) -> Option<RankResult> {
        self.results
            .get(&(keyword.to_string(), target_domain.to_string()))
            .map(|entry| entry.value().clone())
    }

    /// Processes every task to a terminal result, in order.
    ///
    /// Exactly one [`RankResult`] is produced per task - found, not-found,
    /// or not-found-with-error-tag - even under cancellation.
    pub async fn run(&self, provider: &dyn PageProvider, tasks: &[SearchTask]) -> Vec<RankResult> {
        self.stats.start_session(tasks.len());
        self.events
            .emit(
                names::SESSION_STARTED,
                Some(json!({
                    "session_id": self.id.to_string(),
                    "total": tasks.len(),
                    "started_at": chrono::Utc::now().to_rfc3339(),
                })),
            )
            .await;

        let mut results = Vec::with_capacity(tasks.len());
        for task in tasks {
            let result = self.run_task(provider, task).await;

            self.events
                .emit(names::KEYWORD_RESULT, Some(json!(result)))
                .await;
            self.result_sink.on_result(&result).await;
            self.results.insert(task.key(), result.clone());
            self.emit_status();

            results.push(result);
        }

        self.events
            .emit(
                names::SESSION_COMPLETED,
                Some(json!({
                    "session_id": self.id.to_string(),
                    "processed": results.len(),
                })),
            )
            .await;

        results
    }

    async fn run_task(&self, provider: &dyn PageProvider, task: &SearchTask) -> RankResult {
        if self.cancel.is_cancelled() {
            return RankResult::not_found(task, 0, Some("cancelled".to_string()));
        }

        self.events
            .emit(
                names::KEYWORD_STARTED,
                Some(json!({
                    "session_id": self.id.to_string(),
                    "keyword": task.keyword,
                    "target_domain": task.target_domain,
                    "max_pages": task.max_pages,
                })),
            )
            .await;

        let started = Instant::now();
        let retry = RetryController::new(
            &self.config,
            provider,
            self.events.as_ref(),
            &self.stats,
            &self.cancel,
        );
        let result = retry.run(task).await;
        self.stats
            .record_result(result.found, result.confidence, started.elapsed());

        info!(
            keyword = %task.keyword,
            found = result.found,
            position = result.position,
            attempts = result.attempts,
            "keyword processed"
        );

        result
    }

    fn emit_status(&self) {
        let snapshot = self.stats.snapshot();
        self.events.try_emit(
            names::STATUS_UPDATED,
            Some(json!({
                "session_id": self.id.to_string(),
                "stats": snapshot,
            })),
        );
    }
}

#[cfg(all(test, feature = "fixtures"))]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::events::{CollectingEventSink, CollectingResultSink};
    use crate::testing::{FixturePageProvider, SerpPage};
    use pretty_assertions::assert_eq;

    fn fast_config() -> CrawlConfig {
        CrawlConfig::default().with_retry(RetryConfig {
            max_attempts: 3,
            initial_delay_seconds: 0.0,
            backoff_multiplier: 1.0,
            max_delay_seconds: 0.0,
            jitter_factor: 0.0,
        })
    }

    fn serp_with_target() -> String {
        SerpPage::new()
            .organic(
                "https://unrelated.example.org/a",
                "Unrelated Leading Result",
                "A snippet about something else",
            )
            .organic(
                "https://www.shop.example.com/sale",
                "Summer Shoes Sale | Shop Example Store",
                "Official shop example storefront",
            )
            .build()
    }

    #[tokio::test]
    async fn test_one_result_per_task_with_handoff() {
        let session = Session::new(fast_config());
        let provider = FixturePageProvider::single(serp_with_target());
        let tasks = vec![
            SearchTask::new("shoes", "shop.example.com", 1),
            SearchTask::new("boots", "missing.example.net", 1),
        ];

        let results = session.run(&provider, &tasks).await;

        assert_eq!(results.len(), 2);
        assert!(results[0].found);
        assert_eq!(results[0].position, 2);
        assert!(!results[1].found);

        let handed_off = session.result_for("shoes", "shop.example.com").unwrap();
        assert_eq!(handed_off, results[0]);
        assert!(session.result_for("boots", "nowhere.example").is_none());
    }

    #[tokio::test]
    async fn test_event_ordering_and_result_sink() {
        let events = Arc::new(CollectingEventSink::new());
        let sink = Arc::new(CollectingResultSink::new());
        let session = Session::new(fast_config())
            .with_event_sink(Arc::clone(&events) as Arc<dyn EventSink>)
            .with_result_sink(Arc::clone(&sink) as Arc<dyn ResultSink>);
        let provider = FixturePageProvider::single(serp_with_target());
        let tasks = vec![SearchTask::new("shoes", "shop.example.com", 1)];

        session.run(&provider, &tasks).await;

        let all = events.events();
        let started = all
            .iter()
            .position(|(name, _)| name == names::KEYWORD_STARTED)
            .unwrap();
        let resulted = all
            .iter()
            .position(|(name, _)| name == names::KEYWORD_RESULT)
            .unwrap();
        assert!(started < resulted);
        assert_eq!(all.first().map(|(name, _)| name.as_str()), Some(names::SESSION_STARTED));
        assert_eq!(all.last().map(|(name, _)| name.as_str()), Some(names::SESSION_COMPLETED));
        assert!(!events.events_of_type(names::STATUS_UPDATED).is_empty());

        assert_eq!(sink.len(), 1);
        assert!(sink.results()[0].found);
    }

    #[tokio::test]
    async fn test_stats_reflect_session() {
        let session = Session::new(fast_config());
        let provider = FixturePageProvider::single(serp_with_target());
        let tasks = vec![
            SearchTask::new("shoes", "shop.example.com", 1),
            SearchTask::new("boots", "missing.example.net", 1),
        ];

        session.run(&provider, &tasks).await;

        let stats = session.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.matched, 1);
        assert_eq!(stats.unmatched, 1);
        assert!((stats.accuracy - 0.5).abs() < 1e-9);
        assert!((stats.progress - 1.0).abs() < 1e-9);
        assert!(stats.avg_confidence >= 0.85);
    }

    #[tokio::test]
    async fn test_cancelled_session_still_resolves_every_task() {
        let session = Session::new(fast_config());
        session.cancel_token().cancel("operator stop");
        let provider = FixturePageProvider::single(serp_with_target());
        let tasks = vec![
            SearchTask::new("shoes", "shop.example.com", 1),
            SearchTask::new("boots", "missing.example.net", 1),
        ];

        let results = session.run(&provider, &tasks).await;

        assert_eq!(results.len(), 2);
        for result in &results {
            assert!(!result.found);
            assert_eq!(result.error.as_deref(), Some("cancelled"));
        }
        // No page was ever acquired.
        assert_eq!(provider.acquisitions(), 0);
    }
}
