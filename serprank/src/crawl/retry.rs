//! Bounded retry/backoff around whole crawl attempts.

use serde_json::json;
use std::time::Duration;
use tracing::warn;

use crate::accessor::PageProvider;
use crate::cancellation::CancelToken;
use crate::config::CrawlConfig;
use crate::errors::RankError;
use crate::events::{names, EventSink};
use crate::models::{RankResult, SearchTask};
use crate::stats::StatsAggregator;

use super::controller::{CrawlController, CrawlOutcome};

/// Granularity at which a backoff delay polls for cancellation.
const DELAY_POLL: Duration = Duration::from_millis(50);

/// Wraps one task in a bounded number of full crawl attempts.
///
/// Every attempt starts fresh from `Searching` on a newly acquired page;
/// attempts are never resumed mid-page. The attempt bound is an absolute
/// liveness guarantee, and exactly one [`RankResult`] is produced per task.
pub struct RetryController<'a> {
    config: &'a CrawlConfig,
    provider: &'a dyn PageProvider,
    events: &'a dyn EventSink,
    stats: &'a StatsAggregator,
    cancel: &'a CancelToken,
}

impl<'a> RetryController<'a> {
    /// Creates a retry controller for one task.
    #[must_use]
    pub fn new(
        config: &'a CrawlConfig,
        provider: &'a dyn PageProvider,
        events: &'a dyn EventSink,
        stats: &'a StatsAggregator,
        cancel: &'a CancelToken,
    ) -> Self {
        Self {
            config,
            provider,
            events,
            stats,
            cancel,
        }
    }

    /// Runs attempts until a match, cancellation, or attempt exhaustion.
    pub async fn run(&self, task: &SearchTask) -> RankResult {
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut last_error: Option<RankError> = None;

        for attempt in 1..=max_attempts {
            if self.cancel.is_cancelled() {
                return RankResult::not_found(task, attempt - 1, Some("cancelled".to_string()));
            }

            self.events
                .try_emit(
                    names::ATTEMPT_STARTED,
                    Some(json!({
                        "keyword": task.keyword,
                        "attempt": attempt,
                        "max_attempts": max_attempts,
                    })),
                );

            match self.run_attempt(task).await {
                Ok(CrawlOutcome::MatchFound(hit)) => {
                    return RankResult::found(task, &hit, attempt);
                }
                Ok(CrawlOutcome::Aborted) => {
                    return RankResult::not_found(task, attempt, Some("cancelled".to_string()));
                }
                Ok(CrawlOutcome::Exhausted) => {
                    // A clean not-found crawl still gets retried; a later
                    // attempt may land on a less degraded results page.
                    last_error = None;
                }
                Err(err) => {
                    if !err.is_retryable() {
                        return RankResult::not_found(
                            task,
                            attempt,
                            Some(err.error_tag().to_string()),
                        );
                    }
                    warn!(
                        keyword = %task.keyword,
                        attempt,
                        error = %err,
                        "crawl attempt failed"
                    );
                    self.stats.record_error();
                    last_error = Some(err);
                }
            }

            if attempt < max_attempts {
                self.stats.record_retry();
                let delay = self.config.retry.delay_for_attempt(attempt);
                self.events
                    .try_emit(
                        names::ATTEMPT_RETRY,
                        Some(json!({
                            "keyword": task.keyword,
                            "attempt": attempt,
                            "delay_seconds": delay.as_secs_f64(),
                        })),
                    );
                if !self.sleep_unless_cancelled(delay).await {
                    return RankResult::not_found(task, attempt, Some("cancelled".to_string()));
                }
            }
        }

        RankResult::not_found(
            task,
            max_attempts,
            last_error.map(|err| err.error_tag().to_string()),
        )
    }

    async fn run_attempt(&self, task: &SearchTask) -> Result<CrawlOutcome, RankError> {
        let mut page = self.provider.acquire().await?;
        let controller = CrawlController::new(self.config, self.events, self.cancel);
        controller.run(page.as_mut(), task).await
    }

    /// Sleeps for the backoff delay, waking early on cancellation.
    ///
    /// Returns `false` when cancellation cut the delay short.
    async fn sleep_unless_cancelled(&self, delay: Duration) -> bool {
        let mut remaining = delay;
        while remaining > Duration::ZERO {
            if self.cancel.is_cancelled() {
                return false;
            }
            let step = remaining.min(DELAY_POLL);
            tokio::time::sleep(step).await;
            remaining = remaining.saturating_sub(step);
        }
        !self.cancel.is_cancelled()
    }
}
