//! Session-wide statistics.
//!
//! Single-writer/multiple-reader: only the crawl-owning context mutates the
//! aggregator; observers read plain cloned snapshots. Every derived rate
//! defaults to zero when no samples exist.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// How many recent per-keyword durations feed throughput and ETA.
const DURATION_WINDOW: usize = 10;

#[derive(Debug)]
struct StatsInner {
    total: usize,
    processed: usize,
    matched: usize,
    unmatched: usize,
    errors: usize,
    retries: usize,
    durations: VecDeque<Duration>,
    confidence_sum: f64,
    started_at: Option<Instant>,
}

impl StatsInner {
    fn new() -> Self {
        Self {
            total: 0,
            processed: 0,
            matched: 0,
            unmatched: 0,
            errors: 0,
            retries: 0,
            durations: VecDeque::with_capacity(DURATION_WINDOW),
            confidence_sum: 0.0,
            started_at: None,
        }
    }

    fn mean_duration_seconds(&self) -> f64 {
        if self.durations.is_empty() {
            return 0.0;
        }
        self.durations.iter().map(Duration::as_secs_f64).sum::<f64>() / self.durations.len() as f64
    }
}

/// Owned aggregator for one tracking session.
#[derive(Debug)]
pub struct StatsAggregator {
    inner: RwLock<StatsInner>,
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsAggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StatsInner::new()),
        }
    }

    /// Resets all counters and schedules `total` keywords.
    pub fn start_session(&self, total: usize) {
        let mut inner = self.inner.write();
        *inner = StatsInner::new();
        inner.total = total;
        inner.started_at = Some(Instant::now());
    }

    /// Records one terminal keyword result and its elapsed duration.
    pub fn record_result(&self, found: bool, confidence: f64, elapsed: Duration) {
        let mut inner = self.inner.write();
        inner.processed += 1;
        if found {
            inner.matched += 1;
            inner.confidence_sum += confidence;
        } else {
            inner.unmatched += 1;
        }
        if inner.durations.len() == DURATION_WINDOW {
            inner.durations.pop_front();
        }
        inner.durations.push_back(elapsed);
    }

    /// Records one accessor-boundary fault.
    pub fn record_error(&self) {
        self.inner.write().errors += 1;
    }

    /// Records one additionally scheduled crawl attempt.
    pub fn record_retry(&self) {
        self.inner.write().retries += 1;
    }

    /// A consistent snapshot with derived rates.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.read();

        let accuracy = inner.matched as f64 / 1.0f64.max(inner.processed as f64);
        let progress = if inner.total == 0 {
            0.0
        } else {
            inner.processed as f64 / inner.total as f64
        };
        let avg_confidence = if inner.matched == 0 {
            0.0
        } else {
            inner.confidence_sum / inner.matched as f64
        };

        let mean_seconds = inner.mean_duration_seconds();
        let throughput_per_minute = if mean_seconds > 0.0 { 60.0 / mean_seconds } else { 0.0 };
        let remaining = inner.total.saturating_sub(inner.processed);
        let eta_seconds = remaining as f64 * mean_seconds;

        let elapsed_seconds = inner
            .started_at
            .map_or(0.0, |start| start.elapsed().as_secs_f64());

        StatsSnapshot {
            total: inner.total,
            processed: inner.processed,
            matched: inner.matched,
            unmatched: inner.unmatched,
            errors: inner.errors,
            retries: inner.retries,
            accuracy,
            progress,
            avg_confidence,
            throughput_per_minute,
            eta_seconds,
            elapsed_seconds,
        }
    }
}

/// An immutable view of the session counters and derived rates.
///
/// Ratios are fractions in [0,1]; presentation layers multiply by 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Keywords scheduled for the session.
    pub total: usize,
    /// Keywords with a terminal result.
    pub processed: usize,
    /// Keywords whose target was found.
    pub matched: usize,
    /// Keywords whose target was not found.
    pub unmatched: usize,
    /// Accessor-boundary faults observed.
    pub errors: usize,
    /// Additionally scheduled crawl attempts.
    pub retries: usize,
    /// `matched / max(1, processed)`.
    pub accuracy: f64,
    /// `processed / total`, 0 when nothing is scheduled.
    pub progress: f64,
    /// Mean confidence across found results, 0 without samples.
    pub avg_confidence: f64,
    /// Keywords per minute over the recent-duration window, 0 without samples.
    pub throughput_per_minute: f64,
    /// `remaining * mean(window)` in seconds, 0 without samples.
    pub eta_seconds: f64,
    /// Seconds since the session started, 0 before any session.
    pub elapsed_seconds: f64,
}
