//! Event and result sinks.
//!
//! The orchestrator writes `session.*`, `keyword.*`, `crawl.*`, and
//! `status.*` events through an [`EventSink`]; terminal per-keyword results
//! are handed off through the typed [`ResultSink`]. Collaborators (UI,
//! report writers) only read these streams.

use async_trait::async_trait;
use tracing::{debug, info, Level};

use crate::models::RankResult;

/// Well-known event names.
pub mod names {
    /// A tracking session started.
    pub const SESSION_STARTED: &str = "session.started";
    /// A tracking session produced all of its results.
    pub const SESSION_COMPLETED: &str = "session.completed";
    /// Keyword processing started.
    pub const KEYWORD_STARTED: &str = "keyword.started";
    /// Keyword processing ended with a terminal result.
    pub const KEYWORD_RESULT: &str = "keyword.result";
    /// A crawl attempt started.
    pub const ATTEMPT_STARTED: &str = "attempt.started";
    /// A crawl attempt failed and a retry was scheduled.
    pub const ATTEMPT_RETRY: &str = "attempt.retry";
    /// The crawl state machine entered a new state.
    pub const CRAWL_STATE: &str = "crawl.state";
    /// One results page was scanned.
    pub const CRAWL_PAGE_SCANNED: &str = "crawl.page_scanned";
    /// A validated match was found.
    pub const CRAWL_MATCH_FOUND: &str = "crawl.match_found";
    /// A fresh statistics snapshot is available.
    pub const STATUS_UPDATED: &str = "status.updated";
}

/// Trait for event sinks that can receive events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>);

    /// Tries to emit an event without blocking.
    ///
    /// This method should never raise an exception. Errors are logged
    /// but suppressed.
    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>);
}

/// A no-op event sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {
        // Intentionally empty - discards all events
    }

    fn try_emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {
        // Intentionally empty - discards all events
    }
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    /// The log level to use.
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Creates an info-level logging sink.
    #[must_use]
    pub fn info() -> Self {
        Self::new(Level::INFO)
    }

    fn log_event(&self, event_type: &str, data: &Option<serde_json::Value>) {
        if self.level == Level::DEBUG {
            debug!(
                event_type = %event_type,
                event_data = ?data,
                "Event: {}", event_type
            );
        } else {
            info!(
                event_type = %event_type,
                event_data = ?data,
                "Event: {}", event_type
            );
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.log_event(event_type, &data);
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.log_event(event_type, &data);
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<(String, Option<serde_json::Value>)>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<(String, Option<serde_json::Value>)> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events matching a type prefix.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<(String, Option<serde_json::Value>)> {
        self.events
            .read()
            .iter()
            .filter(|(t, _)| t.starts_with(type_prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((event_type.to_string(), data));
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((event_type.to_string(), data));
    }
}

/// Typed hand-off for terminal per-keyword results.
///
/// Receives exactly one [`RankResult`] per task.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Called once when a task reaches its terminal result.
    async fn on_result(&self, result: &RankResult);
}

/// A result sink that discards results.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpResultSink;

#[async_trait]
impl ResultSink for NoOpResultSink {
    async fn on_result(&self, _result: &RankResult) {}
}

/// A result sink that collects results, for testing and batch callers.
#[derive(Debug, Default)]
pub struct CollectingResultSink {
    results: parking_lot::RwLock<Vec<RankResult>>,
}

impl CollectingResultSink {
    /// Creates a new collecting result sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected results.
    #[must_use]
    pub fn results(&self) -> Vec<RankResult> {
        self.results.read().clone()
    }

    /// Returns the number of collected results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.read().len()
    }

    /// Returns true if no results have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.read().is_empty()
    }
}

#[async_trait]
impl ResultSink for CollectingResultSink {
    async fn on_result(&self, result: &RankResult) {
        self.results.write().push(result.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RankResult, SearchTask};

    #[tokio::test]
    async fn test_noop_sink() {
        let sink = NoOpEventSink;
        sink.emit("test", None).await;
        sink.try_emit("test", Some(serde_json::json!({"x": 1})));
        // Should not panic
    }

    #[tokio::test]
    async fn test_logging_sink() {
        let sink = LoggingEventSink::debug();
        sink.emit("crawl.state", Some(serde_json::json!({"state": "searching"}))).await;
        sink.try_emit("crawl.state", None);
        // Should not panic
    }

    #[tokio::test]
    async fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit("keyword.started", None).await;
        sink.try_emit("status.updated", Some(serde_json::json!({"progress": 0.5})));

        assert_eq!(sink.len(), 2);

        let events = sink.events();
        assert_eq!(events[0].0, "keyword.started");
        assert_eq!(events[1].0, "status.updated");
    }

    #[tokio::test]
    async fn test_collecting_sink_filter() {
        let sink = CollectingEventSink::new();
        sink.emit(names::CRAWL_STATE, None).await;
        sink.emit(names::CRAWL_PAGE_SCANNED, None).await;
        sink.emit(names::KEYWORD_RESULT, None).await;

        assert_eq!(sink.events_of_type("crawl.").len(), 2);
        assert_eq!(sink.events_of_type("keyword.").len(), 1);

        sink.clear();
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_collecting_result_sink() {
        let sink = CollectingResultSink::new();
        let task = SearchTask::new("shoes", "shop.example.com", 3);
        sink.on_result(&RankResult::not_found(&task, 3, None)).await;

        assert_eq!(sink.len(), 1);
        assert!(!sink.results()[0].found);
    }
}
