//! # Serprank
//!
//! A detection/validation/orchestration core for organic search rank
//! tracking.
//!
//! Serprank answers one question per keyword: does a target domain appear
//! among the organic results of a paginated search feed, and if so at what
//! rank. It consumes an abstract page accessor and emits results, events,
//! and statistics:
//!
//! - **Domain normalization and matching**: canonical hosts, tiered fuzzy
//!   comparison with subdomain and near-duplicate tolerances
//! - **Strategy-based extraction**: ordered selector strategies separating
//!   organic results from ads, panels, and UI clutter
//! - **Seven-layer validation**: independent confidence layers with a dual
//!   aggregate/worst-layer threshold
//! - **Crawl orchestration**: a cancellation-aware state machine wrapped in
//!   bounded retry/backoff
//! - **Session statistics**: zero-safe derived rates for pollers
//!
//! Rendering, anti-detection, report writing, and browser lifecycle are
//! external collaborators behind the [`accessor::PageAccessor`] and
//! [`accessor::PageProvider`] traits.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use serprank::prelude::*;
//!
//! let session = Session::new(CrawlConfig::default());
//! let tasks = vec![SearchTask::new("running shoes", "shop.example.com", 3)];
//!
//! // `provider` is the browser-automation collaborator.
//! let results = session.run(&provider, &tasks).await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::cast_precision_loss
)]

pub mod accessor;
pub mod cancellation;
pub mod config;
pub mod crawl;
pub mod domain;
pub mod errors;
pub mod events;
pub mod extract;
pub mod models;
pub mod session;
pub mod stats;
pub mod validate;

#[cfg(feature = "fixtures")]
pub mod testing;


/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::accessor::{ElementFacts, ElementHandle, PageAccessor, PageProvider};
    pub use crate::cancellation::CancelToken;
    pub use crate::config::{
        CrawlConfig, ExtractionConfig, RetryConfig, SearchConfig, StrategySpec, ValidationConfig,
    };
    pub use crate::crawl::{CrawlController, CrawlOutcome, CrawlState, RetryController};
    pub use crate::domain::{host_of, match_domains, normalize};
    pub use crate::errors::RankError;
    pub use crate::events::{
        CollectingEventSink, CollectingResultSink, EventSink, LoggingEventSink, NoOpEventSink,
        NoOpResultSink, ResultSink,
    };
    pub use crate::extract::ResultExtractor;
    pub use crate::models::{
        Candidate, ContainerContext, MatchScore, RankHit, RankResult, SearchTask, Traceability,
    };
    pub use crate::session::Session;
    pub use crate::stats::{StatsAggregator, StatsSnapshot};
    pub use crate::validate::Validator;
}

#[cfg(test)]
mod tests {
    #[test]
    fn library_compiles() {
        assert!(true);
    }
}
