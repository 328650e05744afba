//! Crawl orchestration.
//!
//! This module provides:
//! - The page crawl state machine (search, scan, paginate)
//! - The bounded retry/backoff wrapper around whole crawl attempts

mod controller;
mod retry;

pub use controller::{CrawlController, CrawlOutcome, CrawlState};
pub use retry::RetryController;
