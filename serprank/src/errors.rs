//! Error types for the serprank core.
//!
//! Only accessor-boundary faults are errors. Expected "not found" paths —
//! a domain that fails normalization, a page with no organic candidates,
//! a candidate with low confidence — are values, never `Err`.

use thiserror::Error;

/// The main error type for crawl operations.
///
/// Every variant is recoverable at the retry layer except [`RankError::Cancelled`],
/// which terminates the task immediately.
#[derive(Debug, Clone, Error)]
pub enum RankError {
    /// The results-presence signal never appeared within the bounded wait.
    #[error("navigation timed out: {0}")]
    NavigationTimeout(String),

    /// The page shows a block/challenge interstitial instead of results.
    #[error("blocked or challenged: {0}")]
    BlockedOrChallenged(String),

    /// Pagination was initiated but the next page never became ready.
    #[error("pagination failed: {0}")]
    Pagination(String),

    /// The page-rendering resource could not be acquired for this attempt.
    #[error("resource setup failed: {0}")]
    ResourceSetup(String),

    /// The task was cancelled from outside.
    #[error("cancelled: {0}")]
    Cancelled(String),
}

impl RankError {
    /// Stable snake_case tag recorded on terminal results.
    #[must_use]
    pub fn error_tag(&self) -> &'static str {
        match self {
            Self::NavigationTimeout(_) => "navigation_timeout",
            Self::BlockedOrChallenged(_) => "blocked_or_challenged",
            Self::Pagination(_) => "pagination_failure",
            Self::ResourceSetup(_) => "resource_setup_failure",
            Self::Cancelled(_) => "cancelled",
        }
    }

    /// Whether the retry controller may schedule another attempt after this error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Cancelled(_))
    }
}
