//! Data models for rank detection.

use serde::{Deserialize, Serialize};

/// One keyword-versus-domain lookup, immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SearchTask {
    /// The search query to issue.
    pub keyword: String,
    /// The domain whose ranking is being checked.
    pub target_domain: String,
    /// How many result pages to scan before giving up.
    pub max_pages: u32,
}

impl SearchTask {
    /// Creates a new search task.
    #[must_use]
    pub fn new(keyword: impl Into<String>, target_domain: impl Into<String>, max_pages: u32) -> Self {
        Self {
            keyword: keyword.into(),
            target_domain: target_domain.into(),
            max_pages,
        }
    }

    /// The hand-off key for this task's terminal result.
    #[must_use]
    pub fn key(&self) -> (String, String) {
        (self.keyword.clone(), self.target_domain.clone())
    }
}

/// How confidently a candidate's container traces to the main results region.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Traceability {
    /// An ancestor matching the results-region shape was found.
    Confirmed,
    /// The container resolved but no results-region ancestor was seen.
    #[default]
    Inconclusive,
    /// Container resolution was skipped or failed outright.
    Unknown,
}

/// Context facts captured while a candidate's container was inspected.
///
/// Recorded at extraction time so validation stays a pure function of the
/// candidate — the validator never touches the page again.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ContainerContext {
    /// No non-organic marker (ad, knowledge panel, carousel, …) was seen in
    /// the container markup.
    pub markers_absent: bool,
    /// The container markup exposes a heading node.
    pub has_heading: bool,
    /// The container markup exposes a snippet/description node.
    pub has_snippet: bool,
    /// Results-region traceability.
    pub traceability: Traceability,
}

impl ContainerContext {
    /// Context for a candidate whose container could not be inspected at all.
    #[must_use]
    pub fn unverified() -> Self {
        Self {
            markers_absent: false,
            has_heading: false,
            has_snippet: false,
            traceability: Traceability::Unknown,
        }
    }

    /// Whether the container looks like a genuine organic result block.
    #[must_use]
    pub fn is_organic(&self) -> bool {
        self.markers_absent && self.has_heading && self.has_snippet
    }
}

/// An extracted, not-yet-validated organic result.
///
/// Discarded after validation; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    /// The result's href, as found on the page.
    pub url: String,
    /// Best-effort result title.
    pub title: String,
    /// 1-based absolute rank: `(page - 1) * 10 + index + 1`.
    pub position: u32,
    /// 1-based page the candidate was extracted from.
    pub page: u32,
    /// Container facts for the validator.
    pub context: ContainerContext,
}

impl Candidate {
    /// Computes the absolute rank for a 0-based index on a given page.
    ///
    /// Pages are always counted as ten organic slots; short pages do not
    /// shift the numbering of later pages.
    #[must_use]
    pub fn position_for(page: u32, index: usize) -> u32 {
        (page.saturating_sub(1)) * 10 + u32::try_from(index).unwrap_or(u32::MAX - 1) + 1
    }
}

/// The seven layer scores produced for one candidate, plus the verdict.
///
/// Transient — produced and consumed within one validation call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MatchScore {
    /// Layer 1: fuzzy domain-match confidence.
    pub domain_match: f64,
    /// Layer 2: container-context validity.
    pub container_context: f64,
    /// Layer 3: URL host structural match.
    pub url_structure: f64,
    /// Layer 4: title relevance.
    pub title_relevance: f64,
    /// Layer 5: position/context plausibility.
    pub position_context: f64,
    /// Layer 6: domain-authority heuristic.
    pub domain_authority: f64,
    /// Layer 7: cross-field consistency.
    pub consistency: f64,
    /// Aggregate confidence: `(mean + min) / 2` over the seven layers.
    pub confidence: f64,
    /// The dual-threshold verdict.
    pub is_match: bool,
}

impl MatchScore {
    /// The seven layer scores in order.
    #[must_use]
    pub fn layers(&self) -> [f64; 7] {
        [
            self.domain_match,
            self.container_context,
            self.url_structure,
            self.title_relevance,
            self.position_context,
            self.domain_authority,
            self.consistency,
        ]
    }

    /// The worst layer score.
    #[must_use]
    pub fn min_layer(&self) -> f64 {
        self.layers().into_iter().fold(f64::INFINITY, f64::min)
    }
}

/// The terminal outcome for one [`SearchTask`]. Exactly one per task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankResult {
    /// The keyword that was searched.
    pub keyword: String,
    /// The target domain that was checked.
    pub target_domain: String,
    /// Whether the target was found among organic results.
    pub found: bool,
    /// 1-based rank when found, 0 otherwise.
    pub position: u32,
    /// 1-based page when found, 0 otherwise.
    pub page: u32,
    /// Matched result URL, empty when not found.
    pub url: String,
    /// Matched result title, empty when not found.
    pub title: String,
    /// Aggregate confidence of the match, 0.0 when not found.
    pub confidence: f64,
    /// How many crawl attempts were spent on this task.
    pub attempts: u32,
    /// Error tag of the last failing attempt, if the task ended on one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RankResult {
    /// A found result.
    #[must_use]
    pub fn found(task: &SearchTask, hit: &RankHit, attempts: u32) -> Self {
        Self {
            keyword: task.keyword.clone(),
            target_domain: task.target_domain.clone(),
            found: true,
            position: hit.position,
            page: hit.page,
            url: hit.url.clone(),
            title: hit.title.clone(),
            confidence: hit.confidence,
            attempts,
            error: None,
        }
    }

    /// A terminal not-found result, optionally annotated with an error tag.
    #[must_use]
    pub fn not_found(task: &SearchTask, attempts: u32, error: Option<String>) -> Self {
        Self {
            keyword: task.keyword.clone(),
            target_domain: task.target_domain.clone(),
            found: false,
            position: 0,
            page: 0,
            url: String::new(),
            title: String::new(),
            confidence: 0.0,
            attempts,
            error,
        }
    }
}

/// A validated match produced by one crawl attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankHit {
    /// 1-based absolute rank.
    pub position: u32,
    /// 1-based page number.
    pub page: u32,
    /// Matched result URL.
    pub url: String,
    /// Matched result title.
    pub title: String,
    /// Aggregate confidence of the match.
    pub confidence: f64,
}
