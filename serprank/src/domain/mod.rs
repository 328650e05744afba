//! Domain normalization and matching.
//!
//! This module provides:
//! - Canonicalization of raw URLs/hosts into comparable domains
//! - Tiered fuzzy matching between a found domain and a target domain

mod matcher;
mod normalize;

pub use matcher::{composite_similarity, match_domains};
pub use normalize::{host_of, normalize};
