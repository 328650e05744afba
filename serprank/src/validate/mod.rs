//! Seven-layer candidate validation.
//!
//! Each layer scores one independent aspect of a candidate in [0,1]. The
//! aggregate is `(mean + min) / 2` and a match requires both the aggregate
//! and the worst layer to clear their thresholds, so a single
//! catastrophically-low layer can never be masked by high scores elsewhere.

use crate::config::ValidationConfig;
use crate::domain::{host_of, match_domains, normalize};
use crate::models::{Candidate, MatchScore, Traceability};

/// Computes a [`MatchScore`] for one candidate against keyword and target.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Creates a validator over the given configuration.
    #[must_use]
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// The validation configuration.
    #[must_use]
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Scores a candidate. Pure - consumes only the candidate's captured
    /// facts, never the page.
    #[must_use]
    pub fn validate(&self, candidate: &Candidate, keyword: &str, target_domain: &str) -> MatchScore {
        let found_domain = normalize(&candidate.url);
        let target = normalize(target_domain);

        let (domain_matched, domain_confidence) = match_domains(&found_domain, &target);
        let domain_match = if domain_matched { domain_confidence } else { 0.0 };

        let container_context = if candidate.context.is_organic() { 1.0 } else { 0.0 };
        let url_structure = url_structure_score(&candidate.url, target_domain);
        let title_relevance = title_relevance_score(&candidate.title, keyword, &target);
        let position_context = match candidate.context.traceability {
            Traceability::Confirmed => 1.0,
            Traceability::Inconclusive => 0.5,
            Traceability::Unknown => 0.3,
        };
        let domain_authority = self.domain_authority_score(&found_domain);
        let consistency = consistency_score(&found_domain, &candidate.url, &candidate.title);

        let layers = [
            domain_match,
            container_context,
            url_structure,
            title_relevance,
            position_context,
            domain_authority,
            consistency,
        ];

        let mean = layers.iter().sum::<f64>() / layers.len() as f64;
        let min = layers.iter().copied().fold(f64::INFINITY, f64::min);
        let confidence = (mean + min) / 2.0;

        let is_match = confidence >= self.config.confidence_threshold
            && min >= self.config.min_layer_threshold;

        MatchScore {
            domain_match,
            container_context,
            url_structure,
            title_relevance,
            position_context,
            domain_authority,
            consistency,
            confidence,
            is_match,
        }
    }

    /// Layer 6: a recognized TLD with a sound label structure scores 1.0,
    /// a sound structure alone 0.7, anything else 0.3.
    fn domain_authority_score(&self, found_domain: &str) -> f64 {
        if found_domain.is_empty() {
            return 0.0;
        }

        let has_recognized_tld = self
            .config
            .recognized_tlds
            .iter()
            .any(|tld| found_domain.ends_with(tld.as_str()));

        let labels: Vec<&str> = found_domain.split('.').collect();
        let sound_structure = labels.len() >= 2 && labels.iter().all(|l| !l.is_empty());

        if has_recognized_tld && sound_structure {
            1.0
        } else if sound_structure {
            0.7
        } else {
            0.3
        }
    }
}

/// Layer 3: exact host equality 1.0, subdomain relation 0.9, else 0.0.
fn url_structure_score(url: &str, target_domain: &str) -> f64 {
    let url_host = host_of(url);
    let target_host = host_of(target_domain);

    if url_host.is_empty() || target_host.is_empty() {
        return 0.0;
    }
    if url_host == target_host {
        return 1.0;
    }
    if url_host.ends_with(&format!(".{target_host}")) || target_host.ends_with(&format!(".{url_host}")) {
        return 0.9;
    }
    0.0
}

/// Layer 4: +0.5 for the keyword in the title, +0.5 for any target-domain
/// label in the title, capped at 1.0.
fn title_relevance_score(title: &str, keyword: &str, target: &str) -> f64 {
    if title.is_empty() {
        return 0.0;
    }

    let title_lower = title.to_lowercase();
    let keyword_score: f64 = if !keyword.is_empty() && title_lower.contains(&keyword.to_lowercase()) {
        0.5
    } else {
        0.0
    };
    let domain_score: f64 = if target.split('.').any(|label| !label.is_empty() && title_lower.contains(label)) {
        0.5
    } else {
        0.0
    };

    (keyword_score + domain_score).min(1.0)
}

/// Layer 7: cross-field consistency increments, capped at 1.0.
fn consistency_score(found_domain: &str, url: &str, title: &str) -> f64 {
    let mut score = 0.0;
    let url_lower = url.to_lowercase();
    let title_lower = title.to_lowercase();

    if !found_domain.is_empty() && url_lower.contains(found_domain) {
        score += 0.4;
    }

    if !found_domain.is_empty()
        && found_domain
            .split('.')
            .any(|label| label.len() > 2 && title_lower.contains(label))
    {
        score += 0.3;
    }

    if !found_domain.is_empty() && !url.is_empty() && !title.is_empty() && title.len() > 10 {
        score += 0.3;
    }

    f64::min(score, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContainerContext;

    fn organic_context() -> ContainerContext {
        ContainerContext {
            markers_absent: true,
            has_heading: true,
            has_snippet: true,
            traceability: Traceability::Confirmed,
        }
    }

    fn candidate(url: &str, title: &str, context: ContainerContext) -> Candidate {
        Candidate {
            url: url.to_string(),
            title: title.to_string(),
            position: 1,
            page: 1,
            context,
        }
    }

    #[test]
    fn test_strong_candidate_matches() {
        let validator = Validator::default();
        let candidate = candidate(
            "https://www.shop.example.com/sale",
            "Summer Shoes Sale | Shop Example Store",
            organic_context(),
        );

        let score = validator.validate(&candidate, "shoes", "shop.example.com");

        assert!(score.is_match);
        assert!(score.confidence >= 0.85);
        assert!(score.min_layer() >= 0.70);
    }

    #[test]
    fn test_confidence_always_in_unit_interval() {
        let validator = Validator::default();
        let cases = [
            candidate("https://www.shop.example.com/sale", "Shop Example Shoes", organic_context()),
            candidate("https://unrelated.org/x", "Something Else Entirely", organic_context()),
            candidate("", "", ContainerContext::unverified()),
            candidate("https://a.b/", "t", ContainerContext::unverified()),
        ];

        for case in &cases {
            let score = validator.validate(case, "shoes", "shop.example.com");
            assert!((0.0..=1.0).contains(&score.confidence), "confidence out of range");
            for layer in score.layers() {
                assert!((0.0..=1.0).contains(&layer), "layer out of range");
            }
        }
    }

    #[test]
    fn test_match_implies_dual_thresholds() {
        let validator = Validator::default();
        let candidates = [
            candidate(
                "https://www.shop.example.com/sale",
                "Summer Shoes Sale | Shop Example Store",
                organic_context(),
            ),
            candidate("https://shop.example.com/", "Shop Example", organic_context()),
            candidate("https://blog.example.com/post", "Example Blog Post About Shoes", organic_context()),
        ];

        for c in &candidates {
            let score = validator.validate(c, "shoes", "shop.example.com");
            if score.is_match {
                assert!(score.confidence >= 0.85);
                assert!(score.min_layer() >= 0.70);
            }
        }
    }

    #[test]
    fn test_low_layer_vetoes_high_average() {
        let validator = Validator::default();
        // Right domain, but the container never passed organic checks:
        // layer 2 is 0.0 and must veto regardless of the other layers.
        let suspicious = candidate(
            "https://shop.example.com/sale",
            "Summer Shoes Sale | Shop Example Store",
            ContainerContext {
                markers_absent: false,
                has_heading: true,
                has_snippet: true,
                traceability: Traceability::Confirmed,
            },
        );

        let score = validator.validate(&suspicious, "shoes", "shop.example.com");

        assert_eq!(score.container_context, 0.0);
        assert!(!score.is_match);
    }

    #[test]
    fn test_wrong_domain_does_not_match() {
        let validator = Validator::default();
        let wrong = candidate(
            "https://competitor.net/shoes",
            "Shoes From Somewhere Else",
            organic_context(),
        );

        let score = validator.validate(&wrong, "shoes", "shop.example.com");

        assert!(!score.is_match);
        assert_eq!(score.domain_match, 0.0);
        assert_eq!(score.url_structure, 0.0);
    }

    #[test]
    fn test_title_relevance_increments() {
        assert_eq!(title_relevance_score("", "shoes", "shop.example.com"), 0.0);
        assert_eq!(title_relevance_score("Buy Shoes", "shoes", "acme.net"), 0.5);
        assert_eq!(title_relevance_score("Acme Catalog", "shoes", "acme.net"), 0.5);
        assert_eq!(title_relevance_score("Acme Shoes Catalog", "shoes", "acme.net"), 1.0);
    }

    #[test]
    fn test_domain_authority_tiers() {
        let validator = Validator::default();
        assert_eq!(validator.domain_authority_score("example.com"), 1.0);
        assert_eq!(validator.domain_authority_score("example.xyz"), 0.7);
        assert_eq!(validator.domain_authority_score("example"), 0.3);
        assert_eq!(validator.domain_authority_score(""), 0.0);
    }

    #[test]
    fn test_consistency_increments() {
        assert_eq!(
            consistency_score("example.com", "https://example.com/page", "Example Store Catalog"),
            1.0
        );
        assert_eq!(consistency_score("example.com", "https://example.com/p", "t"), 0.4);
        assert_eq!(consistency_score("", "https://example.com/p", "Long Enough Title"), 0.0);
    }
}
