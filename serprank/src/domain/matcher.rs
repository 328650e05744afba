//! Tiered fuzzy matching between domains.

use super::normalize::normalize;

/// Confidence assigned to a subdomain relation between the two hosts.
const SUBDOMAIN_CONFIDENCE: f64 = 0.9;

/// Confidence assigned to a shared registrable domain.
const REGISTRABLE_CONFIDENCE: f64 = 0.85;

/// Composite-similarity floor above which near-duplicates count as matches.
const SIMILARITY_THRESHOLD: f64 = 0.95;

/// Scores a found domain against a target domain.
///
/// Both sides are normalized internally, so raw URLs are accepted. Tiers
/// are tried in order: exact equality (1.0), subdomain relation (0.9),
/// shared registrable domain (0.85), composite string similarity at or
/// above 0.95. On no match the best similarity found is returned for
/// diagnostics.
#[must_use]
pub fn match_domains(found: &str, target: &str) -> (bool, f64) {
    let found = normalize(found);
    let target = normalize(target);

    if found.is_empty() || target.is_empty() {
        return (false, 0.0);
    }

    if found == target {
        return (true, 1.0);
    }

    if is_dot_suffix(&found, &target) || is_dot_suffix(&target, &found) {
        return (true, SUBDOMAIN_CONFIDENCE);
    }

    if registrable(&found) == registrable(&target) {
        return (true, REGISTRABLE_CONFIDENCE);
    }

    let similarity = composite_similarity(&found, &target);
    if similarity >= SIMILARITY_THRESHOLD {
        return (true, similarity);
    }

    (false, similarity)
}

/// Whether `sub` is a proper subdomain of `base`.
fn is_dot_suffix(sub: &str, base: &str) -> bool {
    sub.len() > base.len() && sub.ends_with(base) && sub.as_bytes()[sub.len() - base.len() - 1] == b'.'
}

/// The last two dot-separated labels of a host (public-suffix
/// approximation).
fn registrable(domain: &str) -> String {
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return domain.to_string();
    }
    labels[labels.len() - 2..].join(".")
}

/// Composite string similarity between two normalized domains.
///
/// The maximum of the edit-distance ratio, the substring-containment
/// ratio, and the token-order-insensitive ratio, each in [0,1].
#[must_use]
pub fn composite_similarity(a: &str, b: &str) -> f64 {
    let edit = strsim::normalized_levenshtein(a, b);
    let containment = containment_ratio(a, b);
    let token_sort = token_sort_ratio(a, b);

    edit.max(containment).max(token_sort)
}

/// Best alignment of the shorter string against any equally long window of
/// the longer one.
fn containment_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };

    if short.is_empty() {
        return 0.0;
    }
    if long.contains(short) {
        return 1.0;
    }

    let long_chars: Vec<char> = long.chars().collect();
    let width = short.chars().count();

    long_chars
        .windows(width)
        .map(|window| {
            let window: String = window.iter().collect();
            strsim::normalized_levenshtein(short, &window)
        })
        .fold(0.0, f64::max)
}

/// Edit-distance ratio over label tokens sorted into a canonical order.
fn token_sort_ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&sorted_tokens(a), &sorted_tokens(b))
}

fn sorted_tokens(domain: &str) -> String {
    let mut tokens: Vec<&str> = domain
        .split(['.', '-'])
        .filter(|t| !t.is_empty())
        .collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_full_confidence() {
        assert_eq!(match_domains("example.com", "example.com"), (true, 1.0));
        // Normalization runs on both sides.
        assert_eq!(match_domains("https://www.example.com/x", "example.com"), (true, 1.0));
    }

    #[test]
    fn test_subdomain_relation() {
        let (matched, confidence) = match_domains("blog.example.com", "example.com");
        assert!(matched);
        assert!((0.85..=0.95).contains(&confidence));

        let (matched, confidence) = match_domains("example.com", "blog.example.com");
        assert!(matched);
        assert_eq!(confidence, SUBDOMAIN_CONFIDENCE);
    }

    #[test]
    fn test_shared_registrable_domain() {
        let (matched, confidence) = match_domains("shop.example.com", "blog.example.com");
        assert!(matched);
        assert_eq!(confidence, REGISTRABLE_CONFIDENCE);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(match_domains("example.com", ""), (false, 0.0));
        assert_eq!(match_domains("", "example.com"), (false, 0.0));
        assert_eq!(match_domains("", ""), (false, 0.0));
        // A host that fails normalization behaves like an empty input.
        assert_eq!(match_domains("localhost", "example.com"), (false, 0.0));
    }

    #[test]
    fn test_unrelated_domains_report_diagnostics() {
        let (matched, confidence) = match_domains("rust-lang.org", "example.com");
        assert!(!matched);
        assert!(confidence < SIMILARITY_THRESHOLD);
        assert!(confidence > 0.0);
    }

    #[test]
    fn test_no_dot_suffix_on_partial_label() {
        // "notexample.com" must not be treated as a subdomain of "example.com".
        let (matched, confidence) = match_domains("notexample.com", "example.com");
        assert!(matched || confidence < 1.0);
        assert_ne!(confidence, SUBDOMAIN_CONFIDENCE);
    }

    #[test]
    fn test_token_sort_is_order_insensitive() {
        let forward = token_sort_ratio("shop.example.com", "example.shop.com");
        assert_eq!(forward, 1.0);
    }

    #[test]
    fn test_containment_ratio() {
        assert_eq!(containment_ratio("example", "myexample.com"), 1.0);
        assert!(containment_ratio("exmaple", "example.com") > 0.7);
    }
}
