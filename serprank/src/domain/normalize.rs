//! Domain canonicalization.

use regex::Regex;
use std::sync::OnceLock;

/// Single-segment prefixes that never identify a site on their own.
const DISCARDABLE_PREFIXES: [&str; 3] = ["m", "mobile", "amp"];

/// Two-letter language codes stripped when they prefix a longer host.
const LANGUAGE_PREFIXES: [&str; 26] = [
    "en", "es", "de", "fr", "it", "pt", "ru", "ja", "zh", "ko", "nl", "pl", "tr", "ar", "sv",
    "no", "da", "fi", "cs", "el", "he", "hi", "id", "th", "uk", "vi",
];

fn port_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r":\d+$").expect("Failed to compile port regex"))
}

fn www_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^www\d*\.").expect("Failed to compile www regex"))
}

fn ipv4_literal() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,3}(\.\d{1,3}){3}$").expect("Failed to compile ip regex"))
}

/// Canonicalizes a raw URL or host into a comparable lowercase domain.
///
/// Returns an empty string when no usable domain remains; normalization
/// never fails. Deterministic and idempotent:
/// `normalize(normalize(x)) == normalize(x)`.
#[must_use]
pub fn normalize(raw: &str) -> String {
    let mut host = raw.trim().to_lowercase();
    if host.is_empty() {
        return String::new();
    }

    // Scheme, then everything after the authority.
    if let Some(idx) = host.find("://") {
        host = host[idx + 3..].to_string();
    }
    for sep in ['/', '?', '#'] {
        if let Some(idx) = host.find(sep) {
            host.truncate(idx);
        }
    }

    // Bracketed hosts (IPv6 literals) are never comparable domains.
    if host.starts_with('[') {
        return String::new();
    }

    host = port_suffix().replace(&host, "").to_string();
    host = host.trim_matches('.').to_string();

    // Strip discardable prefixes to a fixpoint so repeated application
    // is a no-op.
    loop {
        let stripped = strip_prefix_once(&host);
        if stripped == host {
            break;
        }
        host = stripped;
    }

    if ipv4_literal().is_match(&host) {
        return String::new();
    }
    if !host.contains('.') || host.len() < 3 {
        return String::new();
    }

    host
}

fn strip_prefix_once(host: &str) -> String {
    if let Some(rest) = www_prefix().find(host).map(|m| &host[m.end()..]) {
        return rest.to_string();
    }

    let Some((label, rest)) = host.split_once('.') else {
        return host.to_string();
    };

    if DISCARDABLE_PREFIXES.contains(&label) {
        return rest.to_string();
    }

    // Language prefixes are only stripped while a registrable domain
    // remains behind them.
    if LANGUAGE_PREFIXES.contains(&label) && rest.contains('.') {
        return rest.to_string();
    }

    host.to_string()
}

/// Extracts the raw lowercase host of a URL, without normalization
/// tolerances.
///
/// Keeps `www.` and similar prefixes; strips scheme, port, and everything
/// after the authority. Empty when no host is present.
#[must_use]
pub fn host_of(url: &str) -> String {
    let mut host = url.trim().to_lowercase();
    if let Some(idx) = host.find("://") {
        host = host[idx + 3..].to_string();
    }
    for sep in ['/', '?', '#'] {
        if let Some(idx) = host.find(sep) {
            host.truncate(idx);
        }
    }
    host = port_suffix().replace(&host, "").to_string();
    host.trim_matches('.').to_string()
}
