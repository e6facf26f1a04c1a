//! Domain-format validation.
//!
//! A candidate is accepted when it looks like a hostname, a wildcard pattern
//! (`*.example.com`, `svc-*.domain.com`), or a service-record name
//! (`_dmarc.example.com`). Matching is case-insensitive; callers are expected
//! to lowercase before storage so dedup is case-insensitive too (see
//! [`canonicalize`]).

use regex::Regex;
use std::sync::LazyLock;

// Labels: alphanumerics plus `_` and `*`, internal hyphens. Final label must
// be a purely alphabetic TLD of at least two characters.
static DOMAIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(?:\*\.)?(?:[a-z0-9_*](?:[a-z0-9_*-]{0,61}[a-z0-9_*])?\.)+[a-z]{2,63}$")
        .expect("hardcoded domain pattern compiles")
});

/// RFC 1035 limit on the full name.
const MAX_DOMAIN_LEN: usize = 253;

/// Returns true when `candidate` is a storable domain or wildcard pattern.
///
/// Pure predicate, no side effects.
pub fn is_valid_domain(candidate: &str) -> bool {
    if candidate.is_empty() || candidate.len() > MAX_DOMAIN_LEN {
        return false;
    }

    // A leading wildcard must be its own label.
    if candidate.starts_with('*') && !candidate.starts_with("*.") {
        return false;
    }

    // A wildcard must resolve to a dotted, TLD-bearing remainder.
    if candidate.ends_with('*') {
        return false;
    }

    // Hyphens may not touch a dot on either side.
    if candidate.contains("-.") || candidate.contains(".-") {
        return false;
    }

    if candidate.starts_with('.') || candidate.ends_with('.') {
        return false;
    }

    DOMAIN_PATTERN.is_match(candidate)
}

/// Canonical stored form: trimmed and lowercased.
///
/// Domain names are case-insensitive by definition, so `EXAMPLE.com` and
/// `example.com` must dedup to a single record.
pub fn canonicalize(candidate: &str) -> String {
    candidate.trim().to_ascii_lowercase()
}
