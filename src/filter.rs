//! Filter predicates for narrowing domain queries.
//!
//! A filter is either a case-sensitive substring test or a compiled regular
//! expression; the CLI rejects supplying both at once. Regexes are compiled
//! once at command entry so a malformed pattern fails before any store
//! access. Substring filters can be pushed down to SQL by the store; regex
//! filters are always evaluated in-process because PostgreSQL's POSIX regex
//! dialect is not the same as Rust's.

use regex::Regex;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub enum DomainFilter {
    /// Case-sensitive containment test.
    Substring(String),
    /// Compiled regex, unanchored search.
    Regex(Regex),
}

impl DomainFilter {
    /// Builds a filter from the CLI's `--match` / `--regex` options.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidPattern`] when the regex does not compile,
    /// or [`AppError::Config`] when both options are supplied (clap already
    /// prevents this; the guard keeps the invariant local).
    pub fn from_options(
        substring: Option<String>,
        pattern: Option<String>,
    ) -> Result<Option<Self>, AppError> {
        match (substring, pattern) {
            (Some(_), Some(_)) => Err(AppError::Config(
                "--match and --regex are mutually exclusive".to_string(),
            )),
            (Some(s), None) => Ok(Some(DomainFilter::Substring(s))),
            (None, Some(p)) => Ok(Some(DomainFilter::Regex(Regex::new(&p)?))),
            (None, None) => Ok(None),
        }
    }

    /// In-memory predicate used when the filter cannot be pushed down.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            DomainFilter::Substring(s) => name.contains(s.as_str()),
            DomainFilter::Regex(re) => re.is_match(name),
        }
    }

    /// The substring to push down as a SQL `strpos` clause, if this filter
    /// supports pushdown.
    pub fn sql_substring(&self) -> Option<&str> {
        match self {
            DomainFilter::Substring(s) => Some(s.as_str()),
            DomainFilter::Regex(_) => None,
        }
    }
}
