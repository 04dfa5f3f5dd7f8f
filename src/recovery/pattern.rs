//! # Pattern Completion
//!
//! Completes truncated names and fills wildcard gaps against the
//! dictionary:
//!
//! - **Prefix**: `amox` completes to every name starting with it
//! - **Wildcards**: `?`, `_` and `.` stand for one unreadable character,
//!   `*` for any run of characters
//! - **Fuzzy**: every partial text also goes through the fuzzy matcher

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use crate::fuzzy::algorithms::normalize;
use crate::fuzzy::{Dictionary, FuzzyTextMatcher, MatchAlgorithm, MatchCandidate};

/// Shortest partial text completed as a prefix
pub const MIN_PREFIX_LEN: usize = 3;

const PREFIX_BASE: f32 = 60.0;
const PREFIX_SPAN: f32 = 35.0;
const WILDCARD_BASE: f32 = 50.0;
const WILDCARD_SPAN: f32 = 45.0;
const PATTERN_CAP: f32 = 95.0;

lazy_static! {
    static ref WILDCARD: Regex = Regex::new(r"[?_.*]").expect("Invalid wildcard regex pattern");
}

/// Candidates for `partial_text` from prefix, wildcard and fuzzy matching
pub fn pattern_candidates(
    partial_text: &str,
    dictionary: &Dictionary,
    matcher: &FuzzyTextMatcher,
) -> Vec<MatchCandidate> {
    let query = normalize(partial_text);
    if query.is_empty() {
        return Vec::new();
    }

    // `.` in doses and trailing punctuation also reads as a wildcard, so the
    // fuzzy matcher runs whichever completion applies
    let mut candidates = if WILDCARD.is_match(&query) {
        wildcard_matches(&query, dictionary)
    } else {
        prefix_matches(&query, dictionary)
    };
    candidates.extend(matcher.find_matches(&query, dictionary, 0.0));

    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    trace!(target: "recovery", query = %query, candidates = candidates.len(), "Pattern completion finished");
    candidates
}

/// Names that strictly extend `query`, scored by how much of the name is
/// already known
pub fn prefix_matches(query: &str, dictionary: &Dictionary) -> Vec<MatchCandidate> {
    let query_len = query.chars().count();
    if query_len < MIN_PREFIX_LEN {
        return Vec::new();
    }

    dictionary
        .entries()
        .iter()
        .filter(|entry| entry.normalized.starts_with(query) && entry.normalized != query)
        .map(|entry| {
            let ratio = query_len as f32 / entry.normalized.chars().count() as f32;
            let score = (PREFIX_BASE + PREFIX_SPAN * ratio).min(PATTERN_CAP);
            MatchCandidate::new(entry.name.clone(), score / 100.0, MatchAlgorithm::Prefix, "name")
        })
        .collect()
}

/// Names matching `query` with wildcards expanded, scored by the share of
/// known characters
pub fn wildcard_matches(query: &str, dictionary: &Dictionary) -> Vec<MatchCandidate> {
    let Some(regex) = wildcard_regex(query) else {
        return Vec::new();
    };
    let known = query.chars().filter(|c| !is_wildcard(*c)).count();
    if known == 0 {
        return Vec::new();
    }

    dictionary
        .entries()
        .iter()
        .filter(|entry| regex.is_match(&entry.normalized))
        .map(|entry| {
            let ratio = (known as f32 / entry.normalized.chars().count() as f32).min(1.0);
            let score = (WILDCARD_BASE + WILDCARD_SPAN * ratio).min(PATTERN_CAP);
            MatchCandidate::new(entry.name.clone(), score / 100.0, MatchAlgorithm::Pattern, "name")
        })
        .collect()
}

fn is_wildcard(c: char) -> bool {
    matches!(c, '?' | '_' | '.' | '*')
}

/// Anchored regex for a wildcard query; literal characters are escaped
pub fn wildcard_regex(query: &str) -> Option<Regex> {
    let mut pattern = String::with_capacity(query.len() * 2 + 2);
    pattern.push('^');
    for c in query.chars() {
        match c {
            '?' | '_' | '.' => pattern.push('.'),
            '*' => pattern.push_str(".*"),
            other => pattern.push_str(&regex::escape(&other.to_string())),
        }
    }
    pattern.push('$');
    Regex::new(&pattern).ok()
}
