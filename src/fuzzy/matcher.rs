//! # Fuzzy Text Matcher
//!
//! Matches a (possibly damaged) medication name against a dictionary.
//!
//! Six passes run in a fixed order and all feed one candidate pool:
//!
//! 1. Exact match (100)
//! 2. Brand alias (95 for a direct brand hit, 85 for a partial one)
//! 3. Edit distance similarity
//! 4. Character-set Jaccard similarity
//! 5. Phonetic code equality (90)
//! 6. Word-level partial matching (capped at 95)
//!
//! Scores use an integer 0-100 scale internally and are converted to
//! [0, 1] on the way out. Every non-exact candidate must reach the
//! threshold of its entry's category.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::observability::metrics::record_fuzzy_match_metrics;

use super::algorithms::{edit_similarity, jaccard_similarity, normalize, phonetic_code, to_score, tokenize};
use super::candidate::{MatchAlgorithm, MatchCandidate};
use super::dictionary::{Dictionary, DictionaryEntry, UNCLASSIFIED};

const EXACT_SCORE: u8 = 100;
const BRAND_DIRECT_SCORE: u8 = 95;
const BRAND_PARTIAL_SCORE: u8 = 85;
/// Edit similarity at which a query counts as a typo of a brand
const BRAND_TYPO_SCORE: u8 = 85;
const PHONETIC_SCORE: u8 = 90;
const PARTIAL_WORD_FLOOR: u8 = 70;
const PARTIAL_WORD_CAP: u8 = 95;
/// Shortest query allowed to hit a brand by substring
const MIN_SUBSTRING_LEN: usize = 3;

/// Fuzzy matcher configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Acceptance bar (0-100) per category
    pub category_thresholds: BTreeMap<String, u8>,
    /// Bar for categories without their own entry
    pub default_threshold: u8,
    /// Candidates returned beyond the primary one
    pub max_alternatives: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        let category_thresholds = [
            ("antibiotics", 85),
            ("analgesics", 75),
            ("diabetes", 90),
            ("hypertension", 85),
            ("cholesterol", 80),
            (UNCLASSIFIED, 80),
        ]
        .into_iter()
        .map(|(category, threshold)| (category.to_string(), threshold))
        .collect();

        Self {
            category_thresholds,
            default_threshold: 80,
            max_alternatives: 5,
        }
    }
}

impl MatcherConfig {
    /// Validate matcher configuration
    pub fn validate(&self) -> AppResult<()> {
        if let Some((category, threshold)) = self
            .category_thresholds
            .iter()
            .find(|(_, threshold)| **threshold > 100)
        {
            return Err(AppError::Config(format!(
                "Threshold for category '{}' must be between 0 and 100, got {}",
                category, threshold
            )));
        }

        if self.default_threshold > 100 {
            return Err(AppError::Config(
                "Default category threshold must be between 0 and 100".to_string(),
            ));
        }

        if self.max_alternatives > 20 {
            return Err(AppError::Config(
                "Max alternatives cannot be greater than 20".to_string(),
            ));
        }

        Ok(())
    }

    /// Acceptance bar for `category`
    pub fn threshold_for(&self, category: &str) -> u8 {
        self.category_thresholds
            .get(category)
            .copied()
            .unwrap_or(self.default_threshold)
    }
}

#[derive(Debug, Clone, Copy)]
struct PoolEntry {
    entry: usize,
    score: u8,
    algorithm: MatchAlgorithm,
    field: &'static str,
}

/// Dictionary matcher
#[derive(Debug, Clone, Default)]
pub struct FuzzyTextMatcher {
    config: MatcherConfig,
}

impl FuzzyTextMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MatcherConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Ranked candidates for `query`: the primary match followed by up to
    /// `max_alternatives` others, keeping only those with confidence of at
    /// least `min_confidence`. An empty query yields no candidates.
    pub fn find_matches(
        &self,
        query: &str,
        dictionary: &Dictionary,
        min_confidence: f32,
    ) -> Vec<MatchCandidate> {
        let start = Instant::now();
        let query = normalize(query);
        if query.is_empty() || dictionary.is_empty() {
            return Vec::new();
        }

        let entries = dictionary.entries();
        let mut pool = Vec::new();
        exact_pass(&query, entries, &mut pool);
        brand_alias_pass(&query, dictionary, &mut pool);
        similarity_pass(&query, entries, MatchAlgorithm::Levenshtein, edit_similarity, &mut pool);
        similarity_pass(&query, entries, MatchAlgorithm::Jaccard, jaccard_similarity, &mut pool);
        phonetic_pass(&query, entries, &mut pool);
        partial_word_pass(&query, entries, &mut pool);

        let pooled = pool.len();
        pool.retain(|c| {
            c.algorithm == MatchAlgorithm::Exact
                || c.score >= self.config.threshold_for(&entries[c.entry].category)
        });

        // Best candidate per entry; the earlier pass wins ties
        let mut best: BTreeMap<usize, PoolEntry> = BTreeMap::new();
        for candidate in pool {
            best.entry(candidate.entry)
                .and_modify(|current| {
                    if candidate.score > current.score {
                        *current = candidate;
                    }
                })
                .or_insert(candidate);
        }

        let mut ranked: Vec<PoolEntry> = best.into_values().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.entry.cmp(&b.entry)));
        ranked.truncate(1 + self.config.max_alternatives);

        let matches: Vec<MatchCandidate> = ranked
            .into_iter()
            .map(|c| {
                MatchCandidate::new(
                    entries[c.entry].name.clone(),
                    c.score as f32 / 100.0,
                    c.algorithm,
                    c.field,
                )
            })
            .filter(|c| c.confidence >= min_confidence)
            .collect();

        record_fuzzy_match_metrics(start.elapsed(), matches.len());
        tracing::debug!(
            target: "fuzzy_matching",
            query = %query,
            pooled,
            returned = matches.len(),
            top = ?matches.first().map(|c| c.label.as_str()),
            "Fuzzy match completed"
        );

        matches
    }
}

fn exact_pass(query: &str, entries: &[DictionaryEntry], pool: &mut Vec<PoolEntry>) {
    for (entry, e) in entries.iter().enumerate() {
        if e.normalized == query {
            pool.push(PoolEntry {
                entry,
                score: EXACT_SCORE,
                algorithm: MatchAlgorithm::Exact,
                field: "name",
            });
        }
    }
}

/// Brand hits score the brand's own entries and every entry naming the
/// generic or one of its `/` or `+` separated components.
fn brand_alias_pass(query: &str, dictionary: &Dictionary, pool: &mut Vec<PoolEntry>) {
    let entries = dictionary.entries();
    let substring_allowed = query.chars().count() >= MIN_SUBSTRING_LEN;

    for (brand, generic) in dictionary.brand_aliases() {
        let score = if query == brand {
            BRAND_DIRECT_SCORE
        } else if (substring_allowed && (brand.contains(query) || query.contains(brand.as_str())))
            || to_score(edit_similarity(query, brand)) >= BRAND_TYPO_SCORE
        {
            BRAND_PARTIAL_SCORE
        } else {
            continue;
        };

        let components: Vec<&str> = std::iter::once(generic.as_str())
            .chain(generic.split(['/', '+']).map(str::trim))
            .filter(|c| !c.is_empty())
            .collect();

        for (entry, e) in entries.iter().enumerate() {
            if e.normalized.contains(brand.as_str()) {
                pool.push(PoolEntry {
                    entry,
                    score,
                    algorithm: MatchAlgorithm::BrandAlias,
                    field: "brand",
                });
            } else if components.iter().any(|c| e.normalized.contains(c)) {
                pool.push(PoolEntry {
                    entry,
                    score: BRAND_PARTIAL_SCORE,
                    algorithm: MatchAlgorithm::BrandAlias,
                    field: "generic",
                });
            }
        }
    }
}

fn similarity_pass(
    query: &str,
    entries: &[DictionaryEntry],
    algorithm: MatchAlgorithm,
    similarity: fn(&str, &str) -> f32,
    pool: &mut Vec<PoolEntry>,
) {
    for (entry, e) in entries.iter().enumerate() {
        let score = to_score(similarity(query, &e.normalized));
        if score > 0 {
            pool.push(PoolEntry {
                entry,
                score,
                algorithm,
                field: "name",
            });
        }
    }
}

fn phonetic_pass(query: &str, entries: &[DictionaryEntry], pool: &mut Vec<PoolEntry>) {
    let Some(query_code) = phonetic_code(query) else {
        return;
    };
    for (entry, e) in entries.iter().enumerate() {
        if phonetic_code(&e.normalized).as_deref() == Some(query_code.as_str()) {
            pool.push(PoolEntry {
                entry,
                score: PHONETIC_SCORE,
                algorithm: MatchAlgorithm::Phonetic,
                field: "name",
            });
        }
    }
}

/// Average of the best per-token edit scores, counting only query tokens
/// whose best score reaches the floor.
fn partial_word_pass(query: &str, entries: &[DictionaryEntry], pool: &mut Vec<PoolEntry>) {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return;
    }

    for (entry, e) in entries.iter().enumerate() {
        let entry_tokens = tokenize(&e.normalized);
        if entry_tokens.is_empty() {
            continue;
        }

        let matched: Vec<u32> = query_tokens
            .iter()
            .filter_map(|q| {
                let best = entry_tokens
                    .iter()
                    .map(|t| to_score(edit_similarity(q, t)))
                    .max()
                    .unwrap_or(0);
                (best >= PARTIAL_WORD_FLOOR).then_some(best as u32)
            })
            .collect();

        if matched.is_empty() {
            continue;
        }
        let average = matched.iter().sum::<u32>() / matched.len() as u32;
        pool.push(PoolEntry {
            entry,
            score: (average as u8).min(PARTIAL_WORD_CAP),
            algorithm: MatchAlgorithm::PartialWord,
            field: "name",
        });
    }
}
