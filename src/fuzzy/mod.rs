//! # Fuzzy Name Matching
//!
//! Dictionary lookup tolerant of OCR damage and typos.

pub mod action;
pub mod algorithms;
pub mod candidate;
pub mod dictionary;
pub mod matcher;

pub use action::RecommendedAction;
pub use algorithms::{edit_similarity, jaccard_similarity, levenshtein_distance, phonetic_code};
pub use candidate::{MatchAlgorithm, MatchCandidate};
pub use dictionary::{Dictionary, DictionaryEntry, UNCLASSIFIED};
pub use matcher::{FuzzyTextMatcher, MatcherConfig};
