//! # medpack-vision
//!
//! Recovers medication names from damaged or partially legible
//! pharmaceutical packaging. Package photos are reduced to visual feature
//! sets, compared against a reference index, and combined with fuzzy
//! dictionary matching, pattern completion, context hints and OCR output
//! into one ranked result.

pub mod circuit_breaker;
pub mod config;
pub mod errors;
pub mod features;
pub mod fuzzy;
pub mod index;
pub mod observability;
pub mod observability_config;
pub mod ocr_errors;
pub mod recovery;
pub mod similarity;

// Re-export types for easier access
pub use config::AppConfig;
pub use errors::{AppError, AppResult};
pub use features::{FeatureExtractor, FeatureFamily, FeatureSet, FeatureVector};
pub use fuzzy::{Dictionary, FuzzyTextMatcher, MatchCandidate, RecommendedAction};
pub use index::{ReferenceItem, VisualMatchIndex};
pub use recovery::{RecoveryContext, RecoveryMode, RecoveryOrchestrator, RecoveryResult};
pub use similarity::SimilarityScorer;
