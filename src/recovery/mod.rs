//! # Name Recovery
//!
//! Multi-strategy recovery of medication names from damaged packaging.

pub mod context;
pub mod history;
pub mod ocr;
pub mod orchestrator;
pub mod pattern;
pub mod restoration;
pub mod result;
pub mod strategy;

pub use context::RecoveryContext;
pub use history::RecentResults;
pub use ocr::{OcrOutput, OcrProvider};
pub use orchestrator::{merge_candidates, MergedCandidate, RecoveryConfig, RecoveryOrchestrator, RecoveryState};
pub use result::{RecoveryMethod, RecoveryResult, FAILED_RECOVERY_CONFIDENCE, UNRECOGNIZED_TEXT};
pub use strategy::{RecoveryMode, RecoveryStrategy};
