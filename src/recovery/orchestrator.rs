//! # Recovery Orchestrator
//!
//! Runs the strategies of a [`RecoveryMode`] strictly in order, pools their
//! candidates, merges agreeing candidates and returns one ranked result.
//!
//! ## Execution
//!
//! ```text
//! NotStarted ──► RunningStrategy(0) ──► ... ──► RunningStrategy(n) ──► Merging ──► Done
//!                       │                                                   │
//!                       └── pooled candidate above early-exit bar ──────────┤
//!                                                                           └──► Failed
//! ```
//!
//! - Strategies never abort a recovery: a failing collaborator (OCR
//!   provider, reference store) counts as zero candidates
//! - Once any pooled candidate exceeds the early-exit confidence, the
//!   remaining strategies are skipped
//! - Candidates with the same label merge into one, keeping the maximum
//!   confidence and every contributing algorithm tag
//! - Without candidates the result carries the partial text at a fixed
//!   confidence of 0.1

use std::time::{Duration, Instant};

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::context::{context_candidates, RecoveryContext};
use super::history::{RecentResults, DEFAULT_RECENT_CAPACITY};
use super::ocr::{recovery_prompt, OcrProvider};
use super::pattern::pattern_candidates;
use super::restoration::restoration_candidates;
use super::result::{RecoveryMethod, RecoveryResult, FAILED_RECOVERY_CONFIDENCE, UNRECOGNIZED_TEXT};
use super::strategy::{RecoveryMode, RecoveryStrategy};
use crate::circuit_breaker::CircuitBreaker;
use crate::errors::{error_logging, AppError, AppResult};
use crate::fuzzy::{Dictionary, FuzzyTextMatcher, MatchAlgorithm, MatchCandidate};
use crate::index::VisualMatchIndex;
use crate::observability::metrics::{
    record_error_metrics, record_ocr_metrics, record_recovery_metrics, record_strategy_metrics,
    RecoveryMetricsParams,
};

/// Alternatives reported after the recovered text
pub const RESULT_ALTERNATIVES: usize = 4;

/// Weight of OCR confidence in OCR candidate scores
const OCR_CONFIDENCE_WEIGHT: f32 = 0.3;
/// Score of unmatched OCR text, relative to the provider's confidence
const RAW_OCR_FACTOR: f32 = 0.7;

/// Configuration for the recovery orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Skip remaining strategies once a candidate exceeds this confidence
    pub early_exit_confidence: f32,
    /// Minimum aggregate similarity of visual matches
    pub visual_min_score: f32,
    /// Maximum visual matches per recovery
    pub visual_max_results: usize,
    /// Number of recent results kept for context-aware recovery
    pub recent_results_capacity: usize,
    /// Consecutive OCR failures before the circuit breaker opens
    pub ocr_breaker_threshold: u32,
    /// Seconds the OCR circuit breaker stays open
    pub ocr_breaker_reset_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            early_exit_confidence: 0.9,
            visual_min_score: 0.3,
            visual_max_results: 5,
            recent_results_capacity: DEFAULT_RECENT_CAPACITY,
            ocr_breaker_threshold: 5,
            ocr_breaker_reset_secs: 60,
        }
    }
}

impl RecoveryConfig {
    /// Validate the configuration
    pub fn validate(&self) -> AppResult<()> {
        if !(self.early_exit_confidence > 0.0 && self.early_exit_confidence <= 1.0) {
            return Err(AppError::Config(
                "Early exit confidence must be in (0.0, 1.0]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.visual_min_score) {
            return Err(AppError::Config(
                "Visual minimum score must be between 0.0 and 1.0".to_string(),
            ));
        }
        if self.visual_max_results == 0 {
            return Err(AppError::Config(
                "Visual max results must be greater than 0".to_string(),
            ));
        }
        if self.ocr_breaker_threshold == 0 {
            return Err(AppError::Config(
                "OCR circuit breaker threshold must be greater than 0".to_string(),
            ));
        }
        if self.ocr_breaker_reset_secs == 0 {
            return Err(AppError::Config(
                "OCR circuit breaker reset timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Progress of the current (or last) recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    NotStarted,
    /// Index into the mode's strategy order
    RunningStrategy(usize),
    Merging,
    Done,
    Failed,
}

/// A merged candidate and the strategies that proposed its label
#[derive(Debug, Clone, PartialEq)]
pub struct MergedCandidate {
    pub candidate: MatchCandidate,
    pub strategies: Vec<RecoveryStrategy>,
}

/// Group pooled candidates by exact label
///
/// Each group keeps the maximum confidence, the matched field of its best
/// member and the `+`-joined distinct algorithm tags in pool order. Groups
/// are sorted by confidence, ties keeping first appearance.
pub fn merge_candidates(pool: Vec<(RecoveryStrategy, MatchCandidate)>) -> Vec<MergedCandidate> {
    let mut merged: Vec<MergedCandidate> = Vec::new();

    for (strategy, candidate) in pool {
        match merged.iter_mut().find(|m| m.candidate.label == candidate.label) {
            Some(group) => {
                for tag in candidate.algorithms() {
                    if !group.candidate.algorithms().any(|existing| existing == tag) {
                        group.candidate.algorithm.push('+');
                        group.candidate.algorithm.push_str(tag);
                    }
                }
                if !group.strategies.contains(&strategy) {
                    group.strategies.push(strategy);
                }
                if candidate.confidence > group.candidate.confidence {
                    group.candidate.confidence = candidate.confidence;
                    group.candidate.matched_field = candidate.matched_field;
                }
            }
            None => merged.push(MergedCandidate {
                candidate,
                strategies: vec![strategy],
            }),
        }
    }

    merged.sort_by(|a, b| b.candidate.confidence.total_cmp(&a.candidate.confidence));
    merged
}

/// Recovers medication names from damaged packaging
pub struct RecoveryOrchestrator {
    dictionary: Dictionary,
    matcher: FuzzyTextMatcher,
    index: Option<VisualMatchIndex>,
    ocr: Option<Box<dyn OcrProvider>>,
    breaker: CircuitBreaker,
    recent: RecentResults,
    config: RecoveryConfig,
    state: RecoveryState,
}

impl RecoveryOrchestrator {
    /// Create an orchestrator without OCR provider or visual index
    pub fn new(dictionary: Dictionary, matcher: FuzzyTextMatcher, config: RecoveryConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self {
            dictionary,
            matcher,
            index: None,
            ocr: None,
            breaker: CircuitBreaker::new(
                config.ocr_breaker_threshold,
                Duration::from_secs(config.ocr_breaker_reset_secs),
            ),
            recent: RecentResults::with_capacity(config.recent_results_capacity),
            config,
            state: RecoveryState::NotStarted,
        })
    }

    pub fn with_index(mut self, index: VisualMatchIndex) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_ocr_provider(mut self, provider: Box<dyn OcrProvider>) -> Self {
        self.ocr = Some(provider);
        self
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn index(&self) -> Option<&VisualMatchIndex> {
        self.index.as_ref()
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    pub fn state(&self) -> RecoveryState {
        self.state
    }

    pub fn recent_results(&self) -> &RecentResults {
        &self.recent
    }

    pub fn clear_recent_results(&mut self) {
        self.recent.clear();
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Recover the name printed on a package
    ///
    /// # Arguments
    ///
    /// * `image` - The package photograph, if one is available
    /// * `partial_text` - Whatever text was read so far, possibly damaged
    /// * `context` - Expected names and category
    /// * `mode` - Which strategies run, in which order
    ///
    /// # Returns
    ///
    /// Always returns a result; nothing recovered is reported through
    /// [`RecoveryMethod::Failed`] or [`RecoveryMethod::NoVisualMatch`].
    /// Successful results are remembered for later context-aware
    /// recoveries.
    pub fn recover(
        &mut self,
        image: Option<&DynamicImage>,
        partial_text: &str,
        context: &RecoveryContext,
        mode: RecoveryMode,
    ) -> RecoveryResult {
        let start = Instant::now();
        self.state = RecoveryState::NotStarted;

        let strategies = mode.strategies();
        let mut pool: Vec<(RecoveryStrategy, MatchCandidate)> = Vec::new();
        let mut strategies_run = Vec::with_capacity(strategies.len());
        let mut early_exit = false;

        for (position, strategy) in strategies.iter().copied().enumerate() {
            self.state = RecoveryState::RunningStrategy(position);

            let strategy_start = Instant::now();
            let candidates = self.run_strategy(strategy, image, partial_text, context);
            record_strategy_metrics(strategy.as_str(), candidates.len(), strategy_start.elapsed());
            trace!(
                target: "recovery",
                strategy = %strategy,
                candidates = candidates.len(),
                "Strategy finished"
            );

            strategies_run.push(strategy);
            pool.extend(candidates.into_iter().map(|candidate| (strategy, candidate)));

            if pool
                .iter()
                .any(|(_, candidate)| candidate.confidence > self.config.early_exit_confidence)
            {
                early_exit = position + 1 < strategies.len();
                break;
            }
        }

        self.state = RecoveryState::Merging;
        let mut merged = merge_candidates(pool).into_iter();

        let result = match merged.next() {
            Some(top) => RecoveryResult {
                recovered_text: top.candidate.label,
                confidence: top.candidate.confidence,
                method: RecoveryMethod::Recovered(top.strategies),
                alternatives: merged
                    .take(RESULT_ALTERNATIVES)
                    .map(|m| m.candidate)
                    .collect(),
                strategies_run,
                early_exit,
            },
            None => failed_result(partial_text, mode, strategies_run),
        };

        self.state = if result.is_success() {
            self.recent.push(result.clone());
            RecoveryState::Done
        } else {
            RecoveryState::Failed
        };

        let duration = start.elapsed();
        let method = result.method.to_string();
        record_recovery_metrics(RecoveryMetricsParams {
            mode: mode.as_str(),
            method: &method,
            success: result.is_success(),
            early_exit,
            strategies_run: result.strategies_run.len(),
            confidence: result.confidence,
            duration,
        });
        debug!(
            target: "recovery",
            mode = %mode,
            method = %method,
            recovered = %result.recovered_text,
            confidence = result.confidence,
            alternatives = result.alternatives.len(),
            strategies_run = result.strategies_run.len(),
            early_exit,
            duration_ms = duration.as_millis(),
            "Recovery completed"
        );

        result
    }

    fn run_strategy(
        &self,
        strategy: RecoveryStrategy,
        image: Option<&DynamicImage>,
        partial_text: &str,
        context: &RecoveryContext,
    ) -> Vec<MatchCandidate> {
        match strategy {
            RecoveryStrategy::EnhancedOcr => self.enhanced_ocr(image, partial_text),
            RecoveryStrategy::PatternCompletion => {
                pattern_candidates(partial_text, &self.dictionary, &self.matcher)
            }
            RecoveryStrategy::VisualSimilarity => self.visual_similarity(image),
            RecoveryStrategy::ContextAware => {
                context_candidates(partial_text, context, &self.recent, &self.dictionary)
            }
            RecoveryStrategy::MlCharacterRestoration => {
                restoration_candidates(partial_text, &self.dictionary, &self.matcher)
            }
        }
    }

    /// Fuzzy match fresh OCR text; scores blend match and OCR confidence
    fn enhanced_ocr(&self, image: Option<&DynamicImage>, partial_text: &str) -> Vec<MatchCandidate> {
        let (Some(provider), Some(image)) = (self.ocr.as_deref(), image) else {
            return Vec::new();
        };
        if self.breaker.is_open() {
            trace!(target: "recovery", "OCR circuit breaker open, skipping EnhancedOCR");
            return Vec::new();
        }

        let prompt = recovery_prompt(partial_text);
        let start = Instant::now();
        let output = match provider.recognize(image, prompt.as_deref()) {
            Ok(output) => output,
            Err(e) => {
                let duration = start.elapsed();
                self.breaker.record_failure();
                record_ocr_metrics(false, duration);
                record_error_metrics("ocr", "recovery");
                error_logging::log_ocr_error(&e, "enhanced_ocr", Some(image_dimensions(image)), Some(duration));
                return Vec::new();
            }
        };
        self.breaker.record_success();
        record_ocr_metrics(true, start.elapsed());

        let text = output.text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        let scale = (1.0 - OCR_CONFIDENCE_WEIGHT) + OCR_CONFIDENCE_WEIGHT * output.confidence;
        let candidates: Vec<MatchCandidate> = self
            .matcher
            .find_matches(text, &self.dictionary, 0.0)
            .into_iter()
            .map(|c| MatchCandidate::new(c.label, c.confidence * scale, MatchAlgorithm::Ocr, c.matched_field))
            .collect();

        if candidates.is_empty() {
            vec![MatchCandidate::new(
                text,
                output.confidence * RAW_OCR_FACTOR,
                MatchAlgorithm::Ocr,
                "ocr_text",
            )]
        } else {
            candidates
        }
    }

    fn visual_similarity(&self, image: Option<&DynamicImage>) -> Vec<MatchCandidate> {
        let (Some(index), Some(image)) = (self.index.as_ref(), image) else {
            return Vec::new();
        };

        match index.find_similar_to_image(image, self.config.visual_min_score, self.config.visual_max_results) {
            Ok(matches) => matches
                .into_iter()
                .map(|(item, score)| {
                    MatchCandidate::new(item.name, score, MatchAlgorithm::VisualSimilarity, "reference_item")
                })
                .collect(),
            Err(e) => {
                warn!(target: "recovery", error = %e, "Visual similarity lookup failed");
                record_error_metrics("storage", "recovery");
                Vec::new()
            }
        }
    }
}

impl std::fmt::Debug for RecoveryOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryOrchestrator")
            .field("dictionary_entries", &self.dictionary.len())
            .field("has_index", &self.index.is_some())
            .field("has_ocr", &self.ocr.is_some())
            .field("recent_results", &self.recent.len())
            .field("state", &self.state)
            .finish()
    }
}

fn image_dimensions(image: &DynamicImage) -> (u32, u32) {
    (image.width(), image.height())
}

fn failed_result(
    partial_text: &str,
    mode: RecoveryMode,
    strategies_run: Vec<RecoveryStrategy>,
) -> RecoveryResult {
    RecoveryResult {
        recovered_text: if partial_text.trim().is_empty() {
            UNRECOGNIZED_TEXT.to_string()
        } else {
            partial_text.to_string()
        },
        confidence: FAILED_RECOVERY_CONFIDENCE,
        method: if mode == RecoveryMode::VisualOnly {
            RecoveryMethod::NoVisualMatch
        } else {
            RecoveryMethod::Failed
        },
        alternatives: Vec::new(),
        strategies_run,
        early_exit: false,
    }
}
