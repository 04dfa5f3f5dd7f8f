//! Metrics recording functions.
//!
//! Everything goes through the `metrics` facade. The library never installs
//! a recorder; without one these calls are no-ops.

use std::time::Duration;

/// Record a full feature extraction
pub fn record_extraction_metrics(duration: Duration, families: usize, failed_families: usize) {
    metrics::counter!("feature_extractions_total").increment(1);
    metrics::histogram!("feature_extraction_duration_seconds").record(duration.as_secs_f64());
    metrics::histogram!("feature_extraction_families").record(families as f64);
    if failed_families > 0 {
        metrics::counter!("feature_extractions_degraded_total").increment(1);
    }
}

/// Record one descriptor family that could not be computed
pub fn record_family_failure(family: &str) {
    let family = family.to_string();
    metrics::counter!("feature_family_failures_total", "family" => family).increment(1);
}

/// Record a visual index query
pub fn record_index_query_metrics(duration: Duration, scanned: usize, returned: usize) {
    metrics::counter!("visual_index_queries_total").increment(1);
    metrics::histogram!("visual_index_query_duration_seconds").record(duration.as_secs_f64());
    metrics::histogram!("visual_index_items_scanned").record(scanned as f64);
    metrics::histogram!("visual_index_results_returned").record(returned as f64);
}

/// Record an index insertion outcome ("inserted", "duplicate", "removed")
pub fn record_index_mutation(outcome: &str) {
    let outcome = outcome.to_string();
    metrics::counter!("visual_index_mutations_total", "outcome" => outcome).increment(1);
}

/// Record the current number of stored reference items
pub fn record_index_size(size: usize) {
    metrics::gauge!("visual_index_items").set(size as f64);
}

/// Record fuzzy matching metrics
pub fn record_fuzzy_match_metrics(duration: Duration, candidates: usize) {
    metrics::counter!("fuzzy_match_queries_total").increment(1);
    metrics::histogram!("fuzzy_match_duration_seconds").record(duration.as_secs_f64());
    metrics::histogram!("fuzzy_match_candidates").record(candidates as f64);
}

/// Parameters for recovery metrics recording
#[derive(Debug, Clone)]
pub struct RecoveryMetricsParams<'a> {
    pub mode: &'a str,
    pub method: &'a str,
    pub success: bool,
    pub early_exit: bool,
    pub strategies_run: usize,
    pub confidence: f32,
    pub duration: Duration,
}

/// Record the outcome of one recovery run
pub fn record_recovery_metrics(params: RecoveryMetricsParams<'_>) {
    let RecoveryMetricsParams {
        mode,
        method,
        success,
        early_exit,
        strategies_run,
        confidence,
        duration,
    } = params;

    let mode = mode.to_string();
    metrics::counter!(
        "recovery_attempts_total",
        "mode" => mode.clone(),
        "result" => if success { "success" } else { "failure" }
    )
    .increment(1);
    metrics::counter!("recovery_methods_total", "method" => method.to_string()).increment(1);
    if early_exit {
        metrics::counter!("recovery_early_exits_total", "mode" => mode.clone()).increment(1);
    }
    metrics::histogram!("recovery_strategies_run", "mode" => mode).record(strategies_run as f64);
    metrics::histogram!("recovery_confidence").record(confidence as f64);
    metrics::histogram!("recovery_duration_seconds").record(duration.as_secs_f64());
}

/// Record one strategy execution
pub fn record_strategy_metrics(strategy: &str, candidates: usize, duration: Duration) {
    let strategy = strategy.to_string();
    metrics::counter!("recovery_strategy_runs_total", "strategy" => strategy.clone()).increment(1);
    metrics::histogram!("recovery_strategy_candidates", "strategy" => strategy.clone())
        .record(candidates as f64);
    metrics::histogram!("recovery_strategy_duration_seconds", "strategy" => strategy)
        .record(duration.as_secs_f64());
}

/// Record an OCR provider call
pub fn record_ocr_metrics(success: bool, duration: Duration) {
    metrics::counter!("ocr_operations_total", "result" => if success { "success" } else { "failure" }).increment(1);
    metrics::histogram!("ocr_duration_seconds").record(duration.as_secs_f64());
}

/// Update circuit breaker state metric
pub fn update_circuit_breaker_state(is_open: bool) {
    metrics::gauge!("circuit_breaker_state").set(if is_open { 1.0 } else { 0.0 });
}

/// Record error rate metrics
pub fn record_error_metrics(error_type: &str, component: &str) {
    let error_type = error_type.to_string();
    let component = component.to_string();
    metrics::counter!("errors_total", "type" => error_type, "component" => component).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Recording without an installed recorder must be a no-op
    #[test]
    fn test_recording_without_recorder() {
        record_extraction_metrics(Duration::from_millis(3), 6, 0);
        record_family_failure("keypoint");
        record_index_query_metrics(Duration::from_millis(1), 10, 3);
        record_recovery_metrics(RecoveryMetricsParams {
            mode: "balanced",
            method: "fuzzy_match",
            success: true,
            early_exit: false,
            strategies_run: 4,
            confidence: 0.8,
            duration: Duration::from_millis(5),
        });
        update_circuit_breaker_state(false);
    }
}
