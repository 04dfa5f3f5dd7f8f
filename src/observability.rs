//! Observability module for logging setup and metrics recording.
//!
//! This module provides:
//! - Structured logging with configurable levels (JSON or pretty output)
//! - Metrics recording through the `metrics` facade (see [`metrics`])
//! - Environment-specific configuration support
//!
//! The library never installs a metrics exporter; embedding applications
//! choose their own recorder.

pub mod metrics;

use tracing_subscriber::filter::Directive;
use tracing_subscriber::prelude::*;

use crate::errors::{AppError, AppResult};
use crate::observability_config::ObservabilityConfig;

/// Log targets used by the library's components
pub const LOG_TARGETS: &[&str] = &[
    "medpack_vision",
    "feature_extraction",
    "similarity",
    "fuzzy_matching",
    "visual_index",
    "recovery",
];

/// Initialize logging from environment variables
pub fn init_observability() -> AppResult<()> {
    let config = ObservabilityConfig::from_env();
    init_observability_with_config(config)
}

/// Initialize logging with custom configuration
pub fn init_observability_with_config(config: ObservabilityConfig) -> AppResult<()> {
    config.validate()?;
    init_tracing_with_config(&config)?;

    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        "Observability initialized"
    );
    Ok(())
}

fn directive(text: &str) -> AppResult<Directive> {
    text.parse()
        .map_err(|e| AppError::Config(format!("Invalid log directive '{}': {}", text, e)))
}

/// Build the log filter: `RUST_LOG` first, then the configured level for
/// every component target
pub fn build_env_filter(config: &ObservabilityConfig) -> AppResult<tracing_subscriber::EnvFilter> {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for target in LOG_TARGETS {
        filter = filter.add_directive(directive(&format!("{}={}", target, config.log_level))?);
    }
    Ok(filter)
}

/// Initialize structured logging with tracing and configuration
///
/// Fails with [`AppError::Internal`] when a global subscriber is already set.
pub fn init_tracing_with_config(config: &ObservabilityConfig) -> AppResult<()> {
    let filter = build_env_filter(config)?;

    // Pretty for development, JSON otherwise
    let result = if config.use_pretty_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()
    };
    result.map_err(|e| AppError::Internal(format!("Failed to initialize tracing: {}", e)))?;

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability_config::presets;

    #[test]
    fn test_env_filter_builds_for_presets() {
        for config in [presets::development(), presets::test(), presets::production()] {
            assert!(build_env_filter(&config).is_ok());
        }
    }

    #[test]
    fn test_invalid_config_is_rejected_before_init() {
        let config = ObservabilityConfig {
            log_level: "loud".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            init_observability_with_config(config),
            Err(AppError::Config(_))
        ));
    }
}
