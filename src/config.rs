//! # Unified Application Configuration
//!
//! This module consolidates the settings of every component into a single,
//! structured configuration object. It supports loading overrides from
//! environment variables, validation, and a summary for logging.
//!
//! ## Environment Variables
//!
//! | Variable | Section | Default |
//! |----------|---------|---------|
//! | `MEDPACK_EDGE_THRESHOLD` | features | 100.0 |
//! | `MEDPACK_MIN_DIMENSION` | features | 8 |
//! | `MEDPACK_MAX_ALTERNATIVES` | matcher | 5 |
//! | `MEDPACK_VISUAL_MIN_SCORE` | recovery | 0.3 |
//! | `MEDPACK_VISUAL_MAX_RESULTS` | recovery | 5 |
//! | `MEDPACK_EARLY_EXIT_CONFIDENCE` | recovery | 0.9 |
//! | `MEDPACK_RECENT_RESULTS_CAPACITY` | recovery | 20 |
//! | `MEDPACK_OCR_BREAKER_THRESHOLD` | recovery | 5 |
//! | `MEDPACK_OCR_BREAKER_RESET_SECS` | recovery | 60 |

use std::env;
use std::str::FromStr;

use crate::errors::{error_logging, AppError, AppResult};
use crate::features::FeatureConfig;
use crate::fuzzy::MatcherConfig;
use crate::index::IndexConfig;
use crate::observability_config::ObservabilityConfig;
use crate::recovery::RecoveryConfig;

/// Unified application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Feature extraction configuration
    pub features: FeatureConfig,
    /// Fuzzy matcher configuration
    pub matcher: MatcherConfig,
    /// Reference index configuration
    pub index: IndexConfig,
    /// Recovery orchestrator configuration
    pub recovery: RecoveryConfig,
    /// Observability configuration
    pub observability: ObservabilityConfig,
}

/// Read `key`, falling back to `default`, and parse it
fn env_or<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a valid number", key)))
            .inspect_err(|e| error_logging::log_config_error(e, key, "from_env")),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Unset variables keep their defaults; unparsable values are rejected.
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        // Feature extraction
        config.features.edge_threshold = env_or("MEDPACK_EDGE_THRESHOLD", config.features.edge_threshold)?;
        config.features.min_dimension = env_or("MEDPACK_MIN_DIMENSION", config.features.min_dimension)?;

        // Fuzzy matching
        config.matcher.max_alternatives = env_or("MEDPACK_MAX_ALTERNATIVES", config.matcher.max_alternatives)?;

        // Recovery
        config.recovery.visual_min_score = env_or("MEDPACK_VISUAL_MIN_SCORE", config.recovery.visual_min_score)?;
        config.recovery.visual_max_results =
            env_or("MEDPACK_VISUAL_MAX_RESULTS", config.recovery.visual_max_results)?;
        config.recovery.early_exit_confidence =
            env_or("MEDPACK_EARLY_EXIT_CONFIDENCE", config.recovery.early_exit_confidence)?;
        config.recovery.recent_results_capacity =
            env_or("MEDPACK_RECENT_RESULTS_CAPACITY", config.recovery.recent_results_capacity)?;
        config.recovery.ocr_breaker_threshold =
            env_or("MEDPACK_OCR_BREAKER_THRESHOLD", config.recovery.ocr_breaker_threshold)?;
        config.recovery.ocr_breaker_reset_secs =
            env_or("MEDPACK_OCR_BREAKER_RESET_SECS", config.recovery.ocr_breaker_reset_secs)?;

        // Observability
        config.observability = ObservabilityConfig::from_env();

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.features.validate()?;
        self.matcher.validate()?;
        self.index.validate()?;
        self.recovery.validate()?;
        self.observability.validate()?;
        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: edge_threshold={}, min_dimension={}, max_alternatives={}, visual_min_score={}, visual_max_results={}, early_exit_confidence={}, recent_results={}, ocr_breaker={}x/{}s, environment={}",
            self.features.edge_threshold,
            self.features.min_dimension,
            self.matcher.max_alternatives,
            self.recovery.visual_min_score,
            self.recovery.visual_max_results,
            self.recovery.early_exit_confidence,
            self.recovery.recent_results_capacity,
            self.recovery.ocr_breaker_threshold,
            self.recovery.ocr_breaker_reset_secs,
            self.observability.environment
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_env_or_parsing() {
        // Unset keys fall back to the default
        assert_eq!(env_or("MEDPACK_TEST_UNSET_KEY", 7usize).unwrap(), 7);

        env::set_var("MEDPACK_TEST_PARSE_KEY", " 0.25 ");
        assert_eq!(env_or("MEDPACK_TEST_PARSE_KEY", 1.0f32).unwrap(), 0.25);

        env::set_var("MEDPACK_TEST_PARSE_KEY", "many");
        let err = env_or("MEDPACK_TEST_PARSE_KEY", 1usize).unwrap_err();
        assert_eq!(
            err,
            AppError::Config("MEDPACK_TEST_PARSE_KEY must be a valid number".to_string())
        );
        env::remove_var("MEDPACK_TEST_PARSE_KEY");
    }

    #[test]
    fn test_invalid_section_fails_validation() {
        let mut config = AppConfig::default();
        config.recovery.visual_max_results = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.features.min_dimension = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_summary_mentions_key_settings() {
        let summary = AppConfig::default().summary();
        assert!(summary.contains("edge_threshold=100"));
        assert!(summary.contains("early_exit_confidence=0.9"));
        assert!(summary.contains("environment=development"));
    }
}
