//! # Observability Configuration
//!
//! Environment-specific logging configuration.

use std::env;

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Observability configuration for different environments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Environment name (development, test, staging, production)
    pub environment: String,
    /// Default log level when `RUST_LOG` is not set
    pub log_level: String,
    /// Explicit log format ("json" or "pretty"); the environment decides when unset
    pub log_format: Option<String>,
    /// Service name recorded on the startup event
    pub service_name: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            log_level: "info".to_string(),
            log_format: None,
            service_name: "medpack-vision".to_string(),
        }
    }
}

impl ObservabilityConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            log_level: env::var("OBSERVABILITY_LOG_LEVEL")
                .unwrap_or_else(|_| "info".to_string())
                .to_lowercase(),
            log_format: env::var("LOG_FORMAT").ok().map(|format| format.to_lowercase()),
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| "medpack-vision".to_string()),
        }
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Human-readable output instead of JSON lines
    pub fn use_pretty_logs(&self) -> bool {
        match self.log_format.as_deref() {
            Some(format) => format == "pretty",
            None => self.is_development(),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.environment.trim().is_empty() {
            return Err(AppError::Config("Environment name cannot be empty".to_string()));
        }

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(AppError::Config(format!(
                "Invalid log level: {} (expected one of {})",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        if let Some(format) = &self.log_format {
            if format != "json" && format != "pretty" {
                return Err(AppError::Config(format!(
                    "Invalid log format: {} (expected 'json' or 'pretty')",
                    format
                )));
            }
        }

        Ok(())
    }
}

/// Environment-specific configuration presets
pub mod presets {
    use super::ObservabilityConfig;

    /// Development configuration with verbose pretty logs
    pub fn development() -> ObservabilityConfig {
        ObservabilityConfig {
            environment: "development".to_string(),
            log_level: "debug".to_string(),
            ..Default::default()
        }
    }

    /// Test configuration; only warnings and errors
    pub fn test() -> ObservabilityConfig {
        ObservabilityConfig {
            environment: "test".to_string(),
            log_level: "warn".to_string(),
            log_format: Some("pretty".to_string()),
            ..Default::default()
        }
    }

    /// Production configuration with JSON logs
    pub fn production() -> ObservabilityConfig {
        ObservabilityConfig {
            environment: "production".to_string(),
            log_level: "info".to_string(),
            log_format: Some("json".to_string()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.environment, "development");
        assert_eq!(config.log_level, "info");
        assert!(config.use_pretty_logs());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ObservabilityConfig::default();

        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
        config.log_level = "debug".to_string();

        config.log_format = Some("xml".to_string());
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
        config.log_format = Some("json".to_string());
        assert!(config.validate().is_ok());

        config.environment = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_format_selection() {
        assert!(!presets::production().use_pretty_logs());
        assert!(presets::test().use_pretty_logs());

        let staging = ObservabilityConfig {
            environment: "staging".to_string(),
            ..Default::default()
        };
        assert!(!staging.use_pretty_logs());
    }

    #[test]
    fn test_environment_detection() {
        let dev = presets::development();
        assert!(dev.is_development());
        assert!(!dev.is_production());

        let prod = presets::production();
        assert!(!prod.is_development());
        assert!(prod.is_production());
    }
}
