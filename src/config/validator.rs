//! Configuration validator for memedit
//!
//! Validates configuration values to ensure they are within acceptable ranges.

use super::loader::{Config, ConfigError, DisplayConfig, LoggingConfig, ScannerConfig};
use tracing::warn;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire configuration
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_scanner(&config.scanner)?;
        Self::validate_display(&config.display)?;
        Self::validate_logging(&config.logging)?;
        Ok(())
    }

    /// Validates scanner configuration
    fn validate_scanner(scanner: &ScannerConfig) -> Result<(), ConfigError> {
        if !scanner.float_tolerance.is_finite() || scanner.float_tolerance < 0.0 {
            return Err(ConfigError::Invalid(
                "Float tolerance must be a finite, non-negative number".to_string(),
            ));
        }

        // Chunks must stay aligned to every value width
        if scanner.chunk_size < 4 || !scanner.chunk_size.is_power_of_two() {
            return Err(ConfigError::Invalid(
                "Chunk size must be a power of 2 and at least 4".to_string(),
            ));
        }

        if scanner.max_threads == 0 {
            return Err(ConfigError::Invalid(
                "Scanner threads must be at least 1".to_string(),
            ));
        }

        if scanner.max_threads > 128 {
            return Err(ConfigError::Invalid(
                "Scanner threads cannot exceed 128".to_string(),
            ));
        }

        if scanner.float_tolerance > 1.0 {
            warn!(
                tolerance = scanner.float_tolerance,
                "float tolerance above 1.0 will match many unrelated values"
            );
        }

        Ok(())
    }

    /// Validates display configuration
    fn validate_display(display: &DisplayConfig) -> Result<(), ConfigError> {
        if display.max_rows == 0 {
            return Err(ConfigError::Invalid(
                "Display must show at least 1 row".to_string(),
            ));
        }
        Ok(())
    }

    /// Validates logging configuration
    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                logging.level, valid_levels
            )));
        }
        Ok(())
    }
}

/// Validates a configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    ConfigValidator::validate(config)
}
