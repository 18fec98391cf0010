//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::{Config, MAX_WAIT_SECONDS};

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn the first error, if any, into a [`ConfigError`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(ConfigError::InvalidValue {
                field: err.path,
                message: err.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_engine(config, &mut result);
        Self::validate_host(config, &mut result);
        Self::validate_logging(config, &mut result);

        Ok(result)
    }

    fn validate_engine(config: &Config, result: &mut ValidationResult) {
        let engine = &config.engine;

        if engine.script_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "engine.script_timeout_ms",
                "script_timeout_ms must be greater than 0",
            ));
        }

        if engine.max_wait_seconds > MAX_WAIT_SECONDS {
            result.add_error(ValidationError::new(
                "engine.max_wait_seconds",
                format!("max_wait_seconds cannot exceed {}", MAX_WAIT_SECONDS),
            ));
        }

        if engine.stability_passes == 0 {
            result.add_error(ValidationError::new(
                "engine.stability_passes",
                "stability_passes must be at least 1",
            ));
        }

        if !engine.stability_tolerance_px.is_finite() || engine.stability_tolerance_px < 0.0 {
            result.add_error(ValidationError::new(
                "engine.stability_tolerance_px",
                "stability_tolerance_px must be a non-negative number",
            ));
        }

        if engine.typing_delay_ms > 1000 {
            result.add_warning(ValidationWarning::new(
                "engine.typing_delay_ms",
                "typing_delay_ms is very high (>1000), long values will take minutes to type",
            ));
        }

        if engine.history_limit == 0 {
            result.add_warning(ValidationWarning::new(
                "engine.history_limit",
                "history_limit is 0, finished actions will not be inspectable",
            ));
        }
    }

    fn validate_host(config: &Config, result: &mut ValidationResult) {
        let endpoint = &config.host.cdp_endpoint;
        if endpoint.is_empty() {
            result.add_error(ValidationError::new(
                "host.cdp_endpoint",
                "cdp_endpoint cannot be empty",
            ));
        } else if !endpoint.starts_with("http://")
            && !endpoint.starts_with("https://")
            && !endpoint.starts_with("ws://")
            && !endpoint.starts_with("wss://")
        {
            result.add_error(ValidationError::new(
                "host.cdp_endpoint",
                "cdp_endpoint must start with http://, https://, ws:// or wss://",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        if config.logging.level.trim().is_empty() {
            result.add_warning(ValidationWarning::new(
                "logging.level",
                "logging.level is empty, falling back to info",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
