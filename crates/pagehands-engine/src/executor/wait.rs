//! Wait.

use std::time::Duration;

use tracing::info;

use pagehands_config::EngineConfig;
use pagehands_protocols::{ActionFailure, EngineError, WaitDiagnostics};

use super::ActionExecutor;

/// Validate `seconds` and clamp it to `max_seconds`.
///
/// Returns the effective duration and whether it was clamped.
pub fn clamp_wait(seconds: f64, max_seconds: u64) -> Result<(f64, bool), EngineError> {
    if !seconds.is_finite() {
        return Err(EngineError::Validation(
            "wait duration must be a finite number".to_string(),
        ));
    }
    if seconds < 0.0 {
        return Err(EngineError::Validation(format!(
            "wait duration cannot be negative (got {})",
            seconds
        )));
    }
    let max = max_seconds as f64;
    if seconds > max {
        Ok((max, true))
    } else {
        Ok((seconds, false))
    }
}

impl ActionExecutor {
    /// Sleep for `seconds`, capped at the configured maximum.
    pub async fn wait(
        &self,
        config: &EngineConfig,
        seconds: f64,
    ) -> Result<WaitDiagnostics, ActionFailure> {
        let (effective, clamped) = clamp_wait(seconds, config.max_wait_seconds)?;
        info!(requested = seconds, effective, clamped, "Executing wait");

        tokio::time::sleep(Duration::from_secs_f64(effective)).await;

        Ok(WaitDiagnostics {
            requested_seconds: seconds,
            effective_seconds: effective,
            clamped,
        })
    }
}
