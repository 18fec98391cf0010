//! Navigate.

use tracing::{info, warn};
use url::Url;

use pagehands_protocols::{ActionFailure, EngineError, FailedStep, NavigateDiagnostics};

use super::ActionExecutor;
use crate::context::PageContext;

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "file", "about"];

/// Parse an absolute URL the tab may be pointed at.
pub fn validate_url(raw: &str) -> Result<Url, EngineError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation("url cannot be empty".to_string()));
    }
    let url = Url::parse(trimmed)
        .map_err(|e| EngineError::Validation(format!("invalid url '{}': {}", trimmed, e)))?;
    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(EngineError::Validation(format!(
            "unsupported url scheme '{}'",
            url.scheme()
        )));
    }
    Ok(url)
}

impl ActionExecutor {
    /// Point the bound tab at `url` and wait for it to settle.
    ///
    /// Every handle is invalidated once the host has been asked to navigate,
    /// whether or not it reports success.
    pub async fn navigate(
        &self,
        ctx: &PageContext,
        url: &str,
    ) -> Result<NavigateDiagnostics, ActionFailure> {
        let mut diag = NavigateDiagnostics {
            url: url.to_string(),
            ..NavigateDiagnostics::default()
        };
        let parsed = validate_url(url).map_err(|e| ActionFailure::new(e, diag.clone()))?;
        diag.url = parsed.to_string();
        info!(url = %parsed, "Executing navigate");

        let outcome = ctx.set_url(parsed.as_str()).await;
        self.registry.invalidate();
        if let Err(e) = outcome {
            warn!(url = %parsed, error = %e, "Navigation failed");
            diag.failed_step = Some(FailedStep::Navigation);
            return Err(ActionFailure::new(EngineError::Navigation(e.to_string()), diag));
        }

        let settle = ctx.config().navigation_settle();
        tokio::time::sleep(settle).await;
        diag.settle_ms = settle.as_millis() as u64;

        info!(url = %parsed, "Navigate completed");
        Ok(diag)
    }
}
