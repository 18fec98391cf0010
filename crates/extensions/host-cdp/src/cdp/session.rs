//! Page session: one attached tab.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::{Value, json};
use tracing::debug;

use super::client::Transport;
use super::error::CdpError;
use super::protocol::ExceptionDetails;

const LOAD_POLL_INTERVAL: Duration = Duration::from_millis(100);
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Global written into a document before navigating away from it.
const DOCUMENT_MARKER: &str = "__pagehandsDocument";

static NEXT_MARKER: AtomicU64 = AtomicU64::new(1);

/// Commands scoped to one page target.
pub struct PageSession {
    transport: Arc<Transport>,
    target_id: String,
    session_id: String,
}

impl PageSession {
    pub(crate) fn new(transport: Arc<Transport>, target_id: String, session_id: String) -> Self {
        Self {
            transport,
            target_id,
            session_id,
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport
            .call(method, params, Some(&self.session_id))
            .await
    }

    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        self.call("Page.enable", None).await?;
        self.call("Runtime.enable", None).await?;
        Ok(())
    }

    /// Evaluate `expression` and return its value, awaiting promises.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                    "userGesture": true,
                })),
            )
            .await?;
        unwrap_evaluation(result)
    }

    /// Navigate and wait for the new document to finish loading.
    pub async fn navigate(&self, url: &str) -> Result<(), CdpError> {
        // Tag the outgoing document so its readyState is not mistaken for
        // the new one's.
        let marker = format!("ph-{}", NEXT_MARKER.fetch_add(1, Ordering::Relaxed));
        let marked = self.evaluate(&mark_expression(&marker)?).await.is_ok();

        let result = self.call("Page.navigate", Some(json!({ "url": url }))).await?;
        if let Some(error_text) = result.get("errorText").and_then(Value::as_str) {
            return Err(CdpError::NavigationFailed(format!("{}: {}", url, error_text)));
        }

        // No loaderId means a same-document navigation; the marker stays.
        let new_document = result.get("loaderId").is_some();
        let previous = (marked && new_document).then_some(marker.as_str());
        self.wait_for_document(previous).await
    }

    /// Poll `document.readyState` until it reports `complete`.
    pub async fn wait_for_load(&self) -> Result<(), CdpError> {
        self.wait_for_document(None).await
    }

    /// Wait for a complete document that does not carry `previous`.
    async fn wait_for_document(&self, previous: Option<&str>) -> Result<(), CdpError> {
        let expression = format!("[document.readyState, window.{} || null]", DOCUMENT_MARKER);
        let poll = async {
            loop {
                // The old document may already be gone; keep polling.
                if let Ok(state) = self.evaluate(&expression).await {
                    if document_ready(&state, previous) {
                        return;
                    }
                }
                tokio::time::sleep(LOAD_POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(LOAD_TIMEOUT, poll)
            .await
            .map_err(|_| CdpError::Timeout("page load".to_string()))?;
        debug!(target_id = %self.target_id, "Page loaded");
        Ok(())
    }
}

fn mark_expression(marker: &str) -> Result<String, CdpError> {
    Ok(format!(
        "window.{} = {}",
        DOCUMENT_MARKER,
        serde_json::to_string(marker)?
    ))
}

/// `state` is `[readyState, marker]` as reported by the page.
fn document_ready(state: &Value, previous: Option<&str>) -> bool {
    let complete = state.get(0).and_then(Value::as_str) == Some("complete");
    let marker = state.get(1).and_then(Value::as_str);
    complete && (previous.is_none() || marker != previous)
}

/// Pull the value out of a `Runtime.evaluate` result.
fn unwrap_evaluation(result: Value) -> Result<Value, CdpError> {
    if let Some(details) = result.get("exceptionDetails") {
        let details: ExceptionDetails = serde_json::from_value(details.clone())?;
        return Err(CdpError::JavaScript(details.message()));
    }
    let remote = result
        .get("result")
        .ok_or_else(|| CdpError::InvalidResponse("missing result".to_string()))?;
    Ok(remote.get("value").cloned().unwrap_or(Value::Null))
}
