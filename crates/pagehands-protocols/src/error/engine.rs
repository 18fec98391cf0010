//! Engine error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ActionDiagnostics, ActionId, ElementHandle, SnapshotGeneration, TabId};

/// Errors surfaced by the action engine.
///
/// Strategy-level failures never appear here; they are absorbed by the
/// fallback chains and only show up as [`EngineError::TerminalFailure`] once
/// every strategy is exhausted.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Element {handle} not found: {reason}")]
    NotFound {
        handle: ElementHandle,
        reason: String,
    },

    #[error("Script '{script}' timed out after {timeout_ms}ms")]
    ScriptTimeout { script: String, timeout_ms: u64 },

    #[error("Script '{script}' failed: {message}")]
    ScriptExecution { script: String, message: String },

    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// The page or registry moved on while this snapshot was being taken.
    #[error("Snapshot {generation} was superseded by generation {current}")]
    SnapshotSuperseded {
        generation: SnapshotGeneration,
        current: SnapshotGeneration,
    },

    #[error("Action cancelled after {completed} of {total} edit steps")]
    Cancelled { completed: usize, total: usize },

    #[error("No tab is bound to this engine")]
    TabNotBound,

    #[error("Engine is already bound to tab {0}")]
    TabAlreadyBound(TabId),

    #[error("Unknown action: {0}")]
    UnknownAction(ActionId),

    #[error("Illegal state transition for action {id}: {message}")]
    IllegalTransition { id: ActionId, message: String },

    #[error("All strategies exhausted: {0}")]
    TerminalFailure(String),
}

impl EngineError {
    /// Create a not-found error for a handle.
    pub fn not_found(handle: ElementHandle, reason: impl Into<String>) -> Self {
        Self::NotFound {
            handle,
            reason: reason.into(),
        }
    }

    /// Coarse classification reported to the planner.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ScriptTimeout { .. } => ErrorKind::ScriptTimeout,
            Self::ScriptExecution { .. } => ErrorKind::ScriptExecution,
            Self::Navigation(_) => ErrorKind::Navigation,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::TabNotBound | Self::TabAlreadyBound(_) => ErrorKind::Binding,
            Self::UnknownAction(_)
            | Self::IllegalTransition { .. }
            | Self::SnapshotSuperseded { .. } => ErrorKind::State,
            Self::TerminalFailure(_) => ErrorKind::TerminalFailure,
        }
    }
}

/// Error classification carried by [`crate::ActionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    ScriptTimeout,
    ScriptExecution,
    Navigation,
    Cancelled,
    Binding,
    State,
    TerminalFailure,
}

/// A failed action together with everything learned while attempting it.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct ActionFailure {
    #[source]
    pub error: EngineError,
    pub diagnostics: ActionDiagnostics,
}

impl ActionFailure {
    pub fn new(error: EngineError, diagnostics: impl Into<ActionDiagnostics>) -> Self {
        Self {
            error,
            diagnostics: diagnostics.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl From<EngineError> for ActionFailure {
    fn from(error: EngineError) -> Self {
        Self {
            error,
            diagnostics: ActionDiagnostics::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClickDiagnostics, FailedStep};

    #[test]
    fn test_not_found_display() {
        let err = EngineError::not_found(ElementHandle(4), "node detached");
        let display = err.to_string();
        assert!(display.contains("Element 4 not found"));
        assert!(display.contains("node detached"));
    }

    #[test]
    fn test_script_timeout_display() {
        let err = EngineError::ScriptTimeout {
            script: "snapshot_walk".to_string(),
            timeout_ms: 10_000,
        };
        assert_eq!(
            err.to_string(),
            "Script 'snapshot_walk' timed out after 10000ms"
        );
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            EngineError::Validation("x".to_string()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            EngineError::Cancelled {
                completed: 1,
                total: 3
            }
            .kind(),
            ErrorKind::Cancelled
        );
        assert_eq!(EngineError::TabNotBound.kind(), ErrorKind::Binding);
        assert_eq!(
            EngineError::TerminalFailure("x".to_string()).kind(),
            ErrorKind::TerminalFailure
        );
    }

    #[test]
    fn test_action_failure_keeps_diagnostics() {
        let mut diag = ClickDiagnostics::default();
        diag.failed_step = Some(FailedStep::Lookup);
        let failure = ActionFailure::new(
            EngineError::not_found(ElementHandle(1), "never issued"),
            diag,
        );
        assert_eq!(failure.kind(), ErrorKind::NotFound);
        match failure.diagnostics {
            ActionDiagnostics::Click(ref d) => assert_eq!(d.failed_step, Some(FailedStep::Lookup)),
            ref other => panic!("unexpected diagnostics: {:?}", other),
        }
        assert!(failure.to_string().contains("never issued"));
    }

    #[test]
    fn test_action_failure_from_engine_error() {
        let failure: ActionFailure = EngineError::TabNotBound.into();
        assert!(matches!(failure.diagnostics, ActionDiagnostics::None));
    }

    #[test]
    fn test_error_kind_serialization() {
        let json = serde_json::to_string(&ErrorKind::TerminalFailure).unwrap();
        assert_eq!(json, "\"terminal_failure\"");
    }
}
