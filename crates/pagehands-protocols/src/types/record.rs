//! Action lifecycle records and results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ActionFailure, ErrorKind};

use super::action::ActionType;
use super::diagnostics::ActionDiagnostics;
use super::ids::ActionId;

/// Lifecycle status of an accepted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl ActionStatus {
    /// Pending and in-progress actions count towards quiescence.
    pub fn is_active(&self) -> bool {
        matches!(self, ActionStatus::Pending | ActionStatus::InProgress)
    }

    pub fn is_finished(&self) -> bool {
        !self.is_active()
    }
}

/// Record of one accepted action. Mutated only by the state manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: ActionId,
    pub action_type: ActionType,
    pub status: ActionStatus,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionRecord {
    pub fn new(id: ActionId, action_type: ActionType) -> Self {
        Self {
            id,
            action_type,
            status: ActionStatus::Pending,
            start_time: Utc::now(),
            end_time: None,
            error: None,
        }
    }
}

/// Structured outcome handed back to the planner, success or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub action_id: ActionId,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub diagnostics: ActionDiagnostics,
}

impl ActionResult {
    pub fn success(action_id: ActionId, duration_ms: u64, diagnostics: ActionDiagnostics) -> Self {
        Self {
            success: true,
            action_id,
            duration_ms,
            error: None,
            error_kind: None,
            diagnostics,
        }
    }

    pub fn failure(action_id: ActionId, duration_ms: u64, failure: ActionFailure) -> Self {
        Self {
            success: false,
            action_id,
            duration_ms,
            error: Some(failure.error.to_string()),
            error_kind: Some(failure.error.kind()),
            diagnostics: failure.diagnostics,
        }
    }
}
