//! Action requests.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;

use super::ids::ElementHandle;

/// A primitive the planner can request.
///
/// Deserializes from `{"type": ..., ...payload}`. Type names accept both the
/// canonical snake_case form and the planner's gerund vocabulary
/// (`clicking`, `typing`, `navigating`, `waiting`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    #[serde(alias = "clicking")]
    Click {
        #[serde(alias = "index")]
        handle: ElementHandle,
    },
    #[serde(alias = "setValue", alias = "typing", alias = "type")]
    SetValue {
        #[serde(alias = "index")]
        handle: ElementHandle,
        #[serde(alias = "value")]
        text: String,
    },
    #[serde(alias = "navigating", alias = "goto")]
    Navigate { url: String },
    #[serde(alias = "waiting")]
    Wait { seconds: f64 },
}

impl Action {
    /// Build an action from a request type name and its JSON payload.
    ///
    /// The result is validated; malformed payloads are a
    /// [`EngineError::Validation`].
    pub fn from_request(action_type: &str, payload: Value) -> Result<Self, EngineError> {
        let mut object = match payload {
            Value::Object(map) => map,
            Value::Null => serde_json::Map::new(),
            other => {
                return Err(EngineError::Validation(format!(
                    "payload for '{}' must be an object, got {}",
                    action_type, other
                )));
            }
        };
        object.insert("type".to_string(), Value::String(action_type.to_string()));

        let action: Action = serde_json::from_value(Value::Object(object)).map_err(|e| {
            EngineError::Validation(format!("invalid '{}' payload: {}", action_type, e))
        })?;
        action.validate()?;
        Ok(action)
    }

    /// Check payload invariants that the type system cannot express.
    pub fn validate(&self) -> Result<(), EngineError> {
        match self {
            Action::Wait { seconds } => {
                if !seconds.is_finite() {
                    return Err(EngineError::Validation(
                        "wait duration must be a finite number".to_string(),
                    ));
                }
                if *seconds < 0.0 {
                    return Err(EngineError::Validation(format!(
                        "wait duration cannot be negative (got {})",
                        seconds
                    )));
                }
                Ok(())
            }
            Action::Navigate { url } => {
                if url.trim().is_empty() {
                    return Err(EngineError::Validation("url cannot be empty".to_string()));
                }
                Ok(())
            }
            Action::Click { .. } | Action::SetValue { .. } => Ok(()),
        }
    }

    pub fn action_type(&self) -> ActionType {
        match self {
            Action::Click { .. } => ActionType::Click,
            Action::SetValue { .. } => ActionType::SetValue,
            Action::Navigate { .. } => ActionType::Navigate,
            Action::Wait { .. } => ActionType::Wait,
        }
    }

    /// Target handle, for actions that have one.
    pub fn handle(&self) -> Option<ElementHandle> {
        match self {
            Action::Click { handle } | Action::SetValue { handle, .. } => Some(*handle),
            Action::Navigate { .. } | Action::Wait { .. } => None,
        }
    }
}

/// Action kind without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Click,
    SetValue,
    Navigate,
    Wait,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Click => "click",
            ActionType::SetValue => "set_value",
            ActionType::Navigate => "navigate",
            ActionType::Wait => "wait",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
