//! Per-action diagnostics.
//!
//! Diagnostics are collected on every run, not only on failure, so a caller
//! can tell which strategy ended up doing the work.

use serde::{Deserialize, Serialize};

use super::ids::Coordinates;

/// Outcome of bringing an element into the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollOutcome {
    /// Already fully inside the viewport; nothing scrolled.
    AlreadyVisible,
    /// Fully visible after scrolling.
    Full,
    /// Only partially visible after scrolling.
    Partial,
    /// Could not be brought into view.
    Failed,
}

/// Step of an action state machine at which it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedStep {
    Lookup,
    Coordinates,
    PointerDispatch,
    BackupLookup,
    BackupClick,
    Focus,
    Typing,
    BulkFallback,
    Navigation,
}

/// Technique used to activate an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickMethod {
    /// Synthetic pointer sequence at the resolved coordinates.
    Pointer,
    /// Select the matching `<option>` of a native `<select>`.
    SelectOption,
    /// Open/toggle an ARIA combobox or listbox option.
    AriaCombobox,
    /// Open a custom (non-ARIA) dropdown trigger.
    CustomDropdown,
    /// `HTMLElement.click()`.
    NativeClick,
    /// Raw pointer/mouse events dispatched on the element.
    RawEvents,
    /// Invoke a framework's delegated click handler directly.
    DelegatedHandler,
}

impl ClickMethod {
    /// Backup methods in the order they are tried.
    pub const BACKUP_ORDER: [ClickMethod; 6] = [
        ClickMethod::SelectOption,
        ClickMethod::AriaCombobox,
        ClickMethod::CustomDropdown,
        ClickMethod::NativeClick,
        ClickMethod::RawEvents,
        ClickMethod::DelegatedHandler,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClickMethod::Pointer => "pointer",
            ClickMethod::SelectOption => "select_option",
            ClickMethod::AriaCombobox => "aria_combobox",
            ClickMethod::CustomDropdown => "custom_dropdown",
            ClickMethod::NativeClick => "native_click",
            ClickMethod::RawEvents => "raw_events",
            ClickMethod::DelegatedHandler => "delegated_handler",
        }
    }
}

/// How the editable target implements editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditTargetKind {
    PlainField,
    ContentEditable,
    RichEditor,
    DelegatedFramework,
}

/// Which typing strategy produced the final value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypingStrategy {
    PerCharacter,
    Bulk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Succeeded,
    Failed,
    /// Strategy did not apply to this element.
    Skipped,
}

/// One strategy attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyAttempt {
    pub strategy: String,
    pub outcome: AttemptOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClickDiagnostics {
    pub scroll: Option<ScrollOutcome>,
    pub coordinates: Option<Coordinates>,
    /// Coordinates came from a box measured before a failed scroll.
    pub stale_coordinates: bool,
    pub cursor_moved: bool,
    pub used_backup: bool,
    pub methods_attempted: Vec<ClickMethod>,
    pub succeeded_with: Option<ClickMethod>,
    pub attempts: Vec<StrategyAttempt>,
    pub failed_step: Option<FailedStep>,
    pub last_error: Option<String>,
}

impl ClickDiagnostics {
    pub fn record(&mut self, method: ClickMethod, outcome: AttemptOutcome, detail: Option<String>) {
        if outcome != AttemptOutcome::Skipped {
            self.methods_attempted.push(method);
        }
        if outcome == AttemptOutcome::Failed {
            self.last_error = detail.clone();
        }
        self.attempts.push(StrategyAttempt {
            strategy: method.as_str().to_string(),
            outcome,
            detail,
        });
    }

    pub fn fail_at(&mut self, step: FailedStep, error: impl ToString) {
        self.failed_step = Some(step);
        self.last_error = Some(error.to_string());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetValueDiagnostics {
    pub scroll: Option<ScrollOutcome>,
    pub coordinates: Option<Coordinates>,
    pub stale_coordinates: bool,
    pub cursor_moved: bool,
    /// Whether the click-to-focus pointer sequence succeeded.
    pub focus_click: bool,
    /// Whether the editable element reported focus after the focus step.
    pub focused: bool,
    pub target: Option<EditTargetKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor_flavor: Option<String>,
    pub steps_total: usize,
    pub steps_completed: usize,
    pub strategy: Option<TypingStrategy>,
    pub attempts: Vec<StrategyAttempt>,
    pub failed_step: Option<FailedStep>,
    pub last_error: Option<String>,
}

impl SetValueDiagnostics {
    pub fn record(&mut self, strategy: &str, outcome: AttemptOutcome, detail: Option<String>) {
        if outcome == AttemptOutcome::Failed {
            self.last_error = detail.clone();
        }
        self.attempts.push(StrategyAttempt {
            strategy: strategy.to_string(),
            outcome,
            detail,
        });
    }

    pub fn fail_at(&mut self, step: FailedStep, error: impl ToString) {
        self.failed_step = Some(step);
        self.last_error = Some(error.to_string());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigateDiagnostics {
    pub url: String,
    pub settle_ms: u64,
    pub failed_step: Option<FailedStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaitDiagnostics {
    pub requested_seconds: f64,
    pub effective_seconds: f64,
    pub clamped: bool,
}

/// Diagnostics for any action kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionDiagnostics {
    #[default]
    None,
    Click(ClickDiagnostics),
    SetValue(SetValueDiagnostics),
    Navigate(NavigateDiagnostics),
    Wait(WaitDiagnostics),
}

impl ActionDiagnostics {
    /// Step at which the action failed, if it recorded one.
    pub fn failed_step(&self) -> Option<FailedStep> {
        match self {
            ActionDiagnostics::Click(d) => d.failed_step,
            ActionDiagnostics::SetValue(d) => d.failed_step,
            ActionDiagnostics::Navigate(d) => d.failed_step,
            ActionDiagnostics::Wait(_) | ActionDiagnostics::None => None,
        }
    }
}

impl From<ClickDiagnostics> for ActionDiagnostics {
    fn from(d: ClickDiagnostics) -> Self {
        ActionDiagnostics::Click(d)
    }
}

impl From<SetValueDiagnostics> for ActionDiagnostics {
    fn from(d: SetValueDiagnostics) -> Self {
        ActionDiagnostics::SetValue(d)
    }
}

impl From<NavigateDiagnostics> for ActionDiagnostics {
    fn from(d: NavigateDiagnostics) -> Self {
        ActionDiagnostics::Navigate(d)
    }
}

impl From<WaitDiagnostics> for ActionDiagnostics {
    fn from(d: WaitDiagnostics) -> Self {
        ActionDiagnostics::Wait(d)
    }
}
