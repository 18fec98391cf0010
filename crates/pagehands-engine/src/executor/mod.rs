//! Action executor.
//!
//! Stateless dispatch of the four primitives. Each primitive runs a primary
//! strategy and falls back through an ordered chain; individual strategy
//! failures stay internal ([`StrategyFailure`]) and only a terminal failure
//! reaches the caller, together with the diagnostics gathered on the way.

mod click;
mod editing;
mod navigate;
mod set_value;
mod typing;
mod wait;

use std::sync::Arc;

use thiserror::Error;

use pagehands_protocols::EngineError;

use crate::cursor::CursorSimulator;
use crate::registry::ElementRegistry;
use crate::resolver::CoordinateResolver;

pub use editing::{EditTarget, EditingSurface, EditorFlavor, Fingerprint};
pub use navigate::validate_url;
pub use typing::{EditOp, TypingPlan};
pub use wait::clamp_wait;

/// Failure of one strategy. Triggers the next fallback.
#[derive(Debug, Error)]
pub enum StrategyFailure {
    #[error("strategy does not apply to this element")]
    NotApplicable,

    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Runs actions against the page bound to a [`crate::PageContext`].
pub struct ActionExecutor {
    registry: Arc<ElementRegistry>,
    cursor: Arc<CursorSimulator>,
    resolver: CoordinateResolver,
}

impl ActionExecutor {
    pub fn new(registry: Arc<ElementRegistry>, cursor: Arc<CursorSimulator>) -> Self {
        Self {
            registry,
            cursor,
            resolver: CoordinateResolver::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ElementRegistry> {
        &self.registry
    }

    pub fn cursor(&self) -> &Arc<CursorSimulator> {
        &self.cursor
    }
}
