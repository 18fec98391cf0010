//! # PageHands Engine
//!
//! Drives an arbitrary web page on behalf of a planner:
//!
//! - [`SnapshotExtractor`] walks the document and renders the compact text
//!   the planner reads, issuing one [`ElementHandle`] per element
//! - [`ElementRegistry`] maps handles back to live nodes across script calls
//! - [`CoordinateResolver`] scrolls an element into view and waits for its
//!   layout to settle
//! - [`CursorSimulator`] animates a visible on-page pointer
//! - [`ActionExecutor`] runs click, set-value, navigate and wait with their
//!   fallback chains
//! - [`ActionStateManager`] tracks action lifecycles and serializes execution
//!
//! [`PageEngine`] ties them together over a single bound tab.
//!
//! [`ElementHandle`]: pagehands_protocols::ElementHandle

pub mod context;
pub mod cursor;
pub mod engine;
pub mod executor;
pub mod registry;
pub mod resolver;
pub mod scripts;
pub mod snapshot;
pub mod state;

pub use context::PageContext;
pub use cursor::CursorSimulator;
pub use engine::PageEngine;
pub use executor::{ActionExecutor, EditTarget, StrategyFailure, TypingPlan};
pub use registry::{ElementRegistry, ResolvedElement};
pub use resolver::{CoordinateResolver, ResolvedPoint};
pub use snapshot::{SNAPSHOT_UNAVAILABLE, SnapshotExtractor};
pub use state::{ActionGuard, ActionStateManager};
