//! Data model shared by the engine, its hosts and its callers.

mod action;
mod diagnostics;
mod ids;
mod record;
mod snapshot;

pub use action::*;
pub use diagnostics::*;
pub use ids::*;
pub use record::*;
pub use snapshot::*;

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
