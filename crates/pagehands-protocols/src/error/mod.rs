//! Error types for the PageHands protocol layer.

mod engine;
mod host;

pub use engine::*;
pub use host::*;
