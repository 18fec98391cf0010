//! # PageHands Protocols
//!
//! Core data model and interface definitions for the PageHands action engine.
//! Contains only types and traits - no implementations.
//!
//! ## Core Types
//!
//! - [`Action`] - One of the four primitives a planner can request
//! - [`ActionRecord`] - Lifecycle record owned by the state manager
//! - [`ActionResult`] - Structured outcome returned to the planner
//! - [`SnapshotElement`] - One deduplicated entry of a page snapshot
//!
//! ## Core Traits
//!
//! - [`PageHost`] - Bridge that executes scripts inside a page and drives navigation

pub mod error;
pub mod host;
pub mod types;

pub use error::{ActionFailure, EngineError, ErrorKind, HostError};
pub use host::{PageHost, PageScript};
pub use types::*;
