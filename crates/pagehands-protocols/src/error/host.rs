//! Errors reported by a page host.

use thiserror::Error;

use crate::types::TabId;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Tab not found: {0}")]
    TabNotFound(TabId),

    #[error("Script failed in page: {0}")]
    Script(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Host call timed out: {0}")]
    Timeout(String),

    #[error("Host disconnected: {0}")]
    Disconnected(String),

    #[error("Invalid host response: {0}")]
    InvalidResponse(String),
}

impl From<serde_json::Error> for HostError {
    fn from(e: serde_json::Error) -> Self {
        HostError::InvalidResponse(e.to_string())
    }
}
