//! CDP error types.

use thiserror::Error;

use pagehands_protocols::HostError;

/// CDP client errors.
#[derive(Debug, Error)]
pub enum CdpError {
    /// Failed to connect to the browser.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Browser not running with remote debugging.
    #[error("Chrome not available at {0}. Start Chrome with: chrome --remote-debugging-port=9222")]
    ChromeNotAvailable(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Error object returned for a command.
    #[error("CDP error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error during endpoint discovery.
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("No page target matches: {0}")]
    PageNotFound(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// Exception thrown by evaluated script.
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Session closed")]
    SessionClosed,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(e.to_string())
    }
}

impl From<reqwest::Error> for CdpError {
    fn from(e: reqwest::Error) -> Self {
        CdpError::Http(e.to_string())
    }
}

impl From<url::ParseError> for CdpError {
    fn from(e: url::ParseError) -> Self {
        CdpError::ConnectionFailed(format!("Invalid URL: {}", e))
    }
}

impl From<CdpError> for HostError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::Timeout(what) => HostError::Timeout(what),
            CdpError::JavaScript(message) => HostError::Script(message),
            CdpError::Protocol { message, .. } => HostError::Script(message),
            CdpError::NavigationFailed(message) => HostError::Navigation(message),
            CdpError::SessionClosed => HostError::Disconnected("session closed".to_string()),
            CdpError::ConnectionFailed(message)
            | CdpError::ChromeNotAvailable(message)
            | CdpError::WebSocket(message)
            | CdpError::Http(message) => HostError::Disconnected(message),
            CdpError::Serialization(e) => HostError::InvalidResponse(e.to_string()),
            CdpError::InvalidResponse(message) | CdpError::PageNotFound(message) => {
                HostError::InvalidResponse(message)
            }
        }
    }
}
