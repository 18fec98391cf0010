//! Minimal Chrome DevTools Protocol client.

mod client;
mod error;
pub(crate) mod protocol;
mod session;

pub use client::{CdpClient, DEFAULT_CALL_TIMEOUT};
pub use error::CdpError;
pub use protocol::{BrowserVersion, TargetInfo};
pub use session::PageSession;
