//! # PageHands CDP host
//!
//! Drives a Chrome the user already has open, over the DevTools Protocol.
//!
//! ## Setup
//!
//! Start Chrome with remote debugging enabled:
//!
//! ```bash
//! # macOS
//! /Applications/Google\ Chrome.app/Contents/MacOS/Google\ Chrome --remote-debugging-port=9222
//!
//! # Linux
//! google-chrome --remote-debugging-port=9222
//! ```
//!
//! Then attach a tab and hand the host to an engine:
//!
//! ```ignore
//! let host = Arc::new(CdpHost::connect("http://127.0.0.1:9222").await?);
//! let tab = host.attach_first_page(Some("example.com")).await?;
//! let engine = PageEngine::new(host, config);
//! engine.bind_tab(tab)?;
//! ```

pub mod cdp;
mod host;

pub use cdp::{CdpClient, CdpError};
pub use host::CdpHost;
