//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub host: HostConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Timings and limits of the action engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hard timeout for one in-page script call.
    #[serde(default = "default_script_timeout_ms")]
    pub script_timeout_ms: u64,

    /// Settle interval after scrolling an element into view.
    #[serde(default = "default_scroll_settle_ms")]
    pub scroll_settle_ms: u64,

    /// Settle interval after a click.
    #[serde(default = "default_click_settle_ms")]
    pub click_settle_ms: u64,

    /// Settle interval after the host reports navigation complete.
    #[serde(default = "default_navigation_settle_ms")]
    pub navigation_settle_ms: u64,

    /// Delay between typed characters.
    #[serde(default = "default_typing_delay_ms")]
    pub typing_delay_ms: u64,

    /// Hard cap applied to wait actions.
    #[serde(default = "default_max_wait_seconds")]
    pub max_wait_seconds: u64,

    /// Upper bound of measure passes in accurate mode.
    #[serde(default = "default_stability_passes")]
    pub stability_passes: u32,

    /// Two boxes within this many pixels count as stable.
    #[serde(default = "default_stability_tolerance_px")]
    pub stability_tolerance_px: f64,

    #[serde(default = "default_true")]
    pub cursor_enabled: bool,

    /// Duration of the cursor glide animation.
    #[serde(default = "default_cursor_move_ms")]
    pub cursor_move_ms: u64,

    /// Finished action records kept for inspection.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Maximum length of an element's text in the snapshot.
    #[serde(default = "default_snapshot_text_limit")]
    pub snapshot_text_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            script_timeout_ms: default_script_timeout_ms(),
            scroll_settle_ms: default_scroll_settle_ms(),
            click_settle_ms: default_click_settle_ms(),
            navigation_settle_ms: default_navigation_settle_ms(),
            typing_delay_ms: default_typing_delay_ms(),
            max_wait_seconds: default_max_wait_seconds(),
            stability_passes: default_stability_passes(),
            stability_tolerance_px: default_stability_tolerance_px(),
            cursor_enabled: true,
            cursor_move_ms: default_cursor_move_ms(),
            history_limit: default_history_limit(),
            snapshot_text_limit: default_snapshot_text_limit(),
        }
    }
}

impl EngineConfig {
    pub fn script_timeout(&self) -> Duration {
        Duration::from_millis(self.script_timeout_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn click_settle(&self) -> Duration {
        Duration::from_millis(self.click_settle_ms)
    }

    pub fn navigation_settle(&self) -> Duration {
        Duration::from_millis(self.navigation_settle_ms)
    }

    pub fn typing_delay(&self) -> Duration {
        Duration::from_millis(self.typing_delay_ms)
    }
}

fn default_script_timeout_ms() -> u64 {
    10_000
}

fn default_scroll_settle_ms() -> u64 {
    200
}

fn default_click_settle_ms() -> u64 {
    300
}

fn default_navigation_settle_ms() -> u64 {
    1_000
}

fn default_typing_delay_ms() -> u64 {
    35
}

/// Largest cap a wait action may be configured with.
pub const MAX_WAIT_SECONDS: u64 = 300;

fn default_max_wait_seconds() -> u64 {
    MAX_WAIT_SECONDS
}

fn default_stability_passes() -> u32 {
    3
}

fn default_stability_tolerance_px() -> f64 {
    1.0
}

fn default_cursor_move_ms() -> u64 {
    250
}

fn default_history_limit() -> usize {
    100
}

fn default_snapshot_text_limit() -> usize {
    120
}

fn default_true() -> bool {
    true
}

/// Browser connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// DevTools HTTP endpoint of the user's browser.
    #[serde(default = "default_cdp_endpoint")]
    pub cdp_endpoint: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            cdp_endpoint: default_cdp_endpoint(),
        }
    }
}

fn default_cdp_endpoint() -> String {
    "http://127.0.0.1:9222".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for rotated log files. Defaults to `~/.pagehands/logs`.
    #[serde(default)]
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

impl LoggingConfig {
    /// Resolved log directory, with `~` expanded.
    pub fn log_dir(&self) -> PathBuf {
        match &self.directory {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).as_ref()),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".pagehands")
                .join("logs"),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
