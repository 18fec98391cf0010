//! CLI definitions for PageHands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// PageHands CLI.
#[derive(Parser)]
#[command(name = "pagehands")]
#[command(about = "Act on a live browser page the way a planner would")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path. Defaults to ~/.pagehands/config.toml when present.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the DevTools endpoint from the config file
    #[arg(long, env = "PAGEHANDS_CDP_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Attach to the first tab whose URL contains this text
    #[arg(long, global = true)]
    pub tab_url_contains: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Print the numbered element snapshot of the attached tab
    Snapshot {
        /// Print the structured snapshot as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Click the element with this snapshot index
    Click { handle: u32 },

    /// Type text into the element with this snapshot index
    Type {
        handle: u32,
        /// Text to type. `\n` starts a new line, `{clear}` empties the field.
        text: String,
    },

    /// Navigate the attached tab
    Navigate { url: String },

    /// Sleep for a number of seconds
    Wait { seconds: f64 },

    /// Run a JSON array of actions, e.g. [{"type": "click", "handle": 3}],
    /// printing a fresh snapshot after each one
    Run { file: PathBuf },

    /// Validate the configuration file and print the effective values
    CheckConfig,
}
