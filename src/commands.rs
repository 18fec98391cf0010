//! Subcommand handlers.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use pagehands_config::Config;
use pagehands_engine::PageEngine;
use pagehands_host_cdp::CdpHost;
use pagehands_protocols::{ActionResult, ElementHandle};

use crate::cli::Commands;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Connect to the browser, attach a tab and build an engine bound to it.
pub(crate) async fn connect_engine(
    config: &Config,
    endpoint: &str,
    tab_url_contains: Option<&str>,
) -> Result<Arc<PageEngine>, Box<dyn std::error::Error>> {
    let host = Arc::new(CdpHost::connect(endpoint).await?);
    let tab = host.attach_first_page(tab_url_contains).await?;
    let engine = Arc::new(PageEngine::new(host, config.engine.clone()));
    engine.bind_tab(tab)?;
    Ok(engine)
}

pub(crate) async fn run(engine: &PageEngine, command: Commands) -> CliResult {
    match command {
        Commands::Snapshot { json } => {
            if json {
                let snapshot = engine.snapshot().await?;
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                println!("{}", engine.extract_snapshot().await);
            }
            Ok(())
        }
        Commands::Click { handle } => {
            // Handles only exist after a snapshot.
            engine.snapshot().await?;
            print_result(&engine.click(ElementHandle(handle)).await)
        }
        Commands::Type { handle, text } => {
            engine.snapshot().await?;
            print_result(&engine.set_value(ElementHandle(handle), text).await)
        }
        Commands::Navigate { url } => print_result(&engine.navigate(url).await),
        Commands::Wait { seconds } => print_result(&engine.wait(seconds).await),
        Commands::Run { file } => run_script_file(engine, &file).await,
        Commands::CheckConfig => Ok(()),
    }
}

/// Execute every action in `file` in order, stopping at the first failure.
async fn run_script_file(engine: &PageEngine, file: &Path) -> CliResult {
    let content = std::fs::read_to_string(file)?;
    let steps: Vec<Value> = serde_json::from_str(&content)?;
    info!(file = %file.display(), steps = steps.len(), "Running action file");

    // Start from fresh handles.
    println!("{}", engine.extract_snapshot().await);

    for (index, step) in steps.into_iter().enumerate() {
        let (action_type, payload) = split_step(step)?;
        let result = engine.run_action(&action_type, payload).await;
        print_result(&result)?;
        if !result.success {
            warn!(step = index, action = %action_type, "Stopping after failed action");
            break;
        }
        println!("{}", engine.extract_snapshot().await);
    }
    Ok(())
}

/// Split `{"type": "click", "handle": 2}` into its type and payload.
pub(crate) fn split_step(step: Value) -> Result<(String, Value), String> {
    let Value::Object(mut object) = step else {
        return Err(format!("action must be an object, got {}", step));
    };
    let action_type = match object.remove("type") {
        Some(Value::String(t)) => t,
        _ => return Err("action is missing a string \"type\"".to_string()),
    };
    Ok((action_type, Value::Object(object)))
}

fn print_result(result: &ActionResult) -> CliResult {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
