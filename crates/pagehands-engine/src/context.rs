//! Script execution against the bound tab.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use pagehands_config::EngineConfig;
use pagehands_protocols::{EngineError, HostError, PageHost, PageScript, TabId};

/// Everything an operation needs to talk to its page.
#[derive(Clone)]
pub struct PageContext {
    host: Arc<dyn PageHost>,
    tab: TabId,
    config: Arc<EngineConfig>,
}

impl PageContext {
    pub fn new(host: Arc<dyn PageHost>, tab: TabId, config: Arc<EngineConfig>) -> Self {
        Self { host, tab, config }
    }

    pub fn tab(&self) -> TabId {
        self.tab
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run `script` with the configured hard timeout and decode its result.
    pub async fn run<T: DeserializeOwned>(
        &self,
        script: &PageScript,
        args: Vec<Value>,
    ) -> Result<T, EngineError> {
        let value = self.run_raw(script, args).await?;
        serde_json::from_value(value).map_err(|e| EngineError::ScriptExecution {
            script: script.name.to_string(),
            message: format!("unexpected result shape: {}", e),
        })
    }

    /// Run `script` and hand back its JSON result untouched.
    pub async fn run_raw(&self, script: &PageScript, args: Vec<Value>) -> Result<Value, EngineError> {
        let timeout = self.config.script_timeout();
        debug!(script = script.name, tab = %self.tab, "Running page script");

        let call = self.host.run_script(self.tab, script, args);
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(HostError::Timeout(_))) | Err(_) => {
                warn!(script = script.name, "Page script timed out");
                Err(EngineError::ScriptTimeout {
                    script: script.name.to_string(),
                    timeout_ms: self.config.script_timeout_ms,
                })
            }
            Ok(Err(e)) => Err(EngineError::ScriptExecution {
                script: script.name.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Navigate the bound tab. Host errors are returned untouched.
    pub async fn set_url(&self, url: &str) -> Result<(), HostError> {
        self.host.set_url(self.tab, url).await
    }
}
