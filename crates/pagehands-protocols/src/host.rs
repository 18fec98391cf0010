//! Page host trait definition.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::HostError;
use crate::types::TabId;

/// A script that runs inside the page.
///
/// `source` is a single JavaScript function expression. The host calls it
/// with JSON arguments and hands back whatever it returns, serialized by
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageScript {
    pub name: &'static str,
    pub source: &'static str,
}

impl PageScript {
    pub const fn new(name: &'static str, source: &'static str) -> Self {
        Self { name, source }
    }

    /// Build a self-invoking expression, `(source)(arg0, arg1, ...)`.
    pub fn to_expression(&self, args: &[Value]) -> Result<String, serde_json::Error> {
        let mut rendered = Vec::with_capacity(args.len());
        for arg in args {
            rendered.push(serde_json::to_string(arg)?);
        }
        Ok(format!("({})({})", self.source.trim(), rendered.join(", ")))
    }
}

/// Bridge between the engine and a live page.
///
/// Implementations execute scripts in the context of one tab and drive its
/// navigation. They carry no action semantics.
#[async_trait]
pub trait PageHost: Send + Sync {
    /// Run `script` in `tab` with `args`, returning its JSON result.
    async fn run_script(
        &self,
        tab: TabId,
        script: &PageScript,
        args: Vec<Value>,
    ) -> Result<Value, HostError>;

    /// Point `tab` at `url` and wait until the host considers it loaded.
    async fn set_url(&self, tab: TabId, url: &str) -> Result<(), HostError>;
}
