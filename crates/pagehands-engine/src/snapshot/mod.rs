//! Snapshot extraction.
//!
//! One pass runs the walker in the page, post-processes its records in
//! [`pipeline`], installs the resulting arena into the registry and renders
//! the text the planner reads.

pub mod pipeline;
pub mod render;

use serde_json::json;
use tokio::sync::Mutex;
use tracing::{info, warn};

use pagehands_protocols::{EngineError, Snapshot};

use crate::context::PageContext;
use crate::registry::ElementRegistry;
use crate::scripts;

pub use pipeline::{ALLOWED_ATTRIBUTES, RawNode, RawSnapshot, SKIP_TAGS};
pub use render::{SNAPSHOT_UNAVAILABLE, render, render_element};

/// Produces snapshots and keeps the registry in step with them.
///
/// Passes run one at a time: the walker replaces the page-side node table,
/// so the last walker to run must also be the last arena installed.
#[derive(Debug, Default)]
pub struct SnapshotExtractor {
    pass: Mutex<()>,
}

impl SnapshotExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a snapshot and make its handles current.
    ///
    /// Fails with [`EngineError::SnapshotSuperseded`] when the registry was
    /// invalidated mid-pass, since the returned handles would never resolve.
    pub async fn extract(
        &self,
        ctx: &PageContext,
        registry: &ElementRegistry,
    ) -> Result<Snapshot, EngineError> {
        let _pass = self.pass.lock().await;
        let generation = registry.next_generation();
        let text_limit = ctx.config().snapshot_text_limit;

        let raw: RawSnapshot = ctx
            .run(
                &scripts::SNAPSHOT_WALKER,
                vec![
                    json!(generation.0),
                    json!(text_limit),
                    json!(SKIP_TAGS),
                    json!(ALLOWED_ATTRIBUTES),
                ],
            )
            .await?;
        let raw_count = raw.nodes.len();

        let (snapshot, entries) = pipeline::build(raw, generation, text_limit);
        if !registry.install(generation, entries) {
            let current = registry.generation();
            warn!(%generation, %current, "Snapshot superseded while extracting");
            return Err(EngineError::SnapshotSuperseded {
                generation,
                current,
            });
        }

        info!(
            %generation,
            raw_nodes = raw_count,
            elements = snapshot.len(),
            "Snapshot extracted"
        );
        Ok(snapshot)
    }

    /// Take a snapshot and render it, or the fixed sentinel on failure.
    pub async fn extract_text(&self, ctx: &PageContext, registry: &ElementRegistry) -> String {
        match self.extract(ctx, registry).await {
            Ok(snapshot) => render(&snapshot),
            Err(e) => {
                warn!(error = %e, "Snapshot extraction failed");
                SNAPSHOT_UNAVAILABLE.to_string()
            }
        }
    }
}
