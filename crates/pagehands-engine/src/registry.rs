//! Element registry.
//!
//! Maps the handles of the current snapshot generation to live nodes. The
//! page keeps the nodes themselves (parked by the walker); this side keeps a
//! generation-tagged arena of raw indices plus the stable identifier stamped
//! onto a node the first time its handle is resolved.

use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use pagehands_protocols::{ElementHandle, EngineError, SnapshotGeneration};

use crate::context::PageContext;
use crate::scripts;

/// One handle's slot in the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Position of the node in the page-side parked table.
    pub raw_index: usize,
    /// Stamp value, once learned.
    pub stable_id: Option<String>,
}

impl RegistryEntry {
    pub fn new(raw_index: usize) -> Self {
        Self {
            raw_index,
            stable_id: None,
        }
    }
}

/// A handle resolved to a live, stamped node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedElement {
    pub handle: ElementHandle,
    pub generation: SnapshotGeneration,
    pub stable_id: String,
}

#[derive(Debug, Default)]
struct Arena {
    /// Generation of the installed entries.
    generation: SnapshotGeneration,
    /// Highest generation handed out, installed or not.
    reserved: SnapshotGeneration,
    entries: Vec<RegistryEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum LocateStatus {
    Found,
    Missing,
    Detached,
    Stale,
}

#[derive(Debug, Deserialize)]
struct LocateReply {
    status: LocateStatus,
    id: Option<String>,
}

/// Handle to live-node mapping for one snapshot generation at a time.
#[derive(Debug, Default)]
pub struct ElementRegistry {
    arena: RwLock<Arena>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> SnapshotGeneration {
        self.arena.read().generation
    }

    /// Number of handles issued by the current generation.
    pub fn len(&self) -> usize {
        self.arena.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reserve a generation number for a snapshot pass.
    ///
    /// Every call returns a distinct, increasing generation.
    pub fn next_generation(&self) -> SnapshotGeneration {
        let mut arena = self.arena.write();
        arena.reserved = arena.reserved.max(arena.generation).next();
        arena.reserved
    }

    /// Replace the arena wholesale. Every earlier handle becomes invalid.
    ///
    /// Only a generation strictly newer than the installed one is accepted,
    /// so a pass that finishes late cannot replace a newer arena.
    pub fn install(&self, generation: SnapshotGeneration, entries: Vec<RegistryEntry>) -> bool {
        let mut arena = self.arena.write();
        if generation <= arena.generation {
            debug!(%generation, current = %arena.generation, "Ignoring superseded snapshot install");
            return false;
        }
        arena.generation = generation;
        arena.reserved = arena.reserved.max(generation);
        arena.entries = entries;
        true
    }

    /// Drop every handle without installing a new snapshot.
    ///
    /// Passes reserved before this call can no longer install.
    pub fn invalidate(&self) {
        let mut arena = self.arena.write();
        let generation = arena.reserved.max(arena.generation).next();
        arena.generation = generation;
        arena.reserved = generation;
        arena.entries.clear();
    }

    pub fn entry(&self, handle: ElementHandle) -> Option<RegistryEntry> {
        self.arena.read().entries.get(handle.index()).cloned()
    }

    /// Resolve `handle` to a live node, stamping it on first use.
    pub async fn resolve(
        &self,
        ctx: &PageContext,
        handle: ElementHandle,
    ) -> Result<ResolvedElement, EngineError> {
        let (generation, entry) = {
            let arena = self.arena.read();
            match arena.entries.get(handle.index()) {
                Some(entry) => (arena.generation, entry.clone()),
                None => {
                    return Err(EngineError::not_found(
                        handle,
                        "handle was not issued by the current snapshot",
                    ));
                }
            }
        };

        let stamp = stamp_for(generation, handle);
        let reply: LocateReply = ctx
            .run(
                &scripts::LOCATE,
                vec![
                    json!(generation.0),
                    json!(entry.raw_index),
                    json!(entry.stable_id),
                    json!(stamp),
                ],
            )
            .await?;

        match reply.status {
            LocateStatus::Found => {
                let stable_id = reply.id.unwrap_or(stamp);
                if entry.stable_id.is_none() {
                    self.remember(generation, handle, &stable_id);
                }
                Ok(ResolvedElement {
                    handle,
                    generation,
                    stable_id,
                })
            }
            LocateStatus::Missing => Err(EngineError::not_found(
                handle,
                "node is no longer in the document",
            )),
            LocateStatus::Detached => Err(EngineError::not_found(handle, "node was detached")),
            LocateStatus::Stale => Err(EngineError::not_found(
                handle,
                "page no longer holds this snapshot",
            )),
        }
    }

    fn remember(&self, generation: SnapshotGeneration, handle: ElementHandle, stable_id: &str) {
        let mut arena = self.arena.write();
        if arena.generation != generation {
            return;
        }
        if let Some(entry) = arena.entries.get_mut(handle.index()) {
            entry.stable_id = Some(stable_id.to_string());
        }
    }
}

/// Stamp value written onto a node resolved for the first time.
pub fn stamp_for(generation: SnapshotGeneration, handle: ElementHandle) -> String {
    format!("ph-{}-{}", generation, handle)
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
