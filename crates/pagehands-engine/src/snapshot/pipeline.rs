//! Pure post-processing of the walker's raw node records.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use pagehands_protocols::{
    ElementHandle, ElementSignature, Snapshot, SnapshotElement, SnapshotGeneration,
};

use crate::registry::RegistryEntry;
use crate::scripts::STAMP_ATTRIBUTE;

/// Tags that never carry planner-relevant content.
pub const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "meta", "link", "head", "title", "base", "svg",
    "path", "br", "hr", "wbr",
];

/// Attributes copied into the snapshot. `aria-*` admits every ARIA attribute.
pub const ALLOWED_ATTRIBUTES: &[&str] = &[
    "role",
    "type",
    "name",
    "placeholder",
    "title",
    "alt",
    "href",
    "contenteditable",
    "aria-*",
];

/// Attributes that say nothing about which element this is.
const NON_IDENTIFYING: &[&str] = &[
    "type",
    "contenteditable",
    "aria-hidden",
    "aria-expanded",
    "aria-haspopup",
];

/// One node as reported by the walker.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    pub index: usize,
    pub tag: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub dropdown: bool,
    #[serde(default)]
    pub input_like: bool,
}

impl RawNode {
    fn is_candidate(&self) -> bool {
        (self.visible || self.dropdown || self.input_like)
            && !SKIP_TAGS.contains(&self.tag.as_str())
    }

    fn has_identity(&self) -> bool {
        !self.text.is_empty()
            || self
                .attrs
                .keys()
                .any(|name| !NON_IDENTIFYING.contains(&name.as_str()))
    }
}

/// Walker result.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSnapshot {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub nodes: Vec<RawNode>,
}

/// Run retention, deduplication and pruning, then issue handles.
///
/// Returns the snapshot together with the registry arena for it; entry `i`
/// backs handle `i`.
pub fn build(
    raw: RawSnapshot,
    generation: SnapshotGeneration,
    text_limit: usize,
) -> (Snapshot, Vec<RegistryEntry>) {
    let retained = raw
        .nodes
        .into_iter()
        .map(|node| normalize(node, text_limit))
        .filter(RawNode::is_candidate);
    let kept: Vec<RawNode> = dedup(retained)
        .into_iter()
        .filter(|node| node.input_like || node.has_identity())
        .collect();

    let mut elements = Vec::with_capacity(kept.len());
    let mut entries = Vec::with_capacity(kept.len());
    for (handle, node) in kept.into_iter().enumerate() {
        entries.push(RegistryEntry::new(node.index));
        elements.push(SnapshotElement {
            handle: ElementHandle(handle as u32),
            tag_name: node.tag,
            attributes: node.attrs,
            text: node.text,
            visible: node.visible,
            dropdown: node.dropdown,
            input_like: node.input_like,
        });
    }

    let snapshot = Snapshot {
        generation,
        title: raw.title.filter(|t| !t.trim().is_empty()),
        url: raw.url,
        elements,
    };
    (snapshot, entries)
}

/// Collapse duplicates by signature, keeping first position. A visible node
/// takes over the slot of an invisible one.
fn dedup(nodes: impl Iterator<Item = RawNode>) -> Vec<RawNode> {
    let mut slots: Vec<RawNode> = Vec::new();
    let mut by_signature = HashMap::new();

    for node in nodes {
        let signature = ElementSignature::new(&node.tag, &node.attrs, &node.text);
        match by_signature.get(&signature) {
            Some(&slot) => {
                let existing: &mut RawNode = &mut slots[slot];
                if node.visible && !existing.visible {
                    *existing = node;
                }
            }
            None => {
                by_signature.insert(signature, slots.len());
                slots.push(node);
            }
        }
    }
    slots
}

fn normalize(mut node: RawNode, text_limit: usize) -> RawNode {
    node.tag = node.tag.to_ascii_lowercase();
    node.text = collapse(&node.text, text_limit);
    node.attrs.remove(STAMP_ATTRIBUTE);
    node.attrs.retain(|name, _| is_allowed(name));
    for value in node.attrs.values_mut() {
        *value = collapse(value, text_limit);
    }
    node
}

fn is_allowed(name: &str) -> bool {
    (name.starts_with("aria-") && ALLOWED_ATTRIBUTES.contains(&"aria-*"))
        || ALLOWED_ATTRIBUTES.contains(&name)
}

/// Collapse whitespace runs and cut to `limit` characters.
pub fn collapse(text: &str, limit: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(limit) {
        Some((cut, _)) => collapsed[..cut].trim_end().to_string(),
        None => collapsed,
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
