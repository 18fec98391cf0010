//! Snapshot model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ids::{ElementHandle, SnapshotGeneration};

/// One retained, deduplicated element of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotElement {
    /// Handle issued for this element.
    pub handle: ElementHandle,
    /// Lowercase tag name.
    pub tag_name: String,
    /// Allow-listed attributes, ordered by name.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Direct text (not including descendants), whitespace-collapsed.
    #[serde(default)]
    pub text: String,
    /// Geometrically visible when the snapshot was taken.
    pub visible: bool,
    /// Looks like a dropdown, combobox or popup trigger.
    pub dropdown: bool,
    /// Native field, contenteditable, or wraps one.
    pub input_like: bool,
}

impl SnapshotElement {
    /// Structural signature used for deduplication.
    pub fn signature(&self) -> ElementSignature {
        ElementSignature::new(&self.tag_name, &self.attributes, &self.text)
    }
}

/// Structural identity of an element: tag, allow-listed attributes and
/// direct text. Two elements with equal signatures are indistinguishable to
/// the planner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementSignature {
    pub tag_name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
}

impl ElementSignature {
    pub fn new(tag_name: &str, attributes: &BTreeMap<String, String>, text: &str) -> Self {
        Self {
            tag_name: tag_name.to_string(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            text: text.to_string(),
        }
    }
}

/// Structured result of one extraction pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub generation: SnapshotGeneration,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    pub elements: Vec<SnapshotElement>,
}

impl Snapshot {
    pub fn get(&self, handle: ElementHandle) -> Option<&SnapshotElement> {
        self.elements.iter().find(|e| e.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
