//! In-memory page used by the engine integration tests.
//!
//! `FakePage` answers every page script by name against a flat list of
//! nodes, mimicking what the real scripts do in a browser closely enough
//! to drive the engine end to end.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use pagehands_config::EngineConfig;
use pagehands_engine::PageEngine;
use pagehands_protocols::{HostError, PageHost, PageScript, Rect, TabId};

pub const TAB: TabId = TabId(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Editable {
    No,
    Field,
    ContentEditable,
}

#[derive(Debug, Clone)]
pub struct FakeNode {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
    pub visible: bool,
    pub dropdown: bool,
    pub connected: bool,
    pub rect: Rect,
    pub editable: Editable,
    pub value: String,
    pub stamp: Option<String>,
    pub obscured_by: Option<String>,
    pub scroll_fails: bool,
    pub offscreen: bool,
    pub read_only: bool,
    pub editor_marker: Option<String>,
    pub delegated_marker: Option<String>,
    pub rejects_typing: bool,
    pub clicks: usize,
}

impl FakeNode {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: BTreeMap::new(),
            text: String::new(),
            visible: true,
            dropdown: false,
            connected: true,
            rect: Rect {
                x: 10.0,
                y: 20.0,
                width: 100.0,
                height: 30.0,
            },
            editable: Editable::No,
            value: String::new(),
            stamp: None,
            obscured_by: None,
            scroll_fails: false,
            offscreen: false,
            read_only: false,
            editor_marker: None,
            delegated_marker: None,
            rejects_typing: false,
            clicks: 0,
        }
    }

    pub fn button(text: &str) -> Self {
        Self::new("button").text(text)
    }

    pub fn input(placeholder: &str) -> Self {
        let mut node = Self::new("input").attr("placeholder", placeholder);
        node.editable = Editable::Field;
        node
    }

    pub fn textarea(placeholder: &str) -> Self {
        let mut node = Self::new("textarea").attr("placeholder", placeholder);
        node.editable = Editable::Field;
        node
    }

    pub fn content_editable() -> Self {
        let mut node = Self::new("div").attr("contenteditable", "true");
        node.editable = Editable::ContentEditable;
        node
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn dropdown(mut self) -> Self {
        self.dropdown = true;
        self
    }

    pub fn obscured_by(mut self, tag: &str) -> Self {
        self.obscured_by = Some(tag.to_string());
        self
    }

    pub fn scroll_fails(mut self) -> Self {
        self.scroll_fails = true;
        self
    }

    pub fn offscreen(mut self) -> Self {
        self.offscreen = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn editor(mut self, marker: &str) -> Self {
        self.editor_marker = Some(marker.to_string());
        self
    }

    pub fn delegated(mut self, marker: &str) -> Self {
        self.delegated_marker = Some(marker.to_string());
        self
    }

    pub fn rejects_typing(mut self) -> Self {
        self.rejects_typing = true;
        self
    }

    fn input_like(&self) -> bool {
        self.editable != Editable::No
    }
}

#[derive(Debug, Default)]
struct PageState {
    title: String,
    url: String,
    nodes: Vec<FakeNode>,
    parked: Option<(u64, Vec<usize>)>,
    calls: Vec<String>,
    hung: Vec<String>,
    delayed: Vec<(String, Duration)>,
    fail_navigation: bool,
    navigations: Vec<String>,
}

impl PageState {
    fn by_id(&self, id: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.connected && n.stamp.as_deref() == Some(id))
    }
}

/// Scriptable in-memory page.
#[derive(Debug, Default)]
pub struct FakePage {
    state: Mutex<PageState>,
}

impl FakePage {
    pub fn new(nodes: Vec<FakeNode>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(PageState {
                title: "Fake page".to_string(),
                url: "https://example.com/".to_string(),
                nodes,
                ..PageState::default()
            }),
        })
    }

    pub fn node(&self, index: usize) -> FakeNode {
        self.state.lock().nodes[index].clone()
    }

    pub fn value(&self, index: usize) -> String {
        self.state.lock().nodes[index].value.clone()
    }

    pub fn remove(&self, index: usize) {
        self.state.lock().nodes[index].connected = false;
    }

    /// Make every call to `script` hang forever.
    pub fn hang(&self, script: &str) {
        self.state.lock().hung.push(script.to_string());
    }

    /// Run the next call to `script` right away but hold its reply back.
    pub fn delay_next_reply(&self, script: &str, delay: Duration) {
        self.state.lock().delayed.push((script.to_string(), delay));
    }

    pub fn fail_navigation(&self) {
        self.state.lock().fail_navigation = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn count_calls(&self, script: &str) -> usize {
        self.state.lock().calls.iter().filter(|c| *c == script).count()
    }

    pub fn url(&self) -> String {
        self.state.lock().url.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().navigations.clone()
    }

    fn dispatch(&self, name: &str, args: &[Value]) -> Result<Value, HostError> {
        let mut state = self.state.lock();
        state.calls.push(name.to_string());
        let arg = |i: usize| args.get(i).cloned().unwrap_or(Value::Null);
        let id = arg(0).as_str().map(str::to_string).unwrap_or_default();

        match name {
            "snapshot_walker" => {
                let generation = arg(0).as_u64().unwrap_or(0);
                let mut parked = Vec::new();
                let mut nodes = Vec::new();
                for (i, node) in state.nodes.iter().enumerate() {
                    if !node.connected || !(node.visible || node.dropdown || node.input_like()) {
                        continue;
                    }
                    let mut attrs = node.attrs.clone();
                    if let Some(stamp) = &node.stamp {
                        attrs.insert("data-pagehands-id".to_string(), stamp.clone());
                    }
                    nodes.push(json!({
                        "index": parked.len(),
                        "tag": node.tag.to_uppercase(),
                        "attrs": attrs,
                        "text": node.text,
                        "visible": node.visible,
                        "dropdown": node.dropdown,
                        "inputLike": node.input_like(),
                    }));
                    parked.push(i);
                }
                state.parked = Some((generation, parked));
                Ok(json!({ "title": state.title, "url": state.url, "nodes": nodes }))
            }
            "locate" => {
                let generation = arg(0).as_u64().unwrap_or(0);
                let raw_index = arg(1).as_u64().unwrap_or(0) as usize;
                if let Some(stable) = arg(2).as_str() {
                    return Ok(match state.nodes.iter().position(|n| n.stamp.as_deref() == Some(stable)) {
                        None => json!({ "status": "missing", "id": stable }),
                        Some(i) if !state.nodes[i].connected => {
                            json!({ "status": "detached", "id": stable })
                        }
                        Some(_) => json!({ "status": "found", "id": stable }),
                    });
                }
                let target = match &state.parked {
                    Some((g, parked)) if *g == generation => parked.get(raw_index).copied(),
                    _ => return Ok(json!({ "status": "stale", "id": null })),
                };
                let Some(i) = target else {
                    return Ok(json!({ "status": "missing", "id": null }));
                };
                if !state.nodes[i].connected {
                    return Ok(json!({ "status": "detached", "id": null }));
                }
                let stamp = arg(3).as_str().unwrap_or_default().to_string();
                let id = state.nodes[i].stamp.get_or_insert(stamp).clone();
                Ok(json!({ "status": "found", "id": id }))
            }
            "scroll_into_view" => {
                let Some(i) = state.by_id(&id) else {
                    return Ok(json!({ "outcome": "failed", "rect": null }));
                };
                let node = &mut state.nodes[i];
                if node.scroll_fails {
                    return Ok(json!({ "outcome": "failed", "rect": node.rect }));
                }
                if node.offscreen {
                    node.offscreen = false;
                    return Ok(json!({ "outcome": "full", "rect": node.rect }));
                }
                Ok(json!({ "outcome": "already_visible", "rect": node.rect }))
            }
            "measure" => match state.by_id(&id) {
                Some(i) => Ok(json!({ "rect": state.nodes[i].rect })),
                None => Ok(json!({ "rect": null })),
            },
            "cursor" => Ok(json!({ "ok": true })),
            "pointer_click" => {
                let Some(i) = state.by_id(&id) else {
                    return Ok(json!({ "hit": "none", "dispatched": false }));
                };
                let node = &mut state.nodes[i];
                if let Some(blocker) = &node.obscured_by {
                    return Ok(json!({ "hit": "other", "dispatched": false, "blocker": blocker }));
                }
                node.clicks += 1;
                Ok(json!({ "hit": "target", "dispatched": true }))
            }
            "backup_click" => {
                let method = arg(1).as_str().unwrap_or_default().to_string();
                let Some(i) = state.by_id(&id) else {
                    return Ok(json!({ "ok": false, "applicable": true, "error": "element detached" }));
                };
                let node = &mut state.nodes[i];
                let role = node.attrs.get("role").cloned().unwrap_or_default();
                let applicable = match method.as_str() {
                    "select_option" => node.tag == "option",
                    "aria_combobox" => matches!(role.as_str(), "option" | "combobox" | "listbox"),
                    "custom_dropdown" => node.attrs.contains_key("aria-expanded"),
                    "native_click" | "raw_events" => true,
                    _ => false,
                };
                if !applicable {
                    return Ok(json!({ "ok": false, "applicable": false, "error": null }));
                }
                node.clicks += 1;
                Ok(json!({ "ok": true, "applicable": true, "error": null }))
            }
            "focus_probe" => {
                let Some(i) = state.by_id(&id) else {
                    return Ok(json!({ "found": false, "focused": false, "targetId": null, "fingerprint": null }));
                };
                let node = &state.nodes[i];
                let input_type: Option<&str> = (node.tag == "input").then_some("text");
                let editor_markers: Vec<&String> = node.editor_marker.iter().collect();
                let delegated_markers: Vec<&String> = node.delegated_marker.iter().collect();
                Ok(json!({
                    "found": true,
                    "focused": node.input_like(),
                    "targetId": id,
                    "fingerprint": {
                        "tag": node.tag,
                        "inputType": input_type,
                        "isContentEditable": node.editable == Editable::ContentEditable,
                        "editorMarkers": editor_markers,
                        "delegatedMarkers": delegated_markers,
                        "readOnly": node.read_only,
                        "disabled": false,
                    }
                }))
            }
            "plain_field" | "content_editable" | "rich_editor" | "delegated_events" => {
                let op = arg(1).as_str().unwrap_or_default().to_string();
                let ch = arg(2).as_str().unwrap_or_default().to_string();
                let Some(i) = state.by_id(&id) else {
                    return Ok(json!({ "ok": false, "error": "element detached" }));
                };
                let node = &mut state.nodes[i];
                if node.rejects_typing {
                    return Ok(json!({ "ok": false, "error": "synthetic input ignored" }));
                }
                if node.editable == Editable::No {
                    return Ok(json!({ "ok": false, "error": "element is not editable" }));
                }
                match op.as_str() {
                    "clear" => node.value.clear(),
                    "char" => node.value.push_str(&ch),
                    "newline" | "softbreak" => {
                        if node.tag != "input" {
                            node.value.push('\n');
                        }
                    }
                    "commit" => {}
                    other => {
                        return Ok(json!({ "ok": false, "error": format!("unknown op {}", other) }));
                    }
                }
                Ok(json!({ "ok": true, "value": node.value }))
            }
            "bulk_assign" => {
                let text = arg(1).as_str().unwrap_or_default().to_string();
                let Some(i) = state.by_id(&id) else {
                    return Ok(json!({ "ok": false, "error": "element detached" }));
                };
                let node = &mut state.nodes[i];
                if node.editable == Editable::No {
                    return Ok(json!({ "ok": false, "error": "element is not editable" }));
                }
                node.value = text;
                Ok(json!({ "ok": true, "value": node.value }))
            }
            other => Err(HostError::Script(format!("unknown script {}", other))),
        }
    }
}

#[async_trait]
impl PageHost for FakePage {
    async fn run_script(
        &self,
        tab: TabId,
        script: &PageScript,
        args: Vec<Value>,
    ) -> Result<Value, HostError> {
        if tab != TAB {
            return Err(HostError::TabNotFound(tab));
        }
        let hung = self.state.lock().hung.iter().any(|s| s == script.name);
        if hung {
            std::future::pending::<()>().await;
        }
        let reply = self.dispatch(script.name, &args);
        let delay = {
            let mut state = self.state.lock();
            let position = state.delayed.iter().position(|(s, _)| s == script.name);
            position.map(|i| state.delayed.remove(i).1)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        reply
    }

    async fn set_url(&self, tab: TabId, url: &str) -> Result<(), HostError> {
        if tab != TAB {
            return Err(HostError::TabNotFound(tab));
        }
        let mut state = self.state.lock();
        state.navigations.push(url.to_string());
        if state.fail_navigation {
            return Err(HostError::Navigation("net::ERR_NAME_NOT_RESOLVED".to_string()));
        }
        state.url = url.to_string();
        state.parked = None;
        Ok(())
    }
}

/// Engine settings with every animation and settle delay removed.
pub fn fast_config() -> EngineConfig {
    EngineConfig {
        scroll_settle_ms: 0,
        click_settle_ms: 0,
        navigation_settle_ms: 0,
        typing_delay_ms: 0,
        cursor_move_ms: 0,
        ..EngineConfig::default()
    }
}

pub fn engine_with(page: &Arc<FakePage>, config: EngineConfig) -> PageEngine {
    let engine = PageEngine::new(page.clone(), config);
    engine.bind_tab(TAB).unwrap();
    engine
}

pub fn engine(page: &Arc<FakePage>) -> PageEngine {
    engine_with(page, fast_config())
}

/// Tag and attributes of every element, in handle order.
pub fn outline(snapshot: &pagehands_protocols::Snapshot) -> Vec<(String, BTreeMap<String, String>, String)> {
    snapshot
        .elements
        .iter()
        .map(|e| (e.tag_name.clone(), e.attributes.clone(), e.text.clone()))
        .collect()
}
