//! Editing targets.
//!
//! A target is classified once from the fingerprint reported by the focus
//! probe. Each class gets its own [`EditingSurface`], which knows how that
//! kind of element accepts edits.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use pagehands_protocols::{EditTargetKind, PageScript};

use super::StrategyFailure;
use crate::context::PageContext;
use crate::scripts;

/// Structural facts about the element that will receive the edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fingerprint {
    pub tag: String,
    #[serde(default)]
    pub input_type: Option<String>,
    #[serde(default)]
    pub is_content_editable: bool,
    /// Rich editor families detected around the element.
    #[serde(default)]
    pub editor_markers: Vec<String>,
    /// Frameworks that route input through delegated handlers.
    #[serde(default)]
    pub delegated_markers: Vec<String>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorFlavor {
    ProseMirror,
    Quill,
    Draft,
    Slate,
    Lexical,
    CkEditor,
    TinyMce,
    Other,
}

impl EditorFlavor {
    fn from_marker(marker: &str) -> Self {
        match marker {
            "prosemirror" => EditorFlavor::ProseMirror,
            "quill" => EditorFlavor::Quill,
            "draft" => EditorFlavor::Draft,
            "slate" => EditorFlavor::Slate,
            "lexical" => EditorFlavor::Lexical,
            "ckeditor" => EditorFlavor::CkEditor,
            "tinymce" => EditorFlavor::TinyMce,
            _ => EditorFlavor::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EditorFlavor::ProseMirror => "prosemirror",
            EditorFlavor::Quill => "quill",
            EditorFlavor::Draft => "draft",
            EditorFlavor::Slate => "slate",
            EditorFlavor::Lexical => "lexical",
            EditorFlavor::CkEditor => "ckeditor",
            EditorFlavor::TinyMce => "tinymce",
            EditorFlavor::Other => "other",
        }
    }
}

/// How the target implements editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    /// Native `<input>` / `<textarea>`.
    PlainField,
    /// Generic `contenteditable` region.
    ContentEditable,
    /// Editor with its own document model; edits go block by block.
    RichEditor(EditorFlavor),
    /// Field owned by a framework that listens through delegated events.
    DelegatedFramework,
}

impl EditTarget {
    /// Rich editors win over framework ownership, which wins over the
    /// element's native kind.
    pub fn classify(fingerprint: &Fingerprint) -> Self {
        if let Some(marker) = fingerprint.editor_markers.first() {
            return EditTarget::RichEditor(EditorFlavor::from_marker(marker));
        }
        if !fingerprint.delegated_markers.is_empty() {
            return EditTarget::DelegatedFramework;
        }
        match fingerprint.tag.as_str() {
            "input" | "textarea" => EditTarget::PlainField,
            _ if fingerprint.is_content_editable => EditTarget::ContentEditable,
            _ => EditTarget::PlainField,
        }
    }

    pub fn kind(&self) -> EditTargetKind {
        match self {
            EditTarget::PlainField => EditTargetKind::PlainField,
            EditTarget::ContentEditable => EditTargetKind::ContentEditable,
            EditTarget::RichEditor(_) => EditTargetKind::RichEditor,
            EditTarget::DelegatedFramework => EditTargetKind::DelegatedFramework,
        }
    }

    pub fn flavor(&self) -> Option<EditorFlavor> {
        match self {
            EditTarget::RichEditor(flavor) => Some(*flavor),
            _ => None,
        }
    }

    /// Surface that edits `target_id` the way this target expects.
    pub fn surface(&self, target_id: &str) -> Box<dyn EditingSurface> {
        let target_id = target_id.to_string();
        match self {
            EditTarget::PlainField => Box::new(PlainFieldSurface { target_id }),
            EditTarget::ContentEditable => Box::new(ContentEditableSurface { target_id }),
            EditTarget::RichEditor(flavor) => Box::new(RichEditorSurface {
                target_id,
                flavor: *flavor,
            }),
            EditTarget::DelegatedFramework => Box::new(DelegatedFrameworkSurface { target_id }),
        }
    }
}

/// One way of applying edit operations to a focused element.
#[async_trait]
pub trait EditingSurface: Send + Sync {
    fn name(&self) -> &'static str;

    async fn clear(&self, ctx: &PageContext) -> Result<(), StrategyFailure>;

    async fn insert_char(&self, ctx: &PageContext, ch: char) -> Result<(), StrategyFailure>;

    async fn insert_newline(&self, ctx: &PageContext) -> Result<(), StrategyFailure>;

    async fn insert_soft_break(&self, ctx: &PageContext) -> Result<(), StrategyFailure>;

    /// Called once after the last operation.
    async fn finish(&self, _ctx: &PageContext) -> Result<(), StrategyFailure> {
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct EditReply {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

async fn apply(
    ctx: &PageContext,
    script: &PageScript,
    args: Vec<Value>,
) -> Result<(), StrategyFailure> {
    let reply: EditReply = ctx.run(script, args).await?;
    if reply.ok {
        Ok(())
    } else {
        Err(StrategyFailure::Rejected(
            reply
                .error
                .unwrap_or_else(|| format!("{} rejected the edit", script.name)),
        ))
    }
}

pub struct PlainFieldSurface {
    target_id: String,
}

impl PlainFieldSurface {
    async fn op(&self, ctx: &PageContext, op: &str, ch: Option<char>) -> Result<(), StrategyFailure> {
        let ch = ch.map(|c| json!(c.to_string())).unwrap_or(Value::Null);
        apply(ctx, &scripts::PLAIN_FIELD, vec![json!(self.target_id), json!(op), ch]).await
    }
}

#[async_trait]
impl EditingSurface for PlainFieldSurface {
    fn name(&self) -> &'static str {
        "plain_field"
    }

    async fn clear(&self, ctx: &PageContext) -> Result<(), StrategyFailure> {
        self.op(ctx, "clear", None).await
    }

    async fn insert_char(&self, ctx: &PageContext, ch: char) -> Result<(), StrategyFailure> {
        self.op(ctx, "char", Some(ch)).await
    }

    async fn insert_newline(&self, ctx: &PageContext) -> Result<(), StrategyFailure> {
        self.op(ctx, "newline", None).await
    }

    async fn insert_soft_break(&self, ctx: &PageContext) -> Result<(), StrategyFailure> {
        self.op(ctx, "softbreak", None).await
    }

    async fn finish(&self, ctx: &PageContext) -> Result<(), StrategyFailure> {
        self.op(ctx, "commit", None).await
    }
}

pub struct ContentEditableSurface {
    target_id: String,
}

impl ContentEditableSurface {
    async fn op(&self, ctx: &PageContext, op: &str, ch: Option<char>) -> Result<(), StrategyFailure> {
        let ch = ch.map(|c| json!(c.to_string())).unwrap_or(Value::Null);
        apply(ctx, &scripts::CONTENT_EDITABLE, vec![json!(self.target_id), json!(op), ch]).await
    }
}

#[async_trait]
impl EditingSurface for ContentEditableSurface {
    fn name(&self) -> &'static str {
        "content_editable"
    }

    async fn clear(&self, ctx: &PageContext) -> Result<(), StrategyFailure> {
        self.op(ctx, "clear", None).await
    }

    async fn insert_char(&self, ctx: &PageContext, ch: char) -> Result<(), StrategyFailure> {
        self.op(ctx, "char", Some(ch)).await
    }

    async fn insert_newline(&self, ctx: &PageContext) -> Result<(), StrategyFailure> {
        self.op(ctx, "newline", None).await
    }

    async fn insert_soft_break(&self, ctx: &PageContext) -> Result<(), StrategyFailure> {
        self.op(ctx, "softbreak", None).await
    }
}

pub struct RichEditorSurface {
    target_id: String,
    flavor: EditorFlavor,
}

impl RichEditorSurface {
    async fn op(&self, ctx: &PageContext, op: &str, ch: Option<char>) -> Result<(), StrategyFailure> {
        let ch = ch.map(|c| json!(c.to_string())).unwrap_or(Value::Null);
        apply(
            ctx,
            &scripts::RICH_EDITOR,
            vec![json!(self.target_id), json!(op), ch, json!(self.flavor.as_str())],
        )
        .await
    }
}

#[async_trait]
impl EditingSurface for RichEditorSurface {
    fn name(&self) -> &'static str {
        "rich_editor"
    }

    async fn clear(&self, ctx: &PageContext) -> Result<(), StrategyFailure> {
        self.op(ctx, "clear", None).await
    }

    async fn insert_char(&self, ctx: &PageContext, ch: char) -> Result<(), StrategyFailure> {
        self.op(ctx, "char", Some(ch)).await
    }

    async fn insert_newline(&self, ctx: &PageContext) -> Result<(), StrategyFailure> {
        self.op(ctx, "newline", None).await
    }

    async fn insert_soft_break(&self, ctx: &PageContext) -> Result<(), StrategyFailure> {
        self.op(ctx, "softbreak", None).await
    }
}

pub struct DelegatedFrameworkSurface {
    target_id: String,
}

impl DelegatedFrameworkSurface {
    async fn op(&self, ctx: &PageContext, op: &str, ch: Option<char>) -> Result<(), StrategyFailure> {
        let ch = ch.map(|c| json!(c.to_string())).unwrap_or(Value::Null);
        apply(ctx, &scripts::DELEGATED_EVENTS, vec![json!(self.target_id), json!(op), ch]).await
    }
}

#[async_trait]
impl EditingSurface for DelegatedFrameworkSurface {
    fn name(&self) -> &'static str {
        "delegated_events"
    }

    async fn clear(&self, ctx: &PageContext) -> Result<(), StrategyFailure> {
        self.op(ctx, "clear", None).await
    }

    async fn insert_char(&self, ctx: &PageContext, ch: char) -> Result<(), StrategyFailure> {
        self.op(ctx, "char", Some(ch)).await
    }

    async fn insert_newline(&self, ctx: &PageContext) -> Result<(), StrategyFailure> {
        self.op(ctx, "newline", None).await
    }

    async fn insert_soft_break(&self, ctx: &PageContext) -> Result<(), StrategyFailure> {
        self.op(ctx, "softbreak", None).await
    }

    async fn finish(&self, ctx: &PageContext) -> Result<(), StrategyFailure> {
        self.op(ctx, "commit", None).await
    }
}

#[cfg(test)]
#[path = "editing_tests.rs"]
mod tests;
