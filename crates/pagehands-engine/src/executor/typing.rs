//! Typing plans.
//!
//! The planner writes line breaks as literal escapes. A plan turns the raw
//! text into edit operations once, before anything touches the page.

const CLEAR_ESCAPE: &str = "{clear}";

/// One edit step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    /// Select everything in the target and delete it.
    Clear,
    Char(char),
    /// Hard line break (new block).
    Newline,
    /// Line break within the current block.
    SoftBreak,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingPlan {
    ops: Vec<EditOp>,
}

impl TypingPlan {
    /// Expand escapes and prepend a clear unless `text` starts with one.
    ///
    /// `\n` and `\r\n` (literal or real) become [`EditOp::Newline`], a lone
    /// `\r` becomes [`EditOp::SoftBreak`], and `{clear}` becomes
    /// [`EditOp::Clear`].
    pub fn parse(text: &str) -> Self {
        let mut ops = Vec::with_capacity(text.len() + 1);
        if !text.starts_with(CLEAR_ESCAPE) {
            ops.push(EditOp::Clear);
        }

        let mut rest = text;
        while let Some(c) = rest.chars().next() {
            let (op, consumed) = if rest.starts_with(CLEAR_ESCAPE) {
                (EditOp::Clear, CLEAR_ESCAPE.len())
            } else if rest.starts_with("\\r\\n") {
                (EditOp::Newline, 4)
            } else if rest.starts_with("\\n") {
                (EditOp::Newline, 2)
            } else if rest.starts_with("\\r") {
                (EditOp::SoftBreak, 2)
            } else if rest.starts_with("\r\n") {
                (EditOp::Newline, 2)
            } else if c == '\n' {
                (EditOp::Newline, 1)
            } else if c == '\r' {
                (EditOp::SoftBreak, 1)
            } else {
                (EditOp::Char(c), c.len_utf8())
            };
            ops.push(op);
            rest = &rest[consumed..];
        }

        Self { ops }
    }

    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Text the target should hold once the plan has run.
    pub fn final_text(&self) -> String {
        let start = self
            .ops
            .iter()
            .rposition(|op| *op == EditOp::Clear)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.ops[start..]
            .iter()
            .filter_map(|op| match op {
                EditOp::Char(c) => Some(*c),
                EditOp::Newline | EditOp::SoftBreak => Some('\n'),
                EditOp::Clear => None,
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "typing_tests.rs"]
mod tests;
