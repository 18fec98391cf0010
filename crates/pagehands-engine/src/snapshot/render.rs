//! Compact pseudo-markup handed to the planner.

use std::fmt::Write;

use pagehands_protocols::{Snapshot, SnapshotElement};

/// Returned instead of a snapshot when extraction fails.
pub const SNAPSHOT_UNAVAILABLE: &str = "Error: page snapshot unavailable";

const VOID_TAGS: &[&str] = &["input", "img", "area", "embed", "source", "track", "col"];

/// Render a snapshot, one element per line.
pub fn render(snapshot: &Snapshot) -> String {
    let mut output = String::new();

    if let Some(ref title) = snapshot.title {
        let _ = writeln!(output, "Page: {}", title);
    }
    if let Some(ref url) = snapshot.url {
        let _ = writeln!(output, "URL: {}", url);
    }
    if snapshot.is_empty() {
        output.push_str("(no interactive elements)\n");
        return output;
    }
    for element in &snapshot.elements {
        output.push_str(&render_element(element));
        output.push('\n');
    }
    output
}

/// `[3]<button aria-label="Close">X</button>`
pub fn render_element(element: &SnapshotElement) -> String {
    let mut line = format!("[{}]<{}", element.handle, element.tag_name);
    for (name, value) in &element.attributes {
        if value.is_empty() {
            let _ = write!(line, " {}", name);
        } else {
            let _ = write!(line, " {}=\"{}\"", name, value.replace('"', "&quot;"));
        }
    }

    let text = element.text.replace('<', "&lt;").replace('>', "&gt;");
    if text.is_empty() && VOID_TAGS.contains(&element.tag_name.as_str()) {
        line.push_str(" />");
    } else {
        let _ = write!(line, ">{}</{}>", text, element.tag_name);
    }
    line
}
