//! In-page scripts.
//!
//! Each script is a single function expression, embedded at compile time and
//! invoked by the host with JSON arguments. Elements are addressed by the
//! stamp attribute written by [`LOCATE`].

use pagehands_protocols::PageScript;

/// Attribute carrying an element's stable identifier.
pub const STAMP_ATTRIBUTE: &str = "data-pagehands-id";

/// Walk the document, park candidates and return raw node records.
pub const SNAPSHOT_WALKER: PageScript =
    PageScript::new("snapshot_walker", include_str!("snapshot_walker.js"));

/// Re-locate a parked node or a stamped node, stamping on first use.
pub const LOCATE: PageScript = PageScript::new("locate", include_str!("locate.js"));

pub const SCROLL_INTO_VIEW: PageScript =
    PageScript::new("scroll_into_view", include_str!("scroll_into_view.js"));

pub const MEASURE: PageScript = PageScript::new("measure", include_str!("measure.js"));

pub const CURSOR: PageScript = PageScript::new("cursor", include_str!("cursor.js"));

/// Hit-test a point and dispatch the pointer sequence there.
pub const POINTER_CLICK: PageScript =
    PageScript::new("pointer_click", include_str!("pointer_click.js"));

pub const BACKUP_CLICK: PageScript =
    PageScript::new("backup_click", include_str!("backup_click.js"));

/// Focus the editable target and report its structural fingerprint.
pub const FOCUS_PROBE: PageScript =
    PageScript::new("focus_probe", include_str!("focus_probe.js"));

pub const PLAIN_FIELD: PageScript =
    PageScript::new("plain_field", include_str!("plain_field.js"));

pub const CONTENT_EDITABLE: PageScript =
    PageScript::new("content_editable", include_str!("content_editable.js"));

pub const RICH_EDITOR: PageScript =
    PageScript::new("rich_editor", include_str!("rich_editor.js"));

pub const DELEGATED_EVENTS: PageScript =
    PageScript::new("delegated_events", include_str!("delegated_events.js"));

pub const BULK_ASSIGN: PageScript =
    PageScript::new("bulk_assign", include_str!("bulk_assign.js"));

/// Every script, for sanity checks.
pub const ALL: [PageScript; 13] = [
    SNAPSHOT_WALKER,
    LOCATE,
    SCROLL_INTO_VIEW,
    MEASURE,
    CURSOR,
    POINTER_CLICK,
    BACKUP_CLICK,
    FOCUS_PROBE,
    PLAIN_FIELD,
    CONTENT_EDITABLE,
    RICH_EDITOR,
    DELEGATED_EVENTS,
    BULK_ASSIGN,
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_scripts_are_function_expressions() {
        for script in ALL {
            let source = script.source.trim_start();
            assert!(
                source.starts_with("function"),
                "{} must start with a function expression",
                script.name
            );
            assert!(source.trim_end().ends_with('}'), "{} is truncated", script.name);
        }
    }

    #[test]
    fn test_script_names_unique() {
        let names: HashSet<_> = ALL.iter().map(|s| s.name).collect();
        assert_eq!(names.len(), ALL.len());
    }

    #[test]
    fn test_element_scripts_use_stamp_attribute() {
        for script in ALL {
            if script.name == "snapshot_walker" || script.name == "cursor" {
                continue;
            }
            assert!(
                script.source.contains(STAMP_ATTRIBUTE),
                "{} does not address elements by stamp",
                script.name
            );
        }
    }
}
