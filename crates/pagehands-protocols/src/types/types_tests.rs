use super::*;
use crate::error::{ActionFailure, EngineError, ErrorKind};
use serde_json::json;
use std::collections::BTreeMap;

#[test]
fn test_click_from_request() {
    let action = Action::from_request("click", json!({"handle": 3})).unwrap();
    assert_eq!(action, Action::Click { handle: ElementHandle(3) });
    assert_eq!(action.action_type(), ActionType::Click);
    assert_eq!(action.handle(), Some(ElementHandle(3)));
}

#[test]
fn test_gerund_aliases() {
    let click = Action::from_request("clicking", json!({"index": 1})).unwrap();
    assert_eq!(click.action_type(), ActionType::Click);

    let typing = Action::from_request("typing", json!({"index": 2, "value": "hi"})).unwrap();
    assert_eq!(
        typing,
        Action::SetValue {
            handle: ElementHandle(2),
            text: "hi".to_string()
        }
    );

    let nav = Action::from_request("navigating", json!({"url": "https://example.com"})).unwrap();
    assert_eq!(nav.action_type(), ActionType::Navigate);

    let wait = Action::from_request("waiting", json!({"seconds": 1.5})).unwrap();
    assert_eq!(wait, Action::Wait { seconds: 1.5 });
}

#[test]
fn test_unknown_type_is_validation_error() {
    let err = Action::from_request("hover", json!({"handle": 0})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_missing_field_is_validation_error() {
    let err = Action::from_request("set_value", json!({"handle": 0})).unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[test]
fn test_non_object_payload_rejected() {
    let err = Action::from_request("click", json!([1, 2])).unwrap_err();
    assert!(err.to_string().contains("must be an object"));
}

#[test]
fn test_negative_wait_rejected() {
    let err = Action::from_request("wait", json!({"seconds": -1})).unwrap_err();
    assert!(err.to_string().contains("negative"));
}

#[test]
fn test_non_finite_wait_rejected() {
    let action = Action::Wait { seconds: f64::NAN };
    assert!(action.validate().is_err());
    let action = Action::Wait {
        seconds: f64::INFINITY,
    };
    assert!(action.validate().is_err());
}

#[test]
fn test_blank_url_rejected() {
    let err = Action::from_request("navigate", json!({"url": "   "})).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_action_type_display() {
    assert_eq!(ActionType::SetValue.to_string(), "set_value");
    assert_eq!(
        serde_json::to_value(ActionType::Navigate).unwrap(),
        json!("navigate")
    );
}

#[test]
fn test_generation_next() {
    let g = SnapshotGeneration::default();
    assert_eq!(g.next(), SnapshotGeneration(1));
    assert_eq!(g.next().next().to_string(), "2");
}

#[test]
fn test_rect_center_and_tolerance() {
    let rect = Rect {
        x: 10.0,
        y: 20.0,
        width: 100.0,
        height: 40.0,
    };
    assert_eq!(rect.center(), Coordinates::new(60.0, 40.0));
    assert!(!rect.is_empty());

    let moved = Rect { x: 10.5, ..rect };
    assert!(rect.approx_eq(&moved, 1.0));
    assert!(!rect.approx_eq(&moved, 0.25));

    let empty = Rect {
        width: 0.0,
        ..rect
    };
    assert!(empty.is_empty());
}

#[test]
fn test_signature_ignores_handle_and_flags() {
    let mut attributes = BTreeMap::new();
    attributes.insert("aria-label".to_string(), "Close".to_string());

    let a = SnapshotElement {
        handle: ElementHandle(0),
        tag_name: "button".to_string(),
        attributes: attributes.clone(),
        text: "X".to_string(),
        visible: true,
        dropdown: false,
        input_like: false,
    };
    let b = SnapshotElement {
        handle: ElementHandle(9),
        visible: false,
        ..a.clone()
    };
    assert_eq!(a.signature(), b.signature());

    let c = SnapshotElement {
        text: "Y".to_string(),
        ..a.clone()
    };
    assert_ne!(a.signature(), c.signature());
}

#[test]
fn test_snapshot_lookup() {
    let snapshot = Snapshot {
        generation: SnapshotGeneration(4),
        title: None,
        url: None,
        elements: vec![SnapshotElement {
            handle: ElementHandle(0),
            tag_name: "a".to_string(),
            attributes: BTreeMap::new(),
            text: "Home".to_string(),
            visible: true,
            dropdown: false,
            input_like: false,
        }],
    };
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.get(ElementHandle(0)).is_some());
    assert!(snapshot.get(ElementHandle(1)).is_none());
}

#[test]
fn test_status_activity() {
    assert!(ActionStatus::Pending.is_active());
    assert!(ActionStatus::InProgress.is_active());
    assert!(ActionStatus::Completed.is_finished());
    assert!(ActionStatus::Failed.is_finished());
}

#[test]
fn test_new_record_is_pending() {
    let record = ActionRecord::new(ActionId::new(), ActionType::Wait);
    assert_eq!(record.status, ActionStatus::Pending);
    assert!(record.end_time.is_none());
    assert!(record.error.is_none());
}

#[test]
fn test_click_diagnostics_record_attempts() {
    let mut diag = ClickDiagnostics::default();
    diag.record(ClickMethod::SelectOption, AttemptOutcome::Skipped, None);
    diag.record(
        ClickMethod::NativeClick,
        AttemptOutcome::Failed,
        Some("detached".to_string()),
    );
    diag.record(ClickMethod::RawEvents, AttemptOutcome::Succeeded, None);

    assert_eq!(
        diag.methods_attempted,
        vec![ClickMethod::NativeClick, ClickMethod::RawEvents]
    );
    assert_eq!(diag.attempts.len(), 3);
    assert_eq!(diag.attempts[0].strategy, "select_option");
    assert_eq!(diag.last_error.as_deref(), Some("detached"));
}

#[test]
fn test_backup_order_excludes_pointer() {
    assert!(!ClickMethod::BACKUP_ORDER.contains(&ClickMethod::Pointer));
    assert_eq!(ClickMethod::BACKUP_ORDER[0], ClickMethod::SelectOption);
    assert_eq!(
        ClickMethod::BACKUP_ORDER[ClickMethod::BACKUP_ORDER.len() - 1],
        ClickMethod::DelegatedHandler
    );
}

#[test]
fn test_diagnostics_tagged_serialization() {
    let diag: ActionDiagnostics = WaitDiagnostics {
        requested_seconds: 500.0,
        effective_seconds: 300.0,
        clamped: true,
    }
    .into();
    let value = serde_json::to_value(&diag).unwrap();
    assert_eq!(value["kind"], "wait");
    assert_eq!(value["clamped"], true);
    assert!(diag.failed_step().is_none());
}

#[test]
fn test_failure_result_carries_kind_and_diagnostics() {
    let mut diag = SetValueDiagnostics::default();
    diag.fail_at(FailedStep::Typing, "cancelled");
    let failure = ActionFailure::new(
        EngineError::Cancelled {
            completed: 2,
            total: 5,
        },
        diag,
    );

    let result = ActionResult::failure(ActionId::new(), 12, failure);
    assert!(!result.success);
    assert_eq!(result.error_kind, Some(ErrorKind::Cancelled));
    assert_eq!(result.diagnostics.failed_step(), Some(FailedStep::Typing));
    assert!(result.error.unwrap().contains("2 of 5"));
}
