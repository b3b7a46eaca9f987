// End-to-end flows over the normalize → store → lifecycle path, using
// raw wire frames exactly as the backend emits them.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use serde_json::json;

use safewatch_core::{normalize, AlertStatus, AlertStore, CoreError, Transition};
use safewatch_wire::events::parse_frame;

fn apply_frame(store: &AlertStore, frame: &serde_json::Value) {
    let event = parse_frame(&frame.to_string()).expect("frame should parse");
    let normalized = normalize(event).expect("frame should normalize");
    store.apply(normalized);
}

// ── Scenario: camera detection becomes a pending alert ──────────────

#[test]
fn detection_frame_lands_as_pending_violence_alert() {
    let store = AlertStore::new();

    apply_frame(
        &store,
        &json!({
            "event": "new_alert",
            "data": {
                "type": "violence",
                "timestamp": "2026-02-10T12:00:00Z",
                "details": {
                    "confidence": 0.92,
                    "severity": "high",
                    "location": { "lat": 28.65, "lng": 77.23 },
                    "camera_id": "cam_004",
                    "tourist_ids": ["t_001"],
                    "description": "Violence detected"
                }
            }
        }),
    );

    let snap = store.alerts_snapshot();
    assert_eq!(snap.len(), 1);
    let alert = &snap[0];
    assert_eq!(alert.status, AlertStatus::Pending);
    assert_eq!(alert.kind.to_string(), "violence");
    assert_eq!(alert.source.as_deref(), Some("cam_004"));
    assert!(alert.id.is_local());
}

// ── Scenario: review → dispatch → resolve ───────────────────────────

#[test]
fn full_lifecycle_with_authoritative_echoes() {
    let store = AlertStore::new();

    apply_frame(
        &store,
        &json!({
            "event": "alert_update",
            "data": { "id": "alert_1", "type": "anomaly", "status": "pending" }
        }),
    );
    let id = "alert_1".into();

    // Operator acknowledges; prediction takes effect immediately.
    assert!(store.apply_transition(&id, &Transition::Review).unwrap());
    assert_eq!(store.alert(&id).unwrap().status, AlertStatus::Reviewing);

    // Server echoes the reviewing state; the prediction is retired.
    apply_frame(
        &store,
        &json!({
            "event": "alert_update",
            "data": { "id": "alert_1", "type": "anomaly", "status": "reviewing" }
        }),
    );

    // Dispatch with an assignee, then the server confirms.
    assert!(store
        .apply_transition(
            &id,
            &Transition::Dispatch {
                assignee: Some("off_002".into())
            }
        )
        .unwrap());
    apply_frame(
        &store,
        &json!({
            "event": "alert_update",
            "data": {
                "id": "alert_1",
                "type": "anomaly",
                "status": "dispatched",
                "assignee": "off_002"
            }
        }),
    );

    assert!(store.apply_transition(&id, &Transition::Resolve).unwrap());
    assert_eq!(store.alert(&id).unwrap().status, AlertStatus::Resolved);

    // A repeated resolve is a harmless no-op, not an error.
    assert!(!store.apply_transition(&id, &Transition::Resolve).unwrap());
}

// ── Scenario: conflicting dispatches ────────────────────────────────

#[test]
fn second_dispatcher_gets_a_conflict_without_mutation() {
    let store = AlertStore::new();
    apply_frame(
        &store,
        &json!({
            "event": "alert_update",
            "data": { "id": "alert_1", "status": "pending" }
        }),
    );
    let id = "alert_1".into();

    store
        .apply_transition(
            &id,
            &Transition::Dispatch {
                assignee: Some("off_002".into()),
            },
        )
        .unwrap();

    let err = store
        .apply_transition(
            &id,
            &Transition::Dispatch {
                assignee: Some("off_009".into()),
            },
        )
        .unwrap_err();
    assert!(matches!(err, CoreError::AssigneeConflict { .. }));

    // The conflicting request changed nothing.
    let alert = store.alert(&id).unwrap();
    assert_eq!(alert.status, AlertStatus::Dispatched);
    assert_eq!(alert.assignee.as_deref(), Some("off_002"));

    // Re-dispatching with the winning assignee is idempotent.
    let changed = store
        .apply_transition(
            &id,
            &Transition::Dispatch {
                assignee: Some("off_002".into()),
            },
        )
        .unwrap();
    assert!(!changed);
}

// ── Scenario: reconnect pushes a fresh snapshot ─────────────────────

#[test]
fn reconnect_snapshot_replaces_batches_but_keeps_alerts() {
    let store = AlertStore::new();

    apply_frame(
        &store,
        &json!({
            "event": "location_update",
            "data": [
                { "tourist_id": "t_001", "location": { "lat": 26.1, "lng": 91.7 } },
                { "tourist_id": "t_002", "location": { "lat": 26.2, "lng": 91.8 } }
            ]
        }),
    );
    apply_frame(
        &store,
        &json!({
            "event": "alert_update",
            "data": { "id": "alert_1", "status": "resolved" }
        }),
    );

    // After the reconnect the server pushes a fresh baseline; the old
    // location batch is replaced wholesale, not merged.
    apply_frame(
        &store,
        &json!({
            "event": "location_update",
            "data": [
                { "tourist_id": "t_003", "location": { "lat": 27.0, "lng": 92.0 } }
            ]
        }),
    );

    let tourists = store.tourists_snapshot();
    assert_eq!(tourists.len(), 1);
    assert_eq!(tourists[0].tourist_id, "t_003");

    // The alert audit trail survives the reconnect untouched.
    assert_eq!(store.alert_count(), 1);
    assert_eq!(
        store.alert(&"alert_1".into()).unwrap().status,
        AlertStatus::Resolved
    );
}

// ── Scenario: the server wins every disagreement ────────────────────

#[test]
fn authoritative_record_overrides_prediction_without_merge() {
    let store = AlertStore::new();
    apply_frame(
        &store,
        &json!({
            "event": "alert_update",
            "data": { "id": "alert_1", "status": "pending", "description": "original" }
        }),
    );
    let id = "alert_1".into();

    store
        .apply_transition(
            &id,
            &Transition::Dispatch {
                assignee: Some("off_001".into()),
            },
        )
        .unwrap();

    // The server never saw that dispatch; its record says reviewing
    // with a different description. Every predicted field is dropped.
    apply_frame(
        &store,
        &json!({
            "event": "alert_update",
            "data": { "id": "alert_1", "status": "reviewing", "description": "rewritten" }
        }),
    );

    let alert = store.alert(&id).unwrap();
    assert_eq!(alert.status, AlertStatus::Reviewing);
    assert_eq!(alert.assignee, None);
    assert_eq!(alert.description, "rewritten");
}

// ── Malformed status never poisons the store ────────────────────────

#[test]
fn unknown_status_frame_is_dropped_before_the_store() {
    let event = parse_frame(
        &json!({
            "event": "alert_update",
            "data": { "id": "alert_1", "status": "in_limbo" }
        })
        .to_string(),
    )
    .unwrap();

    assert!(normalize(event).is_none());
}
