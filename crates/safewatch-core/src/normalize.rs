//! Event normalizer.
//!
//! Translates raw [`WireEvent`]s into canonical domain values,
//! applying producer-specific defaults for absent fields. This is the
//! only place wire payloads are interpreted; everything downstream
//! sees [`Normalized`] values built from the domain model.
//!
//! Unusable frames (an `alert_update` whose status string is not in
//! the lifecycle vocabulary) are dropped with a logged diagnostic and
//! never abort the inbound pump.

use chrono::{Duration, Utc};
use safewatch_wire::events::{
    AlertRecordPayload, DetectionPayload, PanicPayload, SystemStatusPayload, TouristPingPayload,
    WireEvent, WireEvidence, WireLocation,
};

use crate::model::{
    Alert, AlertId, AlertKind, AlertStatus, Evidence, Location, Severity, SystemHealth,
    SystemStatus, TouristPing,
};

/// Confidence assumed for camera detections that omit one.
pub const DEFAULT_CONFIDENCE: f64 = 0.8;

/// Confidence assumed for wearable panic triggers. A pressed panic
/// button is near-certain by construction.
pub const PANIC_CONFIDENCE: f64 = 0.95;

/// Description used when a producer sends none.
pub const DEFAULT_DESCRIPTION: &str = "Alert received";

/// How long a pending alert may sit before it is flagged overdue.
pub const ESCALATION_WINDOW: Duration = Duration::minutes(5);

/// A wire event translated into domain terms, ready for the store.
#[derive(Debug, Clone)]
pub enum Normalized {
    /// A machine-originated alert; insert at the head of the feed.
    NewAlert(Box<Alert>),

    /// The server's full statement of an alert record. Replaces the
    /// stored alert field-for-field (last write wins, no merge).
    Authoritative {
        alert: Box<Alert>,
        /// Local placeholder this record supersedes, when the server
        /// echoes one back for an operator-raised alert.
        supersedes: Option<AlertId>,
        /// Permit replacing a terminal stored status with a
        /// non-terminal one (test/demo reseeding only).
        reset: bool,
    },

    /// Full tourist location snapshot; replaces the collection.
    TouristBatch(Vec<TouristPing>),

    /// Full system counters snapshot; replaces the previous one.
    StatusSnapshot(SystemStatus),
}

/// Normalize one inbound event. Returns `None` when the frame cannot
/// be turned into a usable domain value.
pub fn normalize(event: WireEvent) -> Option<Normalized> {
    match event {
        WireEvent::NewAlert(payload) => Some(Normalized::NewAlert(Box::new(detection(payload)))),
        WireEvent::PanicAlert(payload) => Some(Normalized::NewAlert(Box::new(panic_alert(payload)))),
        WireEvent::AlertUpdate(payload) => authoritative(payload),
        WireEvent::LocationUpdate(pings) => Some(Normalized::TouristBatch(
            pings.into_iter().map(tourist_ping).collect(),
        )),
        WireEvent::SystemStatus(payload) => Some(Normalized::StatusSnapshot(status(payload))),
    }
}

fn detection(payload: DetectionPayload) -> Alert {
    let timestamp = payload.timestamp.unwrap_or_else(Utc::now);
    let details = payload.details;

    Alert {
        id: AlertId::new_local(),
        kind: parse_kind(payload.kind.as_deref()),
        severity: parse_severity(details.severity.as_deref(), Severity::High),
        confidence: Some(machine_confidence(details.confidence, DEFAULT_CONFIDENCE)),
        timestamp,
        location: location(details.location),
        source: details.camera_id,
        subjects: details.tourist_ids,
        evidence: details.evidence.map(evidence),
        status: AlertStatus::Pending,
        assignee: None,
        description: details
            .description
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_owned()),
        escalate_after: timestamp + ESCALATION_WINDOW,
    }
}

fn panic_alert(payload: PanicPayload) -> Alert {
    let timestamp = payload.timestamp.unwrap_or_else(Utc::now);

    let description = match payload.tourist_name {
        Some(name) => format!("Panic button pressed by {name}"),
        None => format!("Panic button pressed by {}", payload.tourist_id),
    };

    Alert {
        id: AlertId::new_local(),
        kind: AlertKind::Panic,
        severity: parse_severity(payload.severity.as_deref(), Severity::High),
        confidence: Some(machine_confidence(payload.confidence, PANIC_CONFIDENCE)),
        timestamp,
        location: location(payload.location),
        source: payload.camera_id,
        subjects: vec![payload.tourist_id],
        evidence: None,
        status: AlertStatus::Pending,
        assignee: None,
        description,
        escalate_after: timestamp + ESCALATION_WINDOW,
    }
}

fn authoritative(payload: AlertRecordPayload) -> Option<Normalized> {
    // An unrecognized status would poison the lifecycle table; drop
    // the frame rather than guess.
    let Ok(status) = payload.status.parse::<AlertStatus>() else {
        tracing::warn!(
            id = %payload.id,
            status = %payload.status,
            "dropping alert_update with unrecognized status"
        );
        return None;
    };

    let timestamp = payload.timestamp.unwrap_or_else(Utc::now);
    let supersedes = payload.local_id.as_deref().and_then(parse_local_id);

    let alert = Alert {
        id: AlertId::from(payload.id),
        kind: parse_kind(payload.kind.as_deref()),
        severity: parse_severity(payload.severity.as_deref(), Severity::High),
        confidence: payload
            .confidence
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0)),
        timestamp,
        location: location(payload.location),
        source: payload.camera_id,
        subjects: payload.tourist_ids,
        evidence: payload.evidence.map(evidence),
        status,
        assignee: payload.assignee,
        description: payload
            .description
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_owned()),
        escalate_after: timestamp + ESCALATION_WINDOW,
    };

    Some(Normalized::Authoritative {
        alert: Box::new(alert),
        supersedes,
        reset: payload.authoritative_reset,
    })
}

/// Parse a `local-{uuid}` placeholder id echoed back by the server.
fn parse_local_id(raw: &str) -> Option<AlertId> {
    let uuid = raw.strip_prefix("local-")?.parse().ok()?;
    Some(AlertId::Local(uuid))
}

fn tourist_ping(payload: TouristPingPayload) -> TouristPing {
    TouristPing {
        tourist_id: payload.tourist_id,
        location: location(payload.location),
        timestamp: payload.timestamp,
        battery_level: payload.battery_level,
        heart_rate: payload.heart_rate,
        status: payload.status,
    }
}

fn status(payload: SystemStatusPayload) -> SystemStatus {
    SystemStatus {
        cameras_online: payload.cameras_online,
        cameras_total: payload.cameras_total,
        tourists_active: payload.tourists_active,
        alerts_pending: payload.alerts_pending,
        health: payload
            .system_health
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(SystemHealth::Unknown),
    }
}

/// Confidence for a machine-originated alert, held to the unit
/// interval. Producers occasionally leak raw model scores above 1;
/// clamp rather than drop the whole detection. Non-finite values fall
/// back to the default.
fn machine_confidence(raw: Option<f64>, default: f64) -> f64 {
    match raw {
        Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
        _ => default,
    }
}

fn parse_kind(raw: Option<&str>) -> AlertKind {
    raw.and_then(|s| s.parse().ok())
        .unwrap_or(AlertKind::Violence)
}

fn parse_severity(raw: Option<&str>, default: Severity) -> Severity {
    raw.and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn location(raw: Option<WireLocation>) -> Location {
    raw.map_or_else(Location::default, |loc| Location {
        lat: loc.lat,
        lng: loc.lng,
        label: loc.label,
    })
}

fn evidence(raw: WireEvidence) -> Evidence {
    Evidence {
        media: raw.media,
        metadata: raw.metadata,
    }
}
