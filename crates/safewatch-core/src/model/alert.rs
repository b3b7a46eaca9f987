// ── Canonical alert record ──
//
// The normalized incident entity every consumer depends on. Producers
// (camera detectors, wearables, operators) are translated into this
// one shape by the normalizer; nothing downstream ever sees a raw
// producer payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::alert_id::AlertId;

/// Closed set of incident categories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlertKind {
    Violence,
    Anomaly,
    Geofence,
    Panic,
    Missing,
}

/// Alert severity. Drives scheduling and UI emphasis, never model
/// invariants. Set once at creation; only an explicit human override
/// may change it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Lifecycle state of an alert. Legal transitions live in
/// [`crate::lifecycle`]; nothing else mutates this field.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlertStatus {
    Pending,
    Reviewing,
    Dispatched,
    Resolved,
    FalsePositive,
}

impl AlertStatus {
    /// `resolved` and `false_positive` are terminal sinks.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::FalsePositive)
    }
}

/// Coordinate pair plus optional human-readable label.
///
/// Producers that omit geodata fall back to all-zero coordinates — a
/// degraded case indistinguishable on the wire from a legitimate
/// origin fix. `is_unknown` lets adapters render "location unknown"
/// instead of plotting (0, 0).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    pub label: Option<String>,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            label: None,
        }
    }

    /// True when both coordinates are exactly zero (producer omitted
    /// geodata).
    pub fn is_unknown(&self) -> bool {
        self.lat == 0.0 && self.lng == 0.0
    }
}

/// Media references plus free-form metadata. Immutable once attached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub media: Vec<String>,
    pub metadata: serde_json::Value,
}

/// The canonical incident record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub kind: AlertKind,
    pub severity: Severity,

    /// Confidence in [0, 1]. `None` for human-authored alerts;
    /// machine producers get a producer-specific default when omitted.
    pub confidence: Option<f64>,

    /// When the underlying event occurred (not when it was received).
    pub timestamp: DateTime<Utc>,

    pub location: Location,

    /// Originating camera/device id, when known.
    pub source: Option<String>,

    /// Tourist identifiers affected. Order irrelevant, may be empty.
    pub subjects: Vec<String>,

    pub evidence: Option<Evidence>,

    pub status: AlertStatus,

    /// Responder currently responsible, once dispatched.
    pub assignee: Option<String>,

    pub description: String,

    /// Deadline after which a still-pending alert is flagged overdue.
    /// Escalation itself is a server decision; this only drives the
    /// local overdue highlight.
    pub escalate_after: DateTime<Utc>,
}

impl Alert {
    /// Whether this alert is still pending past its escalation
    /// deadline.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == AlertStatus::Pending && now > self.escalate_after
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(status: AlertStatus) -> Alert {
        let now = Utc::now();
        Alert {
            id: AlertId::from("alert_1"),
            kind: AlertKind::Violence,
            severity: Severity::High,
            confidence: Some(0.9),
            timestamp: now,
            location: Location::new(28.65, 77.23),
            source: Some("cam_004".into()),
            subjects: vec!["t_001".into()],
            evidence: None,
            status,
            assignee: None,
            description: "Violence detected".into(),
            escalate_after: now + Duration::minutes(5),
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(AlertStatus::Resolved.is_terminal());
        assert!(AlertStatus::FalsePositive.is_terminal());
        assert!(!AlertStatus::Pending.is_terminal());
        assert!(!AlertStatus::Reviewing.is_terminal());
        assert!(!AlertStatus::Dispatched.is_terminal());
    }

    #[test]
    fn status_round_trips_through_strings() {
        let status: AlertStatus = "false_positive".parse().unwrap();
        assert_eq!(status, AlertStatus::FalsePositive);
        assert_eq!(status.to_string(), "false_positive");
    }

    #[test]
    fn zero_location_is_unknown() {
        assert!(Location::default().is_unknown());
        assert!(!Location::new(28.65, 77.23).is_unknown());
    }

    #[test]
    fn overdue_only_while_pending() {
        let past = Utc::now() + Duration::minutes(10);
        let mut alert = sample(AlertStatus::Pending);
        assert!(alert.is_overdue(past));

        alert.status = AlertStatus::Dispatched;
        assert!(!alert.is_overdue(past));
    }
}
