//! Inbound event envelopes.
//!
//! Every frame the backend pushes is a tagged envelope
//! `{ "event": "...", "data": ... }`. The closed [`WireEvent`] union
//! covers every producer; adding a new event kind is a localized,
//! compile-checked change here plus one normalizer arm.
//!
//! Field values stay close to the wire (strings for severity/status,
//! raw coordinates) — `safewatch-core`'s normalizer owns defaulting
//! and translation into domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── WireEvent ───────────────────────────────────────────────────────

/// A parsed inbound envelope from the monitoring backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum WireEvent {
    /// Camera-based AI detection. Creates one alert.
    NewAlert(DetectionPayload),

    /// Wearable panic/health device trigger. Creates one panic alert.
    PanicAlert(PanicPayload),

    /// Authoritative full alert record. Overwrites the matching alert.
    AlertUpdate(AlertRecordPayload),

    /// Tourist location batch. Replaces the ping collection wholesale.
    LocationUpdate(Vec<TouristPingPayload>),

    /// Aggregate system counters. Replaces the status wholesale.
    SystemStatus(SystemStatusPayload),
}

// ── Payloads ────────────────────────────────────────────────────────

/// Generic detection envelope: `{type, timestamp, details: {...}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionPayload {
    /// Detection kind ("violence", "anomaly", "geofence", "missing").
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    /// When the underlying event occurred (not when it was received).
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub details: DetectionDetails,
}

/// Nested detail block of a detection envelope. Every field is
/// optional on the wire; the normalizer applies defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionDetails {
    #[serde(default)]
    pub confidence: Option<f64>,

    #[serde(default)]
    pub severity: Option<String>,

    #[serde(default)]
    pub location: Option<WireLocation>,

    #[serde(default)]
    pub camera_id: Option<String>,

    #[serde(default)]
    pub tourist_ids: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub evidence: Option<WireEvidence>,
}

/// Wearable panic envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanicPayload {
    pub tourist_id: String,

    #[serde(default)]
    pub tourist_name: Option<String>,

    #[serde(default)]
    pub location: Option<WireLocation>,

    #[serde(default)]
    pub camera_id: Option<String>,

    /// "high" or "critical" per device payload.
    #[serde(default)]
    pub severity: Option<String>,

    #[serde(default)]
    pub confidence: Option<f64>,

    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Full alert record as the server states it. Last write wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecordPayload {
    pub id: String,

    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub severity: Option<String>,

    #[serde(default)]
    pub confidence: Option<f64>,

    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub location: Option<WireLocation>,

    #[serde(default)]
    pub camera_id: Option<String>,

    #[serde(default)]
    pub tourist_ids: Vec<String>,

    pub status: String,

    #[serde(default)]
    pub assignee: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub evidence: Option<WireEvidence>,

    /// Echo of the client-side placeholder id from a `send_alert`
    /// draft. Present only on the first record for an operator-raised
    /// alert; lets the client retire its local placeholder.
    #[serde(default)]
    pub local_id: Option<String>,

    /// Set only by test/demo reseeding: allows a terminal status in the
    /// store to be replaced by a non-terminal one.
    #[serde(default)]
    pub authoritative_reset: bool,
}

/// One entry of a tourist location batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TouristPingPayload {
    pub tourist_id: String,

    #[serde(default)]
    pub location: Option<WireLocation>,

    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub battery_level: Option<u8>,

    #[serde(default)]
    pub heart_rate: Option<u16>,

    #[serde(default)]
    pub status: Option<String>,
}

/// Aggregate system counters, replaced wholesale on each push.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemStatusPayload {
    #[serde(default)]
    pub cameras_online: u32,

    #[serde(default)]
    pub cameras_total: u32,

    #[serde(default)]
    pub tourists_active: u32,

    #[serde(default)]
    pub alerts_pending: u32,

    #[serde(default)]
    pub system_health: Option<String>,
}

/// Coordinate pair with an optional human-readable label.
///
/// Producers disagree on field spelling (`lat`/`lng` vs
/// `latitude`/`longitude`); both are accepted. Missing coordinates
/// default to zero — a known degraded case the model layer exposes as
/// "location unknown".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireLocation {
    #[serde(alias = "latitude", default)]
    pub lat: f64,

    #[serde(alias = "longitude", default)]
    pub lng: f64,

    #[serde(default)]
    pub label: Option<String>,
}

/// Media references plus free-form metadata, immutable once attached.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireEvidence {
    #[serde(default)]
    pub media: Vec<String>,

    #[serde(default)]
    pub metadata: serde_json::Value,
}

// ── Frame parsing ───────────────────────────────────────────────────

/// Parse a text frame into a [`WireEvent`].
///
/// Malformed frames (unknown discriminator, unparseable payload) are
/// dropped with a logged diagnostic and never abort the channel.
pub fn parse_frame(text: &str) -> Option<WireEvent> {
    match serde_json::from_str::<WireEvent>(text) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!(error = %e, "dropping malformed inbound frame");
            None
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
