//! Outbound command frames.
//!
//! All operator commands are fire-and-forget JSON envelopes
//! `{ "command": "...", "data": ... }`. Success is only confirmed
//! indirectly, via a later `alert_update` event from the server.

use serde::Serialize;

use crate::events::WireLocation;

/// A command frame written to the event channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "command", content = "data", rename_all = "snake_case")]
pub enum CommandFrame {
    /// Raise a human-originated alert (e.g., simulated panic).
    SendAlert(AlertDraft),

    /// Request a lifecycle transition on an existing alert.
    UpdateAlertStatus {
        id: String,
        status: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        assignee: Option<String>,
    },

    /// Start receiving frames/detections for a camera.
    SubscribeCamera { camera_id: String },

    /// Stop receiving frames/detections for a camera.
    UnsubscribeCamera { camera_id: String },
}

/// Partial alert for operator-raised incidents. The server assigns the
/// canonical id and echoes the full record back as an `alert_update`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlertDraft {
    /// Client-side placeholder id, superseded by the server's.
    pub local_id: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub severity: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<WireLocation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tourist_id: Option<String>,

    pub description: String,
}

impl CommandFrame {
    /// Serialize to the text frame written to the socket.
    pub fn to_frame(&self) -> String {
        // CommandFrame contains only serializable primitives; failure
        // here would be a programming error in the frame definitions.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn update_status_frame_shape() {
        let frame = CommandFrame::UpdateAlertStatus {
            id: "alert_1".into(),
            status: "dispatched".into(),
            assignee: Some("off_002".into()),
        };

        let value: serde_json::Value = serde_json::from_str(&frame.to_frame()).unwrap();
        assert_eq!(value["command"], "update_alert_status");
        assert_eq!(value["data"]["id"], "alert_1");
        assert_eq!(value["data"]["assignee"], "off_002");
    }

    #[test]
    fn absent_assignee_is_omitted() {
        let frame = CommandFrame::UpdateAlertStatus {
            id: "alert_1".into(),
            status: "reviewing".into(),
            assignee: None,
        };

        let value: serde_json::Value = serde_json::from_str(&frame.to_frame()).unwrap();
        assert!(value["data"].get("assignee").is_none());
    }

    #[test]
    fn send_alert_frame_shape() {
        let frame = CommandFrame::SendAlert(AlertDraft {
            local_id: "local-123".into(),
            kind: "panic".into(),
            severity: "high".into(),
            location: None,
            tourist_id: Some("t_042".into()),
            description: "Simulated panic".into(),
        });

        let value: serde_json::Value = serde_json::from_str(&frame.to_frame()).unwrap();
        assert_eq!(value["command"], "send_alert");
        assert_eq!(value["data"]["type"], "panic");
        assert_eq!(value["data"]["local_id"], "local-123");
    }
}
