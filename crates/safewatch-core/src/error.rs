// ── Core error types ──
//
// User-facing errors from safewatch-core. These are NOT wire-specific;
// consumers never see HTTP status codes or socket failures directly.
// The `From<safewatch_wire::Error>` impl translates transport-layer
// errors into domain-appropriate variants.

use thiserror::Error;

use crate::lifecycle::TransitionError;
use crate::model::{AlertStatus, Role};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    /// The command path requires a live channel; nothing is queued
    /// across a disconnect.
    #[error("Event channel unavailable")]
    ChannelUnavailable,

    // ── Lifecycle errors ─────────────────────────────────────────────
    #[error("Illegal transition: cannot {attempted} an alert in status {from}")]
    LifecycleViolation {
        from: AlertStatus,
        attempted: &'static str,
    },

    #[error("Alert already dispatched to {current}, refusing reassignment to {requested}")]
    AssigneeConflict { current: String, requested: String },

    // ── Authorization ────────────────────────────────────────────────
    #[error("Role {role} is not permitted to {operation}")]
    Unauthorized { role: Role, operation: &'static str },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Alert not found: {id}")]
    AlertNotFound { id: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from lifecycle errors ─────────────────────────────────

impl From<TransitionError> for CoreError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::Violation { from, attempted } => {
                CoreError::LifecycleViolation { from, attempted }
            }
            TransitionError::AssigneeConflict { current, requested } => {
                CoreError::AssigneeConflict { current, requested }
            }
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<safewatch_wire::Error> for CoreError {
    fn from(err: safewatch_wire::Error) -> Self {
        use safewatch_wire::Error as Wire;

        match err {
            Wire::ChannelUnavailable | Wire::CommandBufferFull => CoreError::ChannelUnavailable,
            Wire::ChannelConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason,
            },
            Wire::ChannelClosed { code, reason } => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("channel closed (code {code}): {reason}"),
            },
            Wire::Transport(ref e) => {
                if e.is_connect() || e.is_timeout() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            Wire::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Wire::Api { message, status } => CoreError::Api {
                message,
                status: Some(status),
            },
            Wire::Deserialization { message, .. } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_unavailability_translates() {
        let core: CoreError = safewatch_wire::Error::ChannelUnavailable.into();
        assert!(matches!(core, CoreError::ChannelUnavailable));

        let core: CoreError = safewatch_wire::Error::CommandBufferFull.into();
        assert!(matches!(core, CoreError::ChannelUnavailable));
    }

    #[test]
    fn transition_errors_translate() {
        let core: CoreError = TransitionError::Violation {
            from: AlertStatus::Resolved,
            attempted: "dispatch",
        }
        .into();
        assert!(matches!(
            core,
            CoreError::LifecycleViolation {
                from: AlertStatus::Resolved,
                ..
            }
        ));
    }
}
