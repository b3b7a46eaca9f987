// ── Command API ──
//
// All write operations flow through a unified `Command` enum. The
// engine gates each variant by role, validates it against the store,
// and emits the corresponding wire frame.

use crate::error::CoreError;
use crate::lifecycle::Transition;
use crate::model::{AlertId, AlertKind, Location, Role, Severity};

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<(), CoreError>>,
}

/// All possible write operations against the monitoring backend.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Alert lifecycle ──────────────────────────────────────────────
    /// Acknowledge an alert (pending → reviewing).
    Review { id: AlertId },

    /// Dispatch a responder. Defaults to the signed-in operator when
    /// no assignee is given.
    Dispatch {
        id: AlertId,
        assignee: Option<String>,
    },

    /// Close an alert as spurious.
    MarkFalsePositive { id: AlertId },

    /// Close an alert as handled.
    Resolve { id: AlertId },

    // ── Alert creation ───────────────────────────────────────────────
    /// Raise a human-originated alert (e.g., phoned-in report or
    /// simulated panic).
    RaiseAlert(RaiseAlertRequest),

    // ── Camera subscriptions ─────────────────────────────────────────
    SubscribeCamera { camera_id: String },
    UnsubscribeCamera { camera_id: String },
}

/// Fields an operator supplies when raising an alert by hand. The
/// engine fills in the local placeholder id and the pending status.
#[derive(Debug, Clone)]
pub struct RaiseAlertRequest {
    pub kind: AlertKind,
    pub severity: Severity,
    pub location: Option<Location>,
    pub tourist_id: Option<String>,
    pub description: String,
}

impl Command {
    /// Short operation name for diagnostics and `Unauthorized` errors.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Review { .. } => "review an alert",
            Self::Dispatch { .. } => "dispatch a responder",
            Self::MarkFalsePositive { .. } => "mark an alert false positive",
            Self::Resolve { .. } => "resolve an alert",
            Self::RaiseAlert(_) => "raise an alert",
            Self::SubscribeCamera { .. } => "subscribe to a camera",
            Self::UnsubscribeCamera { .. } => "unsubscribe from a camera",
        }
    }

    /// Check this command against the operator's role.
    ///
    /// Dispatch and false-positive marking need dispatch authority;
    /// everything else needs any non-viewer role. Authoritative
    /// server records bypass this entirely — gating applies to
    /// command emission only.
    pub fn authorize(&self, role: Role) -> Result<(), CoreError> {
        let permitted = match self {
            Self::Dispatch { .. } | Self::MarkFalsePositive { .. } => role.can_dispatch(),
            _ => role.can_review(),
        };

        if permitted {
            Ok(())
        } else {
            Err(CoreError::Unauthorized {
                role,
                operation: self.operation(),
            })
        }
    }

    /// The lifecycle transition this command requests, if any.
    pub(crate) fn transition(&self, default_assignee: &str) -> Option<(AlertId, Transition)> {
        match self {
            Self::Review { id } => Some((id.clone(), Transition::Review)),
            Self::Dispatch { id, assignee } => Some((
                id.clone(),
                Transition::Dispatch {
                    assignee: Some(
                        assignee
                            .clone()
                            .unwrap_or_else(|| default_assignee.to_owned()),
                    ),
                },
            )),
            Self::MarkFalsePositive { id } => Some((id.clone(), Transition::MarkFalsePositive)),
            Self::Resolve { id } => Some((id.clone(), Transition::Resolve)),
            Self::RaiseAlert(_) | Self::SubscribeCamera { .. } | Self::UnsubscribeCamera { .. } => {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_requires_dispatch_authority() {
        let cmd = Command::Dispatch {
            id: "a1".into(),
            assignee: None,
        };

        assert!(cmd.authorize(Role::Dispatcher).is_ok());
        assert!(cmd.authorize(Role::Admin).is_ok());
        assert!(matches!(
            cmd.authorize(Role::Operator),
            Err(CoreError::Unauthorized { .. })
        ));
    }

    #[test]
    fn false_positive_requires_dispatch_authority() {
        let cmd = Command::MarkFalsePositive { id: "a1".into() };
        assert!(matches!(
            cmd.authorize(Role::Operator),
            Err(CoreError::Unauthorized { .. })
        ));
        assert!(cmd.authorize(Role::Admin).is_ok());
    }

    #[test]
    fn viewers_cannot_write_at_all() {
        let cmd = Command::Review { id: "a1".into() };
        assert!(matches!(
            cmd.authorize(Role::Viewer),
            Err(CoreError::Unauthorized { .. })
        ));
        assert!(cmd.authorize(Role::Operator).is_ok());
    }

    #[test]
    fn dispatch_defaults_to_the_signed_in_operator() {
        let cmd = Command::Dispatch {
            id: "a1".into(),
            assignee: None,
        };

        let Some((_, Transition::Dispatch { assignee })) = cmd.transition("off_007") else {
            panic!("expected a dispatch transition");
        };
        assert_eq!(assignee.as_deref(), Some("off_007"));
    }
}
