//! Alert lifecycle state machine.
//!
//! `pending → reviewing → dispatched → resolved`, with
//! `false_positive` reachable from `pending` and `reviewing`. Both
//! terminal states are sinks; only an authoritative server record
//! flagged for reset may move an alert out of one, and that path lives
//! in the store, not here.
//!
//! [`apply`] is a pure function: it never mutates its input and never
//! touches the store, which keeps every rule in this table unit
//! testable without any async machinery.

use thiserror::Error;

use crate::model::{Alert, AlertStatus};

/// A requested lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Acknowledge the alert (pending → reviewing).
    Review,

    /// Dispatch a responder (pending/reviewing → dispatched).
    Dispatch { assignee: Option<String> },

    /// Close the alert as handled (reviewing/dispatched → resolved).
    Resolve,

    /// Close the alert as spurious (pending/reviewing → false_positive).
    MarkFalsePositive,
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Review => "review",
            Self::Dispatch { .. } => "dispatch",
            Self::Resolve => "resolve",
            Self::MarkFalsePositive => "mark_false_positive",
        }
    }
}

/// Result of a legal transition.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The transition changed the alert; here is the new record.
    Updated(Box<Alert>),

    /// The alert was already in the requested state. Deliberately not
    /// an error: retries and double-clicks must be harmless.
    Noop,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("cannot {attempted} an alert in status {from}")]
    Violation {
        from: AlertStatus,
        attempted: &'static str,
    },

    /// Dispatch onto an already-dispatched alert with a different
    /// responder. Resolving the disagreement is a human decision.
    #[error("alert already dispatched to {current}, refusing reassignment to {requested}")]
    AssigneeConflict { current: String, requested: String },
}

/// Apply `transition` to `alert`, returning the updated record or the
/// reason it is illegal.
pub fn apply(alert: &Alert, transition: &Transition) -> Result<Outcome, TransitionError> {
    use AlertStatus::{Dispatched, FalsePositive, Pending, Resolved, Reviewing};

    let violation = || TransitionError::Violation {
        from: alert.status,
        attempted: transition.name(),
    };

    match (transition, alert.status) {
        // Review: acknowledge a fresh alert. Re-acknowledging, or
        // acknowledging something already further along, is a no-op so
        // two operators racing on the same row never see an error.
        (Transition::Review, Pending) => Ok(updated(alert, Reviewing, None)),
        (Transition::Review, _) => Ok(Outcome::Noop),

        (Transition::Dispatch { assignee }, Pending | Reviewing) => {
            Ok(updated(alert, Dispatched, assignee.clone()))
        }
        (Transition::Dispatch { assignee }, Dispatched) => {
            match (alert.assignee.as_deref(), assignee.as_deref()) {
                // No requested assignee, or the same one: retrying a
                // dispatch is harmless.
                (_, None) => Ok(Outcome::Noop),
                (Some(current), Some(requested)) if current == requested => Ok(Outcome::Noop),
                (Some(current), Some(requested)) => Err(TransitionError::AssigneeConflict {
                    current: current.to_owned(),
                    requested: requested.to_owned(),
                }),
                // Dispatched with no assignee on record means the
                // server dispatched it out of band; take the
                // requested one.
                (None, Some(_)) => Ok(updated(alert, Dispatched, assignee.clone())),
            }
        }
        (Transition::Dispatch { .. }, Resolved | FalsePositive) => Err(violation()),

        (Transition::Resolve, Reviewing | Dispatched) => Ok(updated(alert, Resolved, None)),
        (Transition::Resolve, Resolved) => Ok(Outcome::Noop),
        (Transition::Resolve, Pending | FalsePositive) => Err(violation()),

        (Transition::MarkFalsePositive, Pending | Reviewing) => {
            Ok(updated(alert, FalsePositive, None))
        }
        (Transition::MarkFalsePositive, FalsePositive) => Ok(Outcome::Noop),
        // A dispatched alert has responders in motion; it must be
        // resolved, not waved off.
        (Transition::MarkFalsePositive, Dispatched | Resolved) => Err(violation()),
    }
}

fn updated(alert: &Alert, status: AlertStatus, assignee: Option<String>) -> Outcome {
    let mut next = alert.clone();
    next.status = status;
    if assignee.is_some() {
        next.assignee = assignee;
    }
    Outcome::Updated(Box::new(next))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{AlertId, AlertKind, Location, Severity};
    use chrono::{Duration, Utc};

    fn alert(status: AlertStatus, assignee: Option<&str>) -> Alert {
        let now = Utc::now();
        Alert {
            id: AlertId::from("alert_1"),
            kind: AlertKind::Anomaly,
            severity: Severity::High,
            confidence: Some(0.8),
            timestamp: now,
            location: Location::new(26.1, 91.7),
            source: None,
            subjects: vec![],
            evidence: None,
            status,
            assignee: assignee.map(str::to_owned),
            description: "Anomaly detected".into(),
            escalate_after: now + Duration::minutes(5),
        }
    }

    fn expect_status(outcome: Outcome) -> Alert {
        match outcome {
            Outcome::Updated(alert) => *alert,
            Outcome::Noop => panic!("expected an update, got a no-op"),
        }
    }

    #[test]
    fn happy_path_pending_to_resolved() {
        let a = alert(AlertStatus::Pending, None);
        let a = expect_status(apply(&a, &Transition::Review).unwrap());
        assert_eq!(a.status, AlertStatus::Reviewing);

        let dispatch = Transition::Dispatch {
            assignee: Some("off_002".into()),
        };
        let a = expect_status(apply(&a, &dispatch).unwrap());
        assert_eq!(a.status, AlertStatus::Dispatched);
        assert_eq!(a.assignee.as_deref(), Some("off_002"));

        let a = expect_status(apply(&a, &Transition::Resolve).unwrap());
        assert_eq!(a.status, AlertStatus::Resolved);
    }

    #[test]
    fn dispatch_straight_from_pending() {
        let a = alert(AlertStatus::Pending, None);
        let dispatch = Transition::Dispatch {
            assignee: Some("off_001".into()),
        };
        let a = expect_status(apply(&a, &dispatch).unwrap());
        assert_eq!(a.status, AlertStatus::Dispatched);
    }

    #[test]
    fn dispatch_without_assignee_is_legal_and_idempotent() {
        let a = alert(AlertStatus::Pending, None);
        let dispatch = Transition::Dispatch { assignee: None };
        let a = expect_status(apply(&a, &dispatch).unwrap());
        assert_eq!(a.status, AlertStatus::Dispatched);
        assert_eq!(a.assignee, None);

        assert!(matches!(apply(&a, &dispatch).unwrap(), Outcome::Noop));
    }

    #[test]
    fn review_is_never_an_error() {
        for status in [
            AlertStatus::Pending,
            AlertStatus::Reviewing,
            AlertStatus::Dispatched,
            AlertStatus::Resolved,
            AlertStatus::FalsePositive,
        ] {
            assert!(apply(&alert(status, None), &Transition::Review).is_ok());
        }
    }

    #[test]
    fn repeat_dispatch_same_assignee_is_noop() {
        let a = alert(AlertStatus::Dispatched, Some("off_002"));
        let dispatch = Transition::Dispatch {
            assignee: Some("off_002".into()),
        };
        assert!(matches!(apply(&a, &dispatch).unwrap(), Outcome::Noop));
    }

    #[test]
    fn dispatch_with_different_assignee_conflicts() {
        let a = alert(AlertStatus::Dispatched, Some("off_002"));
        let dispatch = Transition::Dispatch {
            assignee: Some("off_009".into()),
        };
        let err = apply(&a, &dispatch).unwrap_err();
        assert_eq!(
            err,
            TransitionError::AssigneeConflict {
                current: "off_002".into(),
                requested: "off_009".into(),
            }
        );
    }

    #[test]
    fn dispatch_on_terminal_alert_is_a_violation() {
        for status in [AlertStatus::Resolved, AlertStatus::FalsePositive] {
            let err = apply(
                &alert(status, None),
                &Transition::Dispatch {
                    assignee: Some("off_001".into()),
                },
            )
            .unwrap_err();
            assert!(matches!(err, TransitionError::Violation { .. }));
        }
    }

    #[test]
    fn resolve_requires_prior_acknowledgement() {
        let err = apply(&alert(AlertStatus::Pending, None), &Transition::Resolve).unwrap_err();
        assert!(matches!(
            err,
            TransitionError::Violation {
                from: AlertStatus::Pending,
                ..
            }
        ));
    }

    #[test]
    fn resolve_is_idempotent() {
        let outcome = apply(&alert(AlertStatus::Resolved, None), &Transition::Resolve).unwrap();
        assert!(matches!(outcome, Outcome::Noop));
    }

    #[test]
    fn false_positive_is_idempotent_but_not_from_resolved() {
        let outcome = apply(
            &alert(AlertStatus::FalsePositive, None),
            &Transition::MarkFalsePositive,
        )
        .unwrap();
        assert!(matches!(outcome, Outcome::Noop));

        let err = apply(
            &alert(AlertStatus::Resolved, None),
            &Transition::MarkFalsePositive,
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::Violation { .. }));
    }

    #[test]
    fn dispatched_alert_cannot_be_waved_off() {
        let err = apply(
            &alert(AlertStatus::Dispatched, Some("off_002")),
            &Transition::MarkFalsePositive,
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::Violation { .. }));
    }

    #[test]
    fn apply_never_mutates_its_input() {
        let a = alert(AlertStatus::Pending, None);
        let _ = apply(&a, &Transition::Review).unwrap();
        assert_eq!(a.status, AlertStatus::Pending);
    }
}
