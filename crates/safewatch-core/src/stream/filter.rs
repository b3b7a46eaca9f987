// ── Filter predicates for alert queries ──
//
// Used by the TUI to filter snapshots without re-querying the store.

use crate::model::{Alert, AlertKind, AlertStatus, Severity};

/// Filter predicate for alert collections.
pub enum AlertFilter {
    All,
    ByStatus(AlertStatus),
    ByKind(AlertKind),
    BySeverity(Severity),
    ByAssignee(String),
    /// Alerts still awaiting handling (not resolved/false_positive).
    Open,
    Custom(Box<dyn Fn(&Alert) -> bool + Send + Sync>),
}

impl AlertFilter {
    pub fn matches(&self, alert: &Alert) -> bool {
        match self {
            Self::All => true,
            Self::ByStatus(status) => alert.status == *status,
            Self::ByKind(kind) => alert.kind == *kind,
            Self::BySeverity(severity) => alert.severity == *severity,
            Self::ByAssignee(assignee) => alert.assignee.as_deref() == Some(assignee),
            Self::Open => !alert.status.is_terminal(),
            Self::Custom(f) => f(alert),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlertId, Location};
    use chrono::{Duration, Utc};

    fn alert(status: AlertStatus, severity: Severity) -> Alert {
        let now = Utc::now();
        Alert {
            id: AlertId::from("a1"),
            kind: AlertKind::Geofence,
            severity,
            confidence: None,
            timestamp: now,
            location: Location::default(),
            source: None,
            subjects: vec![],
            evidence: None,
            status,
            assignee: Some("off_002".into()),
            description: "Restricted zone entry".into(),
            escalate_after: now + Duration::minutes(5),
        }
    }

    #[test]
    fn filters_match_expected_fields() {
        let a = alert(AlertStatus::Dispatched, Severity::Critical);

        assert!(AlertFilter::All.matches(&a));
        assert!(AlertFilter::ByStatus(AlertStatus::Dispatched).matches(&a));
        assert!(AlertFilter::ByKind(AlertKind::Geofence).matches(&a));
        assert!(AlertFilter::BySeverity(Severity::Critical).matches(&a));
        assert!(AlertFilter::ByAssignee("off_002".into()).matches(&a));
        assert!(AlertFilter::Open.matches(&a));
        assert!(!AlertFilter::ByStatus(AlertStatus::Pending).matches(&a));
    }

    #[test]
    fn open_excludes_terminal() {
        assert!(!AlertFilter::Open.matches(&alert(AlertStatus::Resolved, Severity::Low)));
        assert!(!AlertFilter::Open.matches(&alert(AlertStatus::FalsePositive, Severity::Low)));
    }

    #[test]
    fn custom_predicate() {
        let overdue_critical =
            AlertFilter::Custom(Box::new(|a: &Alert| a.severity == Severity::Critical));
        assert!(overdue_critical.matches(&alert(AlertStatus::Pending, Severity::Critical)));
        assert!(!overdue_critical.matches(&alert(AlertStatus::Pending, Severity::Low)));
    }
}
