// ── Central reactive alert store ──
//
// Thread-safe storage for alerts, tourist pings, and system status.
// Mutations are broadcast to subscribers via `watch` channels.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::collection::AlertCollection;
use crate::error::CoreError;
use crate::lifecycle::Transition;
use crate::model::{Alert, AlertId, AlertStatus, SystemStatus, TouristPing};
use crate::normalize::Normalized;
use crate::stream::{AlertFilter, AlertStream};

/// Central reactive store for the monitoring session.
///
/// Alerts live in a keyed, order-preserving collection; tourist pings
/// and system status are plain `watch` values replaced wholesale per
/// batch. Alerts are never deleted during a session — resolved and
/// false-positive records stay for the audit trail and are filtered by
/// adapters.
pub struct AlertStore {
    alerts: AlertCollection,
    tourists: watch::Sender<Arc<Vec<TouristPing>>>,
    status: watch::Sender<SystemStatus>,
    last_event: watch::Sender<Option<DateTime<Utc>>>,
}

impl AlertStore {
    pub fn new() -> Self {
        let (tourists, _) = watch::channel(Arc::new(Vec::new()));
        let (status, _) = watch::channel(SystemStatus::default());
        let (last_event, _) = watch::channel(None);

        Self {
            alerts: AlertCollection::new(),
            tourists,
            status,
            last_event,
        }
    }

    // ── Inbound application ──────────────────────────────────────────

    /// Apply one normalized inbound event. The single entry point for
    /// the engine's inbound pump.
    pub fn apply(&self, normalized: Normalized) {
        self.last_event.send_replace(Some(Utc::now()));

        match normalized {
            Normalized::NewAlert(alert) => self.alerts.insert_new(*alert),
            Normalized::Authoritative {
                alert,
                supersedes,
                reset,
            } => {
                self.alerts
                    .apply_authoritative(*alert, supersedes.as_ref(), reset);
            }
            Normalized::TouristBatch(pings) => {
                self.tourists.send_replace(Arc::new(pings));
            }
            Normalized::StatusSnapshot(status) => {
                self.status.send_replace(status);
            }
        }
    }

    /// Run an optimistic lifecycle transition against the effective
    /// record for `id`. Returns whether anything changed.
    pub fn apply_transition(
        &self,
        id: &AlertId,
        transition: &Transition,
    ) -> Result<bool, CoreError> {
        self.alerts.apply_transition(id, transition)
    }

    // ── Lookups / snapshots ──────────────────────────────────────────

    /// Effective record for an alert (prediction-overlaid).
    pub fn alert(&self, id: &AlertId) -> Option<Arc<Alert>> {
        self.alerts.get(id)
    }

    /// Current alert feed, newest first (cheap `Arc` clone).
    pub fn alerts_snapshot(&self) -> Arc<Vec<Arc<Alert>>> {
        self.alerts.snapshot()
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.len()
    }

    /// Filtered view over the current snapshot. Restartable: every
    /// call starts from a fresh snapshot.
    pub fn query(&self, filter: &AlertFilter) -> Vec<Arc<Alert>> {
        self.alerts
            .snapshot()
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect()
    }

    /// Pending alerts sitting past their escalation deadline.
    pub fn overdue(&self, now: DateTime<Utc>) -> Vec<Arc<Alert>> {
        self.query(&AlertFilter::ByStatus(AlertStatus::Pending))
            .into_iter()
            .filter(|a| a.is_overdue(now))
            .collect()
    }

    /// Latest tourist location snapshot.
    pub fn tourists_snapshot(&self) -> Arc<Vec<TouristPing>> {
        self.tourists.borrow().clone()
    }

    /// Latest system counters.
    pub fn system_status(&self) -> SystemStatus {
        *self.status.borrow()
    }

    /// When the last inbound event was applied, if any.
    pub fn last_event(&self) -> Option<DateTime<Utc>> {
        *self.last_event.borrow()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_alerts(&self) -> AlertStream {
        AlertStream::new(self.alerts.subscribe())
    }

    pub fn subscribe_tourists(&self) -> watch::Receiver<Arc<Vec<TouristPing>>> {
        self.tourists.subscribe()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SystemStatus> {
        self.status.subscribe()
    }
}

impl Default for AlertStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{AlertKind, Location, Severity, SystemHealth};
    use chrono::Duration;

    fn alert(id: &str, status: AlertStatus) -> Alert {
        let now = Utc::now();
        Alert {
            id: AlertId::from(id),
            kind: AlertKind::Violence,
            severity: Severity::High,
            confidence: Some(0.9),
            timestamp: now,
            location: Location::new(26.1, 91.7),
            source: Some("cam_004".into()),
            subjects: vec!["t_001".into()],
            evidence: None,
            status,
            assignee: None,
            description: "Violence detected".into(),
            escalate_after: now + Duration::minutes(5),
        }
    }

    fn ping(id: &str) -> TouristPing {
        TouristPing {
            tourist_id: id.into(),
            location: Location::new(26.1, 91.7),
            timestamp: None,
            battery_level: None,
            heart_rate: None,
            status: None,
        }
    }

    #[test]
    fn tourist_batches_replace_wholesale() {
        let store = AlertStore::new();

        store.apply(Normalized::TouristBatch(vec![
            ping("t_001"),
            ping("t_002"),
            ping("t_003"),
        ]));
        assert_eq!(store.tourists_snapshot().len(), 3);

        // The next batch omits t_002 and t_003; they are gone, not
        // merged in from the previous snapshot.
        store.apply(Normalized::TouristBatch(vec![ping("t_001")]));
        let snap = store.tourists_snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].tourist_id, "t_001");
    }

    #[test]
    fn status_snapshot_replaces_wholesale() {
        let store = AlertStore::new();

        store.apply(Normalized::StatusSnapshot(SystemStatus {
            cameras_online: 5,
            cameras_total: 5,
            tourists_active: 120,
            alerts_pending: 2,
            health: SystemHealth::Healthy,
        }));

        store.apply(Normalized::StatusSnapshot(SystemStatus {
            cameras_online: 3,
            cameras_total: 5,
            tourists_active: 0,
            alerts_pending: 0,
            health: SystemHealth::Degraded,
        }));

        let status = store.system_status();
        assert_eq!(status.cameras_online, 3);
        // Counters absent from the new push read zero.
        assert_eq!(status.tourists_active, 0);
        assert_eq!(status.health, SystemHealth::Degraded);
    }

    #[test]
    fn query_filters_the_snapshot() {
        let store = AlertStore::new();
        store.apply(Normalized::NewAlert(Box::new(alert(
            "a1",
            AlertStatus::Pending,
        ))));
        store.apply(Normalized::NewAlert(Box::new(alert(
            "a2",
            AlertStatus::Pending,
        ))));
        store
            .apply_transition(&"a2".into(), &Transition::Review)
            .unwrap();

        assert_eq!(
            store.query(&AlertFilter::ByStatus(AlertStatus::Pending)).len(),
            1
        );
        assert_eq!(store.query(&AlertFilter::Open).len(), 2);
    }

    #[test]
    fn overdue_surfaces_stale_pending_alerts() {
        let store = AlertStore::new();
        store.apply(Normalized::NewAlert(Box::new(alert(
            "a1",
            AlertStatus::Pending,
        ))));

        assert!(store.overdue(Utc::now()).is_empty());

        let later = Utc::now() + Duration::minutes(10);
        let overdue = store.overdue(later);
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id.to_string(), "a1");
    }

    #[test]
    fn resolved_alerts_are_kept_for_the_audit_trail() {
        let store = AlertStore::new();
        store.apply(Normalized::NewAlert(Box::new(alert(
            "a1",
            AlertStatus::Pending,
        ))));
        store.apply(Normalized::Authoritative {
            alert: Box::new(alert("a1", AlertStatus::Resolved)),
            supersedes: None,
            reset: false,
        });

        assert_eq!(store.alert_count(), 1);
        assert!(store.query(&AlertFilter::Open).is_empty());
        assert_eq!(
            store.alert(&"a1".into()).unwrap().status,
            AlertStatus::Resolved
        );
    }
}
