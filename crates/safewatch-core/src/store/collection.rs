// ── Reactive alert collection ──
//
// Lock-free keyed storage with an insertion-order index and push-based
// change notification via `watch` channels.

use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use tokio::sync::watch;

use crate::error::CoreError;
use crate::lifecycle::{self, Outcome, Transition};
use crate::model::{Alert, AlertId};

/// The alert collection behind the store.
///
/// `DashMap` holds the authoritative records keyed by id; a separate
/// newest-first index preserves arrival order (alerts are never
/// reordered by timestamp). Optimistic lifecycle transitions live in a
/// prediction side buffer that overlays the authoritative record until
/// the server's own version arrives. Every committed mutation rebuilds
/// the snapshot subscribers receive and bumps a version counter.
pub(crate) struct AlertCollection {
    /// Authoritative records as last stated by the server (or as
    /// first observed for machine-originated alerts).
    by_id: DashMap<AlertId, Arc<Alert>>,

    /// Optimistic transition results, overlaid on reads and discarded
    /// wholesale when an authoritative record for the id arrives.
    predictions: DashMap<AlertId, Arc<Alert>>,

    /// Arrival order, newest first.
    order: RwLock<Vec<AlertId>>,

    /// Version counter, bumped on every committed mutation.
    version: watch::Sender<u64>,

    /// Full effective snapshot, rebuilt on mutation.
    snapshot: watch::Sender<Arc<Vec<Arc<Alert>>>>,
}

impl AlertCollection {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            predictions: DashMap::new(),
            order: RwLock::new(Vec::new()),
            version,
            snapshot,
        }
    }

    /// Insert a freshly normalized machine alert at the head of the
    /// feed. An id collision falls back to a plain replace without
    /// disturbing the order index.
    pub(crate) fn insert_new(&self, alert: Alert) {
        let id = alert.id.clone();
        let is_new = self.by_id.insert(id.clone(), Arc::new(alert)).is_none();
        if is_new {
            self.order
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(0, id);
        }

        self.commit();
    }

    /// Apply the server's full statement of an alert record.
    ///
    /// Last write wins field-for-field; any prediction for the id is
    /// discarded first. A terminal stored status is never replaced by
    /// a non-terminal one unless `reset` is set. Returns whether the
    /// record was applied.
    pub(crate) fn apply_authoritative(
        &self,
        alert: Alert,
        supersedes: Option<&AlertId>,
        reset: bool,
    ) -> bool {
        let id = alert.id.clone();

        if let Some(local) = supersedes {
            self.retire_placeholder(local, &id);
        }

        // Authoritative arrival invalidates the optimistic overlay
        // even when the record itself is rejected below.
        self.predictions.remove(&id);

        if !reset && self.is_terminal_regression(&id, &alert) {
            tracing::warn!(
                id = %id,
                incoming = %alert.status,
                "ignoring authoritative record regressing a terminal status"
            );
            self.commit();
            return false;
        }

        let is_new = self.by_id.insert(id.clone(), Arc::new(alert)).is_none();
        if is_new {
            self.order
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(0, id);
        }

        self.commit();
        true
    }

    /// Run a lifecycle transition against the effective record and
    /// store the result as a prediction. Returns whether anything
    /// changed (`false` for an idempotent no-op).
    pub(crate) fn apply_transition(
        &self,
        id: &AlertId,
        transition: &Transition,
    ) -> Result<bool, CoreError> {
        let effective = self.get(id).ok_or_else(|| CoreError::AlertNotFound {
            id: id.to_string(),
        })?;

        match lifecycle::apply(&effective, transition)? {
            Outcome::Updated(next) => {
                self.predictions.insert(id.clone(), Arc::new(*next));
                self.commit();
                Ok(true)
            }
            Outcome::Noop => Ok(false),
        }
    }

    /// Effective record for an id: the prediction if one is pending,
    /// otherwise the authoritative record.
    pub(crate) fn get(&self, id: &AlertId) -> Option<Arc<Alert>> {
        self.predictions
            .get(id)
            .or_else(|| self.by_id.get(id))
            .map(|r| Arc::clone(r.value()))
    }

    /// Current effective snapshot (cheap `Arc` clone), newest first.
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<Alert>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<Alert>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Whether `incoming` would move a terminally stored alert back to
    /// a non-terminal status.
    fn is_terminal_regression(&self, id: &AlertId, incoming: &Alert) -> bool {
        self.by_id
            .get(id)
            .is_some_and(|stored| stored.status.is_terminal() && !incoming.status.is_terminal())
    }

    /// Swap a retired local placeholder for its server-assigned id,
    /// keeping the alert's position in the feed.
    fn retire_placeholder(&self, local: &AlertId, server: &AlertId) {
        self.by_id.remove(local);
        self.predictions.remove(local);

        let mut order = self.order.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(pos) = order.iter().position(|id| id == local) {
            if order.contains(server) {
                order.remove(pos);
            } else {
                order[pos] = server.clone();
            }
        }
    }

    /// Rebuild the effective snapshot in feed order and notify
    /// subscribers.
    fn commit(&self) {
        let order = self.order.read().unwrap_or_else(PoisonError::into_inner);
        let values: Vec<Arc<Alert>> = order
            .iter()
            .filter_map(|id| {
                self.predictions
                    .get(id)
                    .or_else(|| self.by_id.get(id))
                    .map(|r| Arc::clone(r.value()))
            })
            .collect();
        drop(order);

        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
        self.version.send_modify(|v| *v += 1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{AlertKind, AlertStatus, Location, Severity};
    use chrono::{Duration, Utc};

    fn alert(id: AlertId, status: AlertStatus) -> Alert {
        let now = Utc::now();
        Alert {
            id,
            kind: AlertKind::Anomaly,
            severity: Severity::High,
            confidence: Some(0.8),
            timestamp: now,
            location: Location::new(26.1, 91.7),
            source: None,
            subjects: vec![],
            evidence: None,
            status,
            assignee: None,
            description: "Anomaly detected".into(),
            escalate_after: now + Duration::minutes(5),
        }
    }

    #[test]
    fn new_alerts_prepend() {
        let col = AlertCollection::new();
        col.insert_new(alert("a1".into(), AlertStatus::Pending));
        col.insert_new(alert("a2".into(), AlertStatus::Pending));
        col.insert_new(alert("a3".into(), AlertStatus::Pending));

        let snap = col.snapshot();
        let ids: Vec<String> = snap.iter().map(|a| a.id.to_string()).collect();
        assert_eq!(ids, ["a3", "a2", "a1"]);
    }

    #[test]
    fn authoritative_replaces_in_place() {
        let col = AlertCollection::new();
        col.insert_new(alert("a1".into(), AlertStatus::Pending));
        col.insert_new(alert("a2".into(), AlertStatus::Pending));

        let mut update = alert("a1".into(), AlertStatus::Dispatched);
        update.assignee = Some("off_002".into());
        assert!(col.apply_authoritative(update, None, false));

        let snap = col.snapshot();
        assert_eq!(snap.len(), 2);
        // Position is unchanged; only the record is replaced.
        assert_eq!(snap[1].id.to_string(), "a1");
        assert_eq!(snap[1].status, AlertStatus::Dispatched);
    }

    #[test]
    fn transition_result_overlays_the_record() {
        let col = AlertCollection::new();
        col.insert_new(alert("a1".into(), AlertStatus::Pending));

        let changed = col
            .apply_transition(&"a1".into(), &Transition::Review)
            .unwrap();
        assert!(changed);
        assert_eq!(col.get(&"a1".into()).unwrap().status, AlertStatus::Reviewing);
        // The effective snapshot reflects the prediction too.
        assert_eq!(col.snapshot()[0].status, AlertStatus::Reviewing);
    }

    #[test]
    fn authoritative_discards_prediction_wholesale() {
        let col = AlertCollection::new();
        col.insert_new(alert("a1".into(), AlertStatus::Pending));
        col.apply_transition(
            &"a1".into(),
            &Transition::Dispatch {
                assignee: Some("off_001".into()),
            },
        )
        .unwrap();

        // Server disagrees: the alert is merely under review, no
        // assignee. Every predicted field is dropped, nothing merges.
        let update = alert("a1".into(), AlertStatus::Reviewing);
        col.apply_authoritative(update, None, false);

        let effective = col.get(&"a1".into()).unwrap();
        assert_eq!(effective.status, AlertStatus::Reviewing);
        assert_eq!(effective.assignee, None);
    }

    #[test]
    fn terminal_status_never_regresses() {
        let col = AlertCollection::new();
        col.insert_new(alert("a1".into(), AlertStatus::Pending));
        col.apply_authoritative(alert("a1".into(), AlertStatus::Resolved), None, false);

        let applied =
            col.apply_authoritative(alert("a1".into(), AlertStatus::Pending), None, false);
        assert!(!applied);
        assert_eq!(col.get(&"a1".into()).unwrap().status, AlertStatus::Resolved);
    }

    #[test]
    fn reset_flag_permits_regression() {
        let col = AlertCollection::new();
        col.insert_new(alert("a1".into(), AlertStatus::Pending));
        col.apply_authoritative(alert("a1".into(), AlertStatus::Resolved), None, false);

        let applied =
            col.apply_authoritative(alert("a1".into(), AlertStatus::Pending), None, true);
        assert!(applied);
        assert_eq!(col.get(&"a1".into()).unwrap().status, AlertStatus::Pending);
    }

    #[test]
    fn server_record_retires_local_placeholder() {
        let col = AlertCollection::new();
        let local = AlertId::new_local();
        col.insert_new(alert("a1".into(), AlertStatus::Pending));
        col.insert_new(alert(local.clone(), AlertStatus::Pending));

        col.apply_authoritative(
            alert("alert_90".into(), AlertStatus::Pending),
            Some(&local),
            false,
        );

        assert!(col.get(&local).is_none());
        let snap = col.snapshot();
        let ids: Vec<String> = snap.iter().map(|a| a.id.to_string()).collect();
        // The server id takes the placeholder's feed position.
        assert_eq!(ids, ["alert_90", "a1"]);
    }

    #[test]
    fn transition_on_unknown_id_is_not_found() {
        let col = AlertCollection::new();
        let err = col
            .apply_transition(&"ghost".into(), &Transition::Review)
            .unwrap_err();
        assert!(matches!(err, CoreError::AlertNotFound { .. }));
    }

    #[test]
    fn noop_transition_reports_unchanged() {
        let col = AlertCollection::new();
        col.insert_new(alert("a1".into(), AlertStatus::Pending));
        col.apply_transition(&"a1".into(), &Transition::Review)
            .unwrap();

        let changed = col
            .apply_transition(&"a1".into(), &Transition::Review)
            .unwrap();
        assert!(!changed);
    }

    #[tokio::test]
    async fn subscribers_observe_commits_in_order() {
        let col = AlertCollection::new();
        let mut rx = col.subscribe();

        col.insert_new(alert("a1".into(), AlertStatus::Pending));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);

        col.insert_new(alert("a2".into(), AlertStatus::Pending));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 2);
    }
}
