//! Data bridge — connects [`SyncEngine`] streams to TUI actions.
//!
//! Runs as a background task: subscribes to the alert feed, tourist
//! batches, system status, and connection state from the engine,
//! forwarding every change as an [`Action`] through the TUI's action
//! channel.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use safewatch_core::{ConnectionState, SyncEngine};

use crate::action::Action;

/// Spawn the data bridge connecting [`SyncEngine`] reactive streams to
/// the TUI.
///
/// Connects to the backend, sends initial data snapshots, then loops
/// forwarding every store change and connection-state transition as an
/// [`Action`]. Shuts down cleanly on cancellation.
pub async fn spawn_data_bridge(
    engine: SyncEngine,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let _ = action_tx.send(Action::Connecting);

    if let Err(e) = engine.connect().await {
        warn!(error = %e, "failed to connect to the backend");
        let _ = action_tx.send(Action::Disconnected(format!("{e}")));
        return;
    }

    // Subscribe to store streams
    let mut alerts = engine.alerts();
    let mut tourists = engine.store().subscribe_tourists();
    let mut status = engine.store().subscribe_status();
    let mut conn_state = engine.connection_state();

    // Push initial snapshots so screens have data immediately
    let _ = action_tx.send(Action::AlertsUpdated(alerts.current().clone()));
    let initial_tourists = tourists.borrow_and_update().clone();
    if !initial_tourists.is_empty() {
        let _ = action_tx.send(Action::TouristsUpdated(initial_tourists));
    }
    let _ = action_tx.send(Action::StatusUpdated(*status.borrow_and_update()));

    // Stream loop — forward every change until cancelled
    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Some(snapshot) = alerts.changed() => {
                tracing::debug!(alerts = snapshot.len(), "dispatching AlertsUpdated");
                let _ = action_tx.send(Action::AlertsUpdated(snapshot));
            }
            Ok(()) = tourists.changed() => {
                let batch = tourists.borrow_and_update().clone();
                let _ = action_tx.send(Action::TouristsUpdated(batch));
            }
            Ok(()) = status.changed() => {
                let snapshot = *status.borrow_and_update();
                let _ = action_tx.send(Action::StatusUpdated(snapshot));
            }
            Ok(()) = conn_state.changed() => {
                let state = conn_state.borrow_and_update().clone();
                match state {
                    ConnectionState::Connected => {
                        let _ = action_tx.send(Action::Connected);
                    }
                    ConnectionState::Disconnected => {
                        let _ = action_tx.send(Action::Disconnected("channel closed".into()));
                    }
                    ConnectionState::Reconnecting { attempt } => {
                        let _ = action_tx.send(Action::Reconnecting { attempt });
                    }
                    ConnectionState::Connecting => {}
                }
            }
        }
    }

    engine.disconnect().await;
    debug!("data bridge shut down");
}
