// ── Sync engine ──
//
// Full lifecycle management for one monitoring session: baseline
// fetch, event channel pumping, command routing, and reactive data
// streaming through the AlertStore.

use std::sync::Arc;

use secrecy::ExposeSecret;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use safewatch_wire::channel::{ChannelHandle, ChannelState, ReconnectConfig};
use safewatch_wire::commands::{AlertDraft, CommandFrame};
use safewatch_wire::events::WireLocation;
use safewatch_wire::RestClient;

use crate::command::{Command, CommandEnvelope};
use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::lifecycle::Transition;
use crate::model::{Alert, AlertId, AlertStatus, SystemStatus, TouristPing};
use crate::normalize::{self, Normalized, ESCALATION_WINDOW};
use crate::store::AlertStore;
use crate::stream::AlertStream;

const COMMAND_CHANNEL_SIZE: usize = 64;

// ── ConnectionState ──────────────────────────────────────────────────

/// Connection state observable by consumers.
///
/// Connection loss is not an error: the store keeps its last-known
/// contents (stale but present) while the channel reconnects.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting {
        attempt: u32,
    },
}

impl From<&ChannelState> for ConnectionState {
    fn from(state: &ChannelState) -> Self {
        match state {
            ChannelState::Connecting => Self::Connecting,
            ChannelState::Connected => Self::Connected,
            ChannelState::Disconnected { attempt: 0 } => Self::Disconnected,
            ChannelState::Disconnected { attempt } => Self::Reconnecting { attempt: *attempt },
        }
    }
}

// ── SyncEngine ───────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc`. Manages the session lifecycle:
/// baseline REST fetch, the duplex event channel, command routing,
/// and reactive alert streaming.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    config: EngineConfig,
    store: Arc<AlertStore>,
    connection_state: watch::Sender<ConnectionState>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    channel: Mutex<Option<ChannelHandle>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl SyncEngine {
    /// Create a new engine from configuration. Does NOT connect —
    /// call [`connect()`](Self::connect) to fetch the baseline and
    /// start background tasks.
    pub fn new(config: EngineConfig) -> Self {
        let store = Arc::new(AlertStore::new());
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let cancel = CancellationToken::new();

        Self {
            inner: Arc::new(EngineInner {
                config,
                store,
                connection_state,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                channel: Mutex::new(None),
                cancel,
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Access the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Access the underlying AlertStore.
    pub fn store(&self) -> &Arc<AlertStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Connect to the backend.
    ///
    /// Fetches the baseline snapshot over REST, opens the event
    /// channel, and spawns background tasks (inbound pump, command
    /// processor, state mirror). After this returns, everything
    /// arrives as channel pushes.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Connecting);

        let config = &self.inner.config;

        // Baseline snapshot. The channel pushes deltas from here on;
        // nothing is replayed on reconnect. A failed fetch leaves the
        // engine disconnected, not stuck in `Connecting`.
        if let Err(e) = self.fetch_baseline().await {
            let _ = self
                .inner
                .connection_state
                .send(ConnectionState::Disconnected);
            return Err(e);
        }

        // Open the duplex event channel.
        let channel = ChannelHandle::connect(
            config.ws_url.clone(),
            ReconnectConfig {
                initial_delay: config.reconnect_initial_delay,
                max_delay: config.reconnect_max_delay,
                max_retries: config.reconnect_max_retries,
            },
            self.inner.cancel.child_token(),
            config
                .bearer
                .as_ref()
                .map(|b| b.expose_secret().to_owned()),
        );

        let mut handles = self.inner.task_handles.lock().await;

        let engine = self.clone();
        let events = channel.subscribe();
        handles.push(tokio::spawn(inbound_pump_task(engine, events)));

        let engine = self.clone();
        let state_rx = channel.state();
        handles.push(tokio::spawn(state_mirror_task(engine, state_rx)));

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let engine = self.clone();
            handles.push(tokio::spawn(command_processor_task(engine, rx)));
        }

        drop(handles);
        *self.inner.channel.lock().await = Some(channel);

        info!("sync engine started");
        Ok(())
    }

    /// Fetch the REST baseline (dashboard stats + tourist roster) and
    /// seed the store with it.
    async fn fetch_baseline(&self) -> Result<(), CoreError> {
        let config = &self.inner.config;

        let rest = RestClient::new(
            config.base_url.clone(),
            config.bearer.clone(),
            config.timeout,
        )?;

        let (stats, tourists) = tokio::try_join!(rest.fetch_dashboard_stats(), rest.fetch_tourists())?;

        self.inner.store.apply(Normalized::StatusSnapshot(SystemStatus {
            tourists_active: stats.active_tourists,
            alerts_pending: stats.active_alerts,
            ..SystemStatus::default()
        }));
        self.inner.store.apply(Normalized::TouristBatch(
            tourists
                .into_iter()
                .map(|t| TouristPing {
                    tourist_id: t.tourist_id,
                    location: crate::model::Location::default(),
                    timestamp: None,
                    battery_level: None,
                    heart_rate: None,
                    status: t.status,
                })
                .collect(),
        ));
        debug!(
            tourists = self.inner.store.tourists_snapshot().len(),
            "baseline snapshot applied"
        );
        Ok(())
    }

    /// Disconnect from the backend.
    ///
    /// Cancels background tasks, joins them, and resets the
    /// connection state. Store contents are kept.
    pub async fn disconnect(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        *self.inner.channel.lock().await = None;
        let _ = self
            .inner
            .connection_state
            .send(ConnectionState::Disconnected);
        debug!("sync engine stopped");
    }

    // ── Command execution ────────────────────────────────────────────

    /// Execute a command.
    ///
    /// Role gating happens first, synchronously; then the connected
    /// check (commands are never queued across a disconnect); then the
    /// command processor validates the transition, emits the frame,
    /// and applies the optimistic local prediction.
    pub async fn execute(&self, cmd: Command) -> Result<(), CoreError> {
        cmd.authorize(self.inner.config.role)?;

        if *self.inner.connection_state.borrow() != ConnectionState::Connected {
            return Err(CoreError::ChannelUnavailable);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();

        self.inner
            .command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::ChannelUnavailable)?;

        rx.await.map_err(|_| CoreError::ChannelUnavailable)?
    }

    // ── State observation ────────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Subscribe to the alert feed.
    pub fn alerts(&self) -> AlertStream {
        self.inner.store.subscribe_alerts()
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Pump inbound wire events through the normalizer into the store.
async fn inbound_pump_task(
    engine: SyncEngine,
    mut events: tokio::sync::broadcast::Receiver<Arc<safewatch_wire::WireEvent>>,
) {
    use tokio::sync::broadcast::error::RecvError;

    let cancel = engine.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if let Some(normalized) = normalize::normalize((*event).clone()) {
                            engine.inner.store.apply(normalized);
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        // The server's next full pushes repair the gap.
                        warn!(missed, "inbound pump lagged, events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
}

/// Mirror channel state into the engine's `ConnectionState`.
async fn state_mirror_task(engine: SyncEngine, mut state_rx: watch::Receiver<ChannelState>) {
    let cancel = engine.inner.cancel.clone();

    loop {
        let state = ConnectionState::from(&*state_rx.borrow_and_update());
        let _ = engine.inner.connection_state.send(state);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
}

/// Process commands from the mpsc channel, routing each to the wire
/// frame plus the optimistic store mutation.
async fn command_processor_task(engine: SyncEngine, mut rx: mpsc::Receiver<CommandEnvelope>) {
    let cancel = engine.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&engine, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────────

/// Validate, emit, and optimistically apply one command.
async fn route_command(engine: &SyncEngine, cmd: Command) -> Result<(), CoreError> {
    let channel_guard = engine.inner.channel.lock().await;
    let channel = channel_guard
        .as_ref()
        .ok_or(CoreError::ChannelUnavailable)?;
    if !channel.is_connected() {
        return Err(CoreError::ChannelUnavailable);
    }

    let store = &engine.inner.store;
    let operator = &engine.inner.config.operator_id;

    if let Some((id, transition)) = cmd.transition(operator) {
        // Validate against the effective record before anything goes
        // on the wire; an illegal transition never leaves the client.
        let changed = store.apply_transition(&id, &transition)?;
        if changed {
            channel.send(status_frame(&id, &transition))?;
        }
        return Ok(());
    }

    match cmd {
        Command::RaiseAlert(request) => {
            let now = chrono::Utc::now();
            let alert = Alert {
                id: AlertId::new_local(),
                kind: request.kind,
                severity: request.severity,
                // Human-authored alerts carry no machine confidence.
                confidence: None,
                timestamp: now,
                location: request.location.clone().unwrap_or_default(),
                source: None,
                subjects: request.tourist_id.iter().cloned().collect(),
                evidence: None,
                status: AlertStatus::Pending,
                assignee: None,
                description: request.description.clone(),
                escalate_after: now + ESCALATION_WINDOW,
            };

            let draft = AlertDraft {
                local_id: alert.id.to_string(),
                kind: request.kind.to_string(),
                severity: request.severity.to_string(),
                location: request.location.map(|l| WireLocation {
                    lat: l.lat,
                    lng: l.lng,
                    label: l.label,
                }),
                tourist_id: request.tourist_id,
                description: request.description,
            };

            // The placeholder shows up in the feed immediately; the
            // server's echoed record retires it.
            store.apply(Normalized::NewAlert(Box::new(alert)));
            channel.send(CommandFrame::SendAlert(draft))?;
            Ok(())
        }

        Command::SubscribeCamera { camera_id } => {
            channel.send(CommandFrame::SubscribeCamera { camera_id })?;
            Ok(())
        }

        Command::UnsubscribeCamera { camera_id } => {
            channel.send(CommandFrame::UnsubscribeCamera { camera_id })?;
            Ok(())
        }

        // Lifecycle commands were handled through `transition` above.
        Command::Review { .. }
        | Command::Dispatch { .. }
        | Command::MarkFalsePositive { .. }
        | Command::Resolve { .. } => Ok(()),
    }
}

/// Build the `update_alert_status` frame for a validated transition.
fn status_frame(id: &AlertId, transition: &Transition) -> CommandFrame {
    let (status, assignee) = match transition {
        Transition::Review => (AlertStatus::Reviewing, None),
        Transition::Dispatch { assignee } => (AlertStatus::Dispatched, assignee.clone()),
        Transition::Resolve => (AlertStatus::Resolved, None),
        Transition::MarkFalsePositive => (AlertStatus::FalsePositive, None),
    };

    CommandFrame::UpdateAlertStatus {
        id: id.to_string(),
        status: status.to_string(),
        assignee,
    }
}
