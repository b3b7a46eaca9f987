//! Duplex event channel with auto-reconnect.
//!
//! Connects to the monitoring backend's WebSocket endpoint, streams
//! parsed [`WireEvent`]s through a [`tokio::sync::broadcast`] channel,
//! and writes outbound [`CommandFrame`]s while connected. Reconnection
//! uses exponential backoff + jitter; channel state is observable
//! through a `watch` channel.
//!
//! # Example
//!
//! ```rust,ignore
//! use safewatch_wire::channel::{ChannelHandle, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let cancel = CancellationToken::new();
//! let ws_url = Url::parse("wss://safewatch.example/ws/events")?;
//!
//! let handle = ChannelHandle::connect(ws_url, ReconnectConfig::default(), cancel.clone(), None);
//! let mut rx = handle.subscribe();
//!
//! while let Ok(event) = rx.recv().await {
//!     println!("{event:?}");
//! }
//!
//! handle.shutdown();
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::commands::CommandFrame;
use crate::error::Error;
use crate::events::{self, WireEvent};

// ── Channel capacities ──────────────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 1024;
const OUTBOUND_CHANNEL_CAPACITY: usize = 64;

// ── ChannelState ────────────────────────────────────────────────────

/// Observable connection state of the channel.
///
/// `attempt` counts consecutive failed reconnects and resets to zero
/// on a successful connection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Connecting,
    Connected,
    Disconnected {
        attempt: u32,
    },
}

impl ChannelState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

// ── ReconnectConfig ─────────────────────────────────────────────────

/// Exponential backoff configuration for channel reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── ChannelHandle ───────────────────────────────────────────────────

/// Handle to a running duplex event channel.
///
/// Drop all receivers and call [`shutdown`](Self::shutdown) to tear
/// down the background task; no timers or listeners outlive it.
pub struct ChannelHandle {
    event_rx: broadcast::Receiver<Arc<WireEvent>>,
    outbound_tx: mpsc::Sender<CommandFrame>,
    state_rx: watch::Receiver<ChannelState>,
    cancel: CancellationToken,
}

impl ChannelHandle {
    /// Spawn the connection loop and return immediately.
    ///
    /// The first connection attempt happens asynchronously — observe
    /// [`state`](Self::state) or subscribe to events to see progress.
    pub fn connect(
        ws_url: Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
        bearer: Option<String>,
    ) -> Self {
        let (event_tx, event_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ChannelState::Connecting);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            channel_loop(
                ws_url,
                event_tx,
                outbound_rx,
                state_tx,
                reconnect,
                task_cancel,
                bearer,
            )
            .await;
        });

        Self {
            event_rx,
            outbound_tx,
            state_rx,
            cancel,
        }
    }

    /// Get a new broadcast receiver for the inbound event stream.
    ///
    /// Multiple consumers can subscribe concurrently. A consumer that
    /// falls behind receives [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<WireEvent>> {
        self.event_rx.resubscribe()
    }

    /// Observe channel state changes.
    pub fn state(&self) -> watch::Receiver<ChannelState> {
        self.state_rx.clone()
    }

    /// Whether the channel is currently connected.
    pub fn is_connected(&self) -> bool {
        self.state_rx.borrow().is_connected()
    }

    /// Queue an outbound command frame.
    ///
    /// Fails fast with [`Error::ChannelUnavailable`] while the channel
    /// is not connected — commands are never held across a disconnect.
    pub fn send(&self, frame: CommandFrame) -> Result<(), Error> {
        if !self.is_connected() {
            return Err(Error::ChannelUnavailable);
        }
        self.outbound_tx
            .try_send(frame)
            .map_err(|_| Error::CommandBufferFull)
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background connection loop ──────────────────────────────────────

/// Main loop: connect → pump → on error, backoff → reconnect.
#[allow(clippy::too_many_lines)]
async fn channel_loop(
    ws_url: Url,
    event_tx: broadcast::Sender<Arc<WireEvent>>,
    mut outbound_rx: mpsc::Receiver<CommandFrame>,
    state_tx: watch::Sender<ChannelState>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
    bearer: Option<String>,
) {
    let mut attempt: u32 = 0;

    loop {
        let _ = state_tx.send(ChannelState::Connecting);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = run_connection(
                &ws_url,
                &event_tx,
                &mut outbound_rx,
                &state_tx,
                &cancel,
                bearer.as_deref(),
            ) => {
                match result {
                    // Clean disconnect (server close frame or stream
                    // ended). Reset the counter and reconnect now.
                    Ok(()) => {
                        tracing::info!("channel disconnected cleanly, reconnecting");
                        attempt = 0;
                        let _ = state_tx.send(ChannelState::Disconnected { attempt });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "channel error");
                        let _ = state_tx.send(ChannelState::Disconnected { attempt });

                        if let Some(max) = reconnect.max_retries {
                            if attempt >= max {
                                tracing::error!(
                                    max_retries = max,
                                    "channel reconnection limit reached, giving up"
                                );
                                break;
                            }
                        }

                        let delay = calculate_backoff(attempt, &reconnect);
                        tracing::info!(
                            delay_ms = delay.as_millis() as u64,
                            attempt,
                            "waiting before reconnect"
                        );

                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(delay) => {}
                        }

                        attempt += 1;
                    }
                }
            }
        }
    }

    let _ = state_tx.send(ChannelState::Disconnected { attempt });
    tracing::debug!("channel loop exiting");
}

// ── Single connection lifecycle ─────────────────────────────────────

/// Establish one WebSocket connection and pump it in both directions
/// until it drops.
///
/// If `bearer` is provided it is injected as an `Authorization`
/// header on the upgrade request.
async fn run_connection(
    url: &Url,
    event_tx: &broadcast::Sender<Arc<WireEvent>>,
    outbound_rx: &mut mpsc::Receiver<CommandFrame>,
    state_tx: &watch::Sender<ChannelState>,
    cancel: &CancellationToken,
    bearer: Option<&str>,
) -> Result<(), Error> {
    // Frames accepted against a previous connection are stale by now;
    // the operator re-issues against the fresh server snapshot.
    discard_stale_commands(outbound_rx);

    tracing::info!(url = %url, "connecting to event channel");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::ChannelConnect(e.to_string()))?;

    let mut request = ClientRequestBuilder::new(uri);
    if let Some(token) = bearer {
        request = request.with_header("Authorization", format!("Bearer {token}"));
    }

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| Error::ChannelConnect(e.to_string()))?;

    tracing::info!("event channel connected");
    let _ = state_tx.send(ChannelState::Connected);

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        if let Some(event) = events::parse_frame(&text) {
                            // Send errors just mean no active subscribers.
                            let _ = event_tx.send(Arc::new(event));
                        }
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite replies with pong automatically
                        tracing::trace!("channel ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "channel close frame received"
                            );
                        } else {
                            tracing::info!("channel close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(Error::ChannelConnect(e.to_string()));
                    }
                    None => {
                        tracing::info!("channel stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame — ignore
                    }
                }
            }
            command = outbound_rx.recv() => {
                let Some(command) = command else { return Ok(()) };
                let text = command.to_frame();
                tracing::debug!(frame = %text, "sending command frame");
                write
                    .send(tungstenite::Message::text(text))
                    .await
                    .map_err(|e| Error::ChannelConnect(e.to_string()))?;
            }
        }
    }
}

/// Drop any command frames left over from a dropped connection.
///
/// `send` fails fast while disconnected, so the only way frames sit in
/// the outbound queue is a connection dying with commands still
/// buffered. Writing them to the next connection would act on a
/// snapshot that no longer exists.
fn discard_stale_commands(outbound_rx: &mut mpsc::Receiver<CommandFrame>) {
    while let Ok(frame) = outbound_rx.try_recv() {
        tracing::warn!(
            frame = %frame.to_frame(),
            "discarding command frame from a dropped connection"
        );
    }
}

// ── Backoff calculation ─────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms when many
/// dashboard sessions drop at once.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(attempt as i32);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    // Not cryptographically random, but good enough for backoff spread.
    let jitter_factor = 1.0 + 0.25 * ((attempt as f64 * 7.3).sin());
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ───────────────────────────────────────────────────────────
