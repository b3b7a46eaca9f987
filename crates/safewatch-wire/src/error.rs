use thiserror::Error;

/// Top-level error type for the `safewatch-wire` crate.
///
/// Covers the event channel, the REST surface, and frame parsing.
/// `safewatch-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Event channel ───────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("channel connection failed: {0}")]
    ChannelConnect(String),

    /// WebSocket closed unexpectedly.
    #[error("channel closed (code {code}): {reason}")]
    ChannelClosed { code: u16, reason: String },

    /// Outgoing command attempted while the channel is not connected.
    /// Commands are never queued across a disconnect — callers retry
    /// once the channel reports `Connected` again.
    #[error("channel unavailable -- not connected")]
    ChannelUnavailable,

    /// The outbound command buffer is full (backpressure).
    #[error("outbound command buffer full")]
    CommandBufferFull,

    // ── REST ────────────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Structured error from the backend API.
    #[error("backend API error (HTTP {status}): {message}")]
    Api { message: String, status: u16 },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::ChannelConnect(_) | Self::ChannelUnavailable => true,
            _ => false,
        }
    }
}
