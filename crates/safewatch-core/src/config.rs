// ── Runtime connection configuration ──
//
// These types describe *how* to connect to a monitoring backend. They
// carry credential data and connection tuning, but never touch disk.
// The TUI constructs an `EngineConfig` (via safewatch-config) and
// hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::model::Role;

/// Configuration for one monitoring session.
///
/// Built by the config crate, passed to `SyncEngine` — core never
/// reads config files.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Backend base URL for the REST surface
    /// (e.g., `https://safewatch.example`).
    pub base_url: Url,

    /// WebSocket event channel URL
    /// (e.g., `wss://safewatch.example/ws/events`).
    pub ws_url: Url,

    /// Bearer credential presented on both surfaces, when required.
    pub bearer: Option<SecretString>,

    /// Signed-in operator identity, used as the dispatch assignee
    /// when none is given explicitly.
    pub operator_id: String,

    /// The operator's role; gates dispatch/false-positive commands.
    pub role: Role,

    /// REST request timeout.
    pub timeout: Duration,

    /// Delay before the first channel reconnection attempt.
    pub reconnect_initial_delay: Duration,

    /// Upper bound on channel reconnection backoff.
    pub reconnect_max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub reconnect_max_retries: Option<u32>,
}

impl EngineConfig {
    /// Derive the WebSocket URL from a REST base URL
    /// (`https://host` → `wss://host/ws/events`).
    pub fn ws_url_for(base: &Url) -> Result<Url, url::ParseError> {
        let mut ws = base.join("ws/events")?;
        let scheme = if base.scheme() == "http" { "ws" } else { "wss" };
        // set_scheme only rejects invalid cross-scheme changes, which
        // cannot happen for http(s) → ws(s).
        let _ = ws.set_scheme(scheme);
        Ok(ws)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ws_url_derivation() {
        let base: Url = "https://safewatch.example/".parse().unwrap();
        let ws = EngineConfig::ws_url_for(&base).unwrap();
        assert_eq!(ws.as_str(), "wss://safewatch.example/ws/events");

        let base: Url = "http://127.0.0.1:8000/".parse().unwrap();
        let ws = EngineConfig::ws_url_for(&base).unwrap();
        assert_eq!(ws.as_str(), "ws://127.0.0.1:8000/ws/events");
    }
}
