// ── Core identity type ──
//
// AlertId is the foundation of every alert record. It unifies
// server-assigned string ids with locally generated placeholder UUIDs
// behind a single ergonomic interface.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Canonical identifier for an alert.
///
/// Server-assigned ids are opaque strings and stable for the alert's
/// lifetime. A `Local` id exists only as a placeholder for a
/// human-originated alert until the server echoes the record back
/// under its own id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlertId {
    Server(String),
    Local(Uuid),
}

impl AlertId {
    /// Generate a fresh local placeholder id.
    pub fn new_local() -> Self {
        Self::Local(Uuid::new_v4())
    }

    /// Whether this id is a local placeholder awaiting a server id.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }

    pub fn as_server(&self) -> Option<&str> {
        match self {
            Self::Server(s) => Some(s),
            Self::Local(_) => None,
        }
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server(s) => write!(f, "{s}"),
            Self::Local(u) => write!(f, "local-{u}"),
        }
    }
}

impl FromStr for AlertId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_owned()))
    }
}

impl From<String> for AlertId {
    fn from(s: String) -> Self {
        Self::Server(s)
    }
}

impl From<&str> for AlertId {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn server_id_from_string() {
        let id = AlertId::from("alert_20260210_1200_t_042");
        assert_eq!(id.as_server(), Some("alert_20260210_1200_t_042"));
        assert!(!id.is_local());
    }

    #[test]
    fn local_ids_are_unique() {
        assert_ne!(AlertId::new_local(), AlertId::new_local());
    }

    #[test]
    fn local_id_display_is_prefixed() {
        let id = AlertId::new_local();
        assert!(id.to_string().starts_with("local-"));
    }

    #[test]
    fn from_str_is_server() {
        let id: AlertId = "alert_1".parse().unwrap();
        assert!(id.as_server().is_some());
    }
}
