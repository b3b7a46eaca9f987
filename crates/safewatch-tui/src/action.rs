//! All possible UI actions. Actions are the sole mechanism for state
//! mutation.

use std::fmt;
use std::sync::Arc;

use safewatch_core::{Alert, AlertId, Command, SystemStatus, TouristPing};

use crate::screen::ScreenId;

/// Notification severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A toast notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Warning,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

/// Pending confirmation for lifecycle decisions that are hard to walk
/// back.
#[derive(Debug, Clone)]
pub enum ConfirmAction {
    /// Dispatch defaults to the signed-in operator as assignee.
    Dispatch { id: AlertId },
    MarkFalsePositive { id: AlertId },
}

impl ConfirmAction {
    /// The command to submit once the operator confirms.
    pub fn into_command(self) -> Command {
        match self {
            Self::Dispatch { id } => Command::Dispatch { id, assignee: None },
            Self::MarkFalsePositive { id } => Command::MarkFalsePositive { id },
        }
    }
}

impl fmt::Display for ConfirmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dispatch { id } => {
                write!(f, "Dispatch a responder to {id}?")
            }
            Self::MarkFalsePositive { id } => {
                write!(f, "Mark {id} as a false positive? It cannot be reopened.")
            }
        }
    }
}

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ────────────────────────────────────────────────
    SwitchScreen(ScreenId),
    GoBack,

    // ── Data Events (from safewatch-core streams) ─────────────────
    AlertsUpdated(Arc<Vec<Arc<Alert>>>),
    TouristsUpdated(Arc<Vec<TouristPing>>),
    StatusUpdated(SystemStatus),

    // ── Connection Status ─────────────────────────────────────────
    Connecting,
    Connected,
    Disconnected(String),
    Reconnecting { attempt: u32 },

    // ── Incident Detail ───────────────────────────────────────────
    OpenIncident(AlertId),

    // ── Commands (forwarded to the sync engine) ───────────────────
    Submit(Command),

    // ── Confirm Dialog ────────────────────────────────────────────
    ShowConfirm(ConfirmAction),
    ConfirmYes,
    ConfirmNo,

    // ── Help ──────────────────────────────────────────────────────
    ToggleHelp,

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notification),
    DismissNotification,
}
