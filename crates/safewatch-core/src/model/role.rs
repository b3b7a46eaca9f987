//! Operator roles.
//!
//! Role checks gate command emission only. The lifecycle state machine
//! itself is role-blind: a transition that is legal for a dispatcher
//! is legal, full stop, and an authoritative server record is applied
//! regardless of any local role.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The signed-in operator's role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Viewer,
    Operator,
    Dispatcher,
    Admin,
}

impl Role {
    /// Whether this role may dispatch responders or mark alerts as
    /// false positives.
    pub fn can_dispatch(self) -> bool {
        matches!(self, Self::Dispatcher | Self::Admin)
    }

    /// Whether this role may acknowledge and resolve alerts.
    pub fn can_review(self) -> bool {
        !matches!(self, Self::Viewer)
    }
}
