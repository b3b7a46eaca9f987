//! Canonical domain model.
//!
//! Everything downstream of the normalizer speaks these types; raw
//! wire payloads never escape `safewatch-wire`.

mod alert;
mod alert_id;
mod role;
mod system;
mod tourist;

pub use alert::{Alert, AlertKind, AlertStatus, Evidence, Location, Severity};
pub use alert_id::AlertId;
pub use role::Role;
pub use system::{SystemHealth, SystemStatus};
pub use tourist::TouristPing;
