//! Aggregate system status.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Overall backend health as self-reported in `system_status` pushes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SystemHealth {
    #[default]
    Unknown,
    Healthy,
    Degraded,
    Critical,
}

/// Aggregate counters, replaced wholesale on each `system_status`
/// push. A missing counter in a push resets it to zero; the previous
/// snapshot is never merged in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub cameras_online: u32,
    pub cameras_total: u32,
    pub tourists_active: u32,
    pub alerts_pending: u32,
    pub health: SystemHealth,
}
