//! Tourist presence records.
//!
//! Location batches arrive as full snapshots and replace the previous
//! collection wholesale; there is no per-tourist merge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::alert::Location;

/// One tourist's last known position and device telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouristPing {
    pub tourist_id: String,
    pub location: Location,
    pub timestamp: Option<DateTime<Utc>>,

    /// Wearable battery percentage, when the device reports it.
    pub battery_level: Option<u8>,

    /// Beats per minute from the wearable's health sensor.
    pub heart_rate: Option<u16>,

    pub status: Option<String>,
}

impl TouristPing {
    /// Battery below 20% warrants a UI warning.
    pub fn battery_low(&self) -> bool {
        self.battery_level.is_some_and(|pct| pct < 20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ping(battery: Option<u8>) -> TouristPing {
        TouristPing {
            tourist_id: "t_001".into(),
            location: Location::new(26.1, 91.7),
            timestamp: None,
            battery_level: battery,
            heart_rate: None,
            status: None,
        }
    }

    #[test]
    fn low_battery_threshold() {
        assert!(ping(Some(19)).battery_low());
        assert!(!ping(Some(20)).battery_low());
        assert!(!ping(None).battery_low());
    }
}
