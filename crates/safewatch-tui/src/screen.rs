//! Screen trait and screen identifier enum.

use std::fmt;

/// Identifies each primary TUI screen, navigable by number keys 1-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    #[default]
    Alerts, // 1
    Assignments, // 2
    Overview,    // 3
    /// Incident detail — opened from the alert feed, not in the tab
    /// bar and not navigable by number keys.
    Incident,
}

impl ScreenId {
    /// All screens in tab-bar order.
    pub const ALL: [ScreenId; 3] = [Self::Alerts, Self::Assignments, Self::Overview];

    /// Numeric key (1-3) for this screen. Incident has no number key.
    pub fn number(self) -> u8 {
        match self {
            Self::Alerts => 1,
            Self::Assignments => 2,
            Self::Overview => 3,
            Self::Incident => 0,
        }
    }

    /// Screen from a numeric key (1-3). Returns None for out-of-range.
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Alerts),
            2 => Some(Self::Assignments),
            3 => Some(Self::Overview),
            _ => None,
        }
    }

    /// Next screen in tab order (wraps around).
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous screen in tab order (wraps around).
    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Short label for the tab bar.
    pub fn label(self) -> &'static str {
        match self {
            Self::Alerts => "Alerts",
            Self::Assignments => "Assignments",
            Self::Overview => "Overview",
            Self::Incident => "Incident",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_order_wraps_both_ways() {
        assert_eq!(ScreenId::Overview.next(), ScreenId::Alerts);
        assert_eq!(ScreenId::Alerts.prev(), ScreenId::Overview);
    }

    #[test]
    fn incident_is_not_reachable_by_number() {
        for n in 1..=3 {
            assert_ne!(ScreenId::from_number(n), Some(ScreenId::Incident));
        }
        assert_eq!(ScreenId::from_number(4), None);
    }
}
