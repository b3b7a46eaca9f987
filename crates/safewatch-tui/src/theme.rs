//! Control-room palette and semantic styling for the TUI.

use ratatui::style::{Color, Modifier, Style};

use safewatch_core::{AlertStatus, Severity, SystemHealth};

// ── Core Palette ──────────────────────────────────────────────────────

pub const SIGNAL_CYAN: Color = Color::Rgb(102, 217, 239); // #66d9ef
pub const AMBER: Color = Color::Rgb(253, 185, 73); // #fdb949
pub const ALERT_RED: Color = Color::Rgb(255, 85, 85); // #ff5555
pub const CRITICAL_MAGENTA: Color = Color::Rgb(255, 99, 163); // #ff63a3
pub const CALM_GREEN: Color = Color::Rgb(120, 220, 132); // #78dc84
pub const STEEL_BLUE: Color = Color::Rgb(130, 170, 255); // #82aaff

// ── Extended Palette ──────────────────────────────────────────────────

pub const DIM_WHITE: Color = Color::Rgb(196, 200, 212); // #c4c8d4
pub const BORDER_GRAY: Color = Color::Rgb(92, 99, 112); // #5c6370
pub const BG_HIGHLIGHT: Color = Color::Rgb(44, 49, 60); // #2c313c
pub const BG_DARK: Color = Color::Rgb(26, 29, 36); // #1a1d24

// ── Semantic Styles ───────────────────────────────────────────────────

/// Title text for blocks/panels.
pub fn title_style() -> Style {
    Style::default()
        .fg(SIGNAL_CYAN)
        .add_modifier(Modifier::BOLD)
}

/// Border for a focused panel.
pub fn border_focused() -> Style {
    Style::default().fg(SIGNAL_CYAN)
}

/// Border for an unfocused panel.
pub fn border_default() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Table header row.
pub fn table_header() -> Style {
    Style::default()
        .fg(SIGNAL_CYAN)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

/// Normal table row text.
pub fn table_row() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// Selected / highlighted table row.
pub fn table_selected() -> Style {
    Style::default()
        .fg(SIGNAL_CYAN)
        .bg(BG_HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

/// Active tab in the tab bar.
pub fn tab_active() -> Style {
    Style::default()
        .fg(SIGNAL_CYAN)
        .add_modifier(Modifier::BOLD)
}

/// Inactive tab in the tab bar.
pub fn tab_inactive() -> Style {
    Style::default().fg(DIM_WHITE)
}

/// Key hint text (e.g., "q quit  ? help").
pub fn key_hint() -> Style {
    Style::default().fg(BORDER_GRAY)
}

/// Key hint key character.
pub fn key_hint_key() -> Style {
    Style::default()
        .fg(SIGNAL_CYAN)
        .add_modifier(Modifier::BOLD)
}

// ── Domain Colors ─────────────────────────────────────────────────────

/// Color for an alert severity.
pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Low => STEEL_BLUE,
        Severity::Medium => AMBER,
        Severity::High => ALERT_RED,
        Severity::Critical => CRITICAL_MAGENTA,
    }
}

/// Color for an alert lifecycle status.
pub fn status_color(status: AlertStatus) -> Color {
    match status {
        AlertStatus::Pending => AMBER,
        AlertStatus::Reviewing => SIGNAL_CYAN,
        AlertStatus::Dispatched => STEEL_BLUE,
        AlertStatus::Resolved => CALM_GREEN,
        AlertStatus::FalsePositive => BORDER_GRAY,
    }
}

/// Color for the backend's self-reported health.
pub fn health_color(health: SystemHealth) -> Color {
    match health {
        SystemHealth::Healthy => CALM_GREEN,
        SystemHealth::Degraded => AMBER,
        SystemHealth::Critical => ALERT_RED,
        SystemHealth::Unknown => BORDER_GRAY,
    }
}
