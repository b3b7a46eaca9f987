//! Alert status indicator — ●/◐/○/✓/✗ with color mapping.

use ratatui::style::Style;
use ratatui::text::Span;

use safewatch_core::AlertStatus;

use crate::theme;

/// Returns a styled `Span` with the appropriate status dot and label.
pub fn status_span(status: AlertStatus) -> Span<'static> {
    let symbol = status_char(status);
    Span::styled(
        format!("{symbol} {status}"),
        Style::default().fg(theme::status_color(status)),
    )
}

/// Returns the status dot character without styling (for raw output).
pub fn status_char(status: AlertStatus) -> &'static str {
    match status {
        AlertStatus::Pending => "●",
        AlertStatus::Reviewing => "◐",
        AlertStatus::Dispatched => "○",
        AlertStatus::Resolved => "✓",
        AlertStatus::FalsePositive => "✗",
    }
}
