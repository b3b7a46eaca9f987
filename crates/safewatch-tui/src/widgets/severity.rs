//! Severity badge — fixed-width colored label for table columns.

use ratatui::style::{Modifier, Style};
use ratatui::text::Span;

use safewatch_core::Severity;

use crate::theme;

/// Returns a styled fixed-width severity label (e.g., "CRIT", "HIGH").
pub fn severity_span(severity: Severity) -> Span<'static> {
    let style = Style::default().fg(theme::severity_color(severity));
    let style = match severity {
        Severity::High | Severity::Critical => style.add_modifier(Modifier::BOLD),
        Severity::Low | Severity::Medium => style,
    };
    Span::styled(severity_label(severity), style)
}

/// Four-character label for column alignment.
pub fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "LOW ",
        Severity::Medium => "MED ",
        Severity::High => "HIGH",
        Severity::Critical => "CRIT",
    }
}
