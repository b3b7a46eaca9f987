//! Assignments screen — dispatched alerts grouped by responder.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use tokio::sync::mpsc::UnboundedSender;

use safewatch_core::{Alert, AlertStatus, Command};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::{severity, time_fmt};

pub struct AssignmentsScreen {
    focused: bool,
    alerts: Arc<Vec<Arc<Alert>>>,
    /// Selection index into the flattened dispatched list.
    selected: usize,
}

impl AssignmentsScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            alerts: Arc::new(Vec::new()),
            selected: 0,
        }
    }

    /// Dispatched alerts grouped by assignee, alphabetically. Alerts
    /// dispatched without a recorded assignee land under "(unassigned)".
    fn grouped(&self) -> BTreeMap<String, Vec<Arc<Alert>>> {
        let mut groups: BTreeMap<String, Vec<Arc<Alert>>> = BTreeMap::new();
        for alert in self.alerts.iter() {
            if alert.status == AlertStatus::Dispatched {
                let key = alert
                    .assignee
                    .clone()
                    .unwrap_or_else(|| "(unassigned)".to_owned());
                groups.entry(key).or_default().push(Arc::clone(alert));
            }
        }
        groups
    }

    /// The dispatched alerts in display order (group by group).
    fn flattened(&self) -> Vec<Arc<Alert>> {
        self.grouped().into_values().flatten().collect()
    }

    fn selected_alert(&self) -> Option<Arc<Alert>> {
        self.flattened().get(self.selected).map(Arc::clone)
    }

    fn clamp_selection(&mut self) {
        let len = self.flattened().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}

impl Component for AssignmentsScreen {
    fn init(&mut self, _action_tx: UnboundedSender<Action>) -> Result<()> {
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                let len = self.flattened().len();
                if len > 0 {
                    self.selected = (self.selected + 1).min(len - 1);
                }
                Ok(None)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                Ok(None)
            }
            KeyCode::Enter => Ok(self
                .selected_alert()
                .map(|a| Action::OpenIncident(a.id.clone()))),
            KeyCode::Char('x') => Ok(self
                .selected_alert()
                .map(|a| Action::Submit(Command::Resolve { id: a.id.clone() }))),
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::AlertsUpdated(alerts) = action {
            self.alerts = Arc::clone(alerts);
            self.clamp_selection();
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let groups = self.grouped();
        let total: usize = groups.values().map(Vec::len).sum();
        let now = Utc::now();

        let block = Block::default()
            .title(format!(" Assignments ({total}) "))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let layout = Layout::vertical([
            Constraint::Min(1),    // groups
            Constraint::Length(1), // hints
        ])
        .split(inner);

        let mut lines: Vec<Line> = Vec::new();
        let mut flat_idx = 0usize;

        for (assignee, alerts) in &groups {
            lines.push(Line::from(Span::styled(
                format!("  {assignee} ({})", alerts.len()),
                Style::default().fg(theme::SIGNAL_CYAN),
            )));

            for alert in alerts {
                let row_style = if flat_idx == self.selected && self.focused {
                    theme::table_selected()
                } else {
                    theme::table_row()
                };
                let age = time_fmt::fmt_ago(alert.timestamp, now);
                lines.push(Line::from(vec![
                    Span::styled("    ", row_style),
                    severity::severity_span(alert.severity),
                    Span::styled(
                        format!(" {:<10} {:<6} {}", alert.kind.to_string(), age, alert.id),
                        row_style,
                    ),
                ]));
                flat_idx += 1;
            }
        }

        if total == 0 {
            lines.push(Line::from(Span::styled(
                "  No dispatched alerts.",
                Style::default().fg(theme::BORDER_GRAY),
            )));
        }

        frame.render_widget(Paragraph::new(lines), layout[0]);

        let hints = Line::from(vec![
            Span::styled("  j/k ", theme::key_hint_key()),
            Span::styled("move  ", theme::key_hint()),
            Span::styled("Enter ", theme::key_hint_key()),
            Span::styled("detail  ", theme::key_hint()),
            Span::styled("x ", theme::key_hint_key()),
            Span::styled("resolve", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), layout[1]);
    }

    fn focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "Assignments"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safewatch_core::{AlertId, AlertKind, Location, Severity};

    fn dispatched(id: &str, assignee: Option<&str>) -> Arc<Alert> {
        Arc::new(Alert {
            id: AlertId::from(id),
            kind: AlertKind::Anomaly,
            severity: Severity::Medium,
            confidence: None,
            timestamp: Utc::now(),
            location: Location::new(0.0, 0.0),
            source: None,
            subjects: Vec::new(),
            evidence: None,
            status: AlertStatus::Dispatched,
            assignee: assignee.map(str::to_owned),
            description: "test".into(),
            escalate_after: Utc::now(),
        })
    }

    #[test]
    fn groups_by_assignee_with_unassigned_bucket() {
        let mut screen = AssignmentsScreen::new();
        screen
            .update(&Action::AlertsUpdated(Arc::new(vec![
                dispatched("a1", Some("off_002")),
                dispatched("a2", Some("off_001")),
                dispatched("a3", None),
                dispatched("a4", Some("off_001")),
            ])))
            .expect("update never fails");

        let groups = screen.grouped();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups["off_001"].len(), 2);
        assert_eq!(groups["(unassigned)"].len(), 1);
    }

    #[test]
    fn only_dispatched_alerts_appear() {
        let mut pending = dispatched("a1", Some("off_002"));
        Arc::make_mut(&mut pending).status = AlertStatus::Pending;

        let mut screen = AssignmentsScreen::new();
        screen
            .update(&Action::AlertsUpdated(Arc::new(vec![pending])))
            .expect("update never fails");

        assert!(screen.flattened().is_empty());
    }
}
