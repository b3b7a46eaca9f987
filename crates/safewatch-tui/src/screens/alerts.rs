//! Alert feed screen — newest-first live list with lifecycle actions.

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

use safewatch_core::{Alert, Command};

use crate::action::{Action, ConfirmAction};
use crate::component::Component;
use crate::theme;
use crate::widgets::{severity, time_fmt};

pub struct AlertsScreen {
    focused: bool,
    alerts: Arc<Vec<Arc<Alert>>>,
    /// Selection index into the filtered view.
    selected: usize,
    /// Hide resolved and false-positive alerts.
    open_only: bool,
}

impl AlertsScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            alerts: Arc::new(Vec::new()),
            selected: 0,
            open_only: false,
        }
    }

    /// Alerts currently shown, respecting the open-only filter. The
    /// feed order (newest first) comes from the store untouched.
    fn visible(&self) -> Vec<&Arc<Alert>> {
        self.alerts
            .iter()
            .filter(|a| !self.open_only || !a.status.is_terminal())
            .collect()
    }

    fn selected_alert(&self) -> Option<Arc<Alert>> {
        self.visible().get(self.selected).map(|a| Arc::clone(*a))
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}

impl Component for AlertsScreen {
    fn init(&mut self, _action_tx: UnboundedSender<Action>) -> Result<()> {
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                let len = self.visible().len();
                if len > 0 {
                    self.selected = (self.selected + 1).min(len - 1);
                }
                Ok(None)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                Ok(None)
            }
            KeyCode::Char('g') => {
                self.selected = 0;
                Ok(None)
            }
            KeyCode::Char('G') => {
                self.selected = self.visible().len().saturating_sub(1);
                Ok(None)
            }
            KeyCode::Char('o') => {
                self.open_only = !self.open_only;
                self.clamp_selection();
                Ok(None)
            }
            KeyCode::Enter => Ok(self
                .selected_alert()
                .map(|a| Action::OpenIncident(a.id.clone()))),
            KeyCode::Char('r') => Ok(self
                .selected_alert()
                .map(|a| Action::Submit(Command::Review { id: a.id.clone() }))),
            KeyCode::Char('d') => Ok(self
                .selected_alert()
                .map(|a| Action::ShowConfirm(ConfirmAction::Dispatch { id: a.id.clone() }))),
            KeyCode::Char('x') => Ok(self
                .selected_alert()
                .map(|a| Action::Submit(Command::Resolve { id: a.id.clone() }))),
            KeyCode::Char('f') => Ok(self.selected_alert().map(|a| {
                Action::ShowConfirm(ConfirmAction::MarkFalsePositive { id: a.id.clone() })
            })),
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
        let visible = self.visible();
        let now = Utc::now();

        let filter_tag = if self.open_only { "open" } else { "all" };
        let title = format!(" Alerts ({}) [{filter_tag}] ", visible.len());
        let block = Block::default()
            .title(title)
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
            Constraint::Min(1),    // feed
            Constraint::Length(1), // hints
        ])
        .split(inner);

        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("  Age   ", theme::table_header()),
            Span::styled("Sev  ", theme::table_header()),
            Span::styled("Kind      ", theme::table_header()),
            Span::styled("Status          ", theme::table_header()),
            Span::styled("Assignee    ", theme::table_header()),
            Span::styled("Description", theme::table_header()),
        ]));

        // Window the feed around the selection
        let visible_height = layout[0].height.saturating_sub(1) as usize;
        let start = self
            .selected
            .saturating_sub(visible_height.saturating_sub(1));

        for (idx, alert) in visible.iter().enumerate().skip(start).take(visible_height) {
            let row_style = if idx == self.selected && self.focused {
                theme::table_selected()
            } else {
                theme::table_row()
            };

            let overdue = if alert.is_overdue(now) { "!" } else { " " };
            let age = time_fmt::fmt_ago(alert.timestamp, now);
            let assignee = alert.assignee.as_deref().unwrap_or("-");
            let desc_width = layout[0].width.saturating_sub(56).max(10) as usize;
            let desc: String = alert.description.chars().take(desc_width).collect();

            lines.push(Line::from(vec![
                Span::styled(
                    format!("{overdue} {age:<6}"),
                    if alert.is_overdue(now) {
                        Style::default().fg(theme::ALERT_RED)
                    } else {
                        row_style
                    },
                ),
                severity::severity_span(alert.severity),
                Span::styled(format!(" {:<10}", alert.kind.to_string()), row_style),
                Span::styled(
                    format!("{:<16}", alert.status.to_string()),
                    Style::default().fg(theme::status_color(alert.status)),
                ),
                Span::styled(format!("{assignee:<12}"), row_style),
                Span::styled(desc, row_style),
            ]));
        }

        if visible.is_empty() {
            lines.push(Line::from(Span::styled(
                "  No alerts. Waiting for the event channel...",
                Style::default().fg(theme::BORDER_GRAY),
            )));
        }

        frame.render_widget(Paragraph::new(lines), layout[0]);

        let hints = Line::from(vec![
            Span::styled("  Enter ", theme::key_hint_key()),
            Span::styled("detail  ", theme::key_hint()),
            Span::styled("r ", theme::key_hint_key()),
            Span::styled("review  ", theme::key_hint()),
            Span::styled("d ", theme::key_hint_key()),
            Span::styled("dispatch  ", theme::key_hint()),
            Span::styled("x ", theme::key_hint_key()),
            Span::styled("resolve  ", theme::key_hint()),
            Span::styled("f ", theme::key_hint_key()),
            Span::styled("false +  ", theme::key_hint()),
            Span::styled("o ", theme::key_hint_key()),
            Span::styled("open only", theme::key_hint()),
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
        "Alerts"
    }
}
