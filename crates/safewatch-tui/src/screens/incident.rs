//! Incident detail screen — full record for one alert, with the same
//! lifecycle actions as the feed.

use std::sync::Arc;

use chrono::Utc;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};
use tokio::sync::mpsc::UnboundedSender;

use safewatch_core::{Alert, AlertId, Command};

use crate::action::{Action, ConfirmAction};
use crate::component::Component;
use crate::theme;
use crate::widgets::{severity, status_indicator, time_fmt};

pub struct IncidentScreen {
    focused: bool,
    /// The alert being inspected. Kept by id so authoritative updates
    /// refresh the view in place.
    open_id: Option<AlertId>,
    alert: Option<Arc<Alert>>,
    alerts: Arc<Vec<Arc<Alert>>>,
}

impl IncidentScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            open_id: None,
            alert: None,
            alerts: Arc::new(Vec::new()),
        }
    }

    fn refresh(&mut self) {
        let Some(ref id) = self.open_id else {
            self.alert = None;
            return;
        };
        self.alert = self.alerts.iter().find(|a| &a.id == id).map(Arc::clone);
    }

    fn detail_lines(alert: &Alert) -> Vec<Line<'static>> {
        let now = Utc::now();
        let label = Style::default().fg(theme::BORDER_GRAY);
        let value = Style::default().fg(theme::DIM_WHITE);

        let mut lines = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("  Status      ", label),
                status_indicator::status_span(alert.status),
            ]),
            Line::from(vec![
                Span::styled("  Severity    ", label),
                severity::severity_span(alert.severity),
                Span::styled(
                    alert
                        .confidence
                        .map(|c| format!("  (confidence {c:.2})"))
                        .unwrap_or_default(),
                    label,
                ),
            ]),
            Line::from(vec![
                Span::styled("  Kind        ", label),
                Span::styled(alert.kind.to_string(), value),
            ]),
            Line::from(vec![
                Span::styled("  Raised      ", label),
                Span::styled(
                    format!(
                        "{} ({} ago)",
                        alert.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                        time_fmt::fmt_ago(alert.timestamp, now)
                    ),
                    value,
                ),
            ]),
            Line::from(vec![
                Span::styled("  Location    ", label),
                Span::styled(
                    if alert.location.is_unknown() {
                        "unknown".to_owned()
                    } else {
                        format!(
                            "{:.5}, {:.5}{}",
                            alert.location.lat,
                            alert.location.lng,
                            alert
                                .location
                                .label
                                .as_deref()
                                .map(|l| format!(" ({l})"))
                                .unwrap_or_default()
                        )
                    },
                    value,
                ),
            ]),
            Line::from(vec![
                Span::styled("  Source      ", label),
                Span::styled(alert.source.clone().unwrap_or_else(|| "-".into()), value),
            ]),
            Line::from(vec![
                Span::styled("  Assignee    ", label),
                Span::styled(alert.assignee.clone().unwrap_or_else(|| "-".into()), value),
            ]),
        ];

        if !alert.subjects.is_empty() {
            lines.push(Line::from(vec![
                Span::styled("  Subjects    ", label),
                Span::styled(alert.subjects.join(", "), value),
            ]));
        }

        if alert.is_overdue(now) {
            lines.push(Line::from(Span::styled(
                "  ! Unacknowledged past the escalation window",
                Style::default().fg(theme::ALERT_RED),
            )));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {}", alert.description),
            value,
        )));

        if let Some(ref evidence) = alert.evidence {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "  Evidence",
                Style::default().fg(theme::SIGNAL_CYAN),
            )));
            for media in &evidence.media {
                lines.push(Line::from(Span::styled(format!("    {media}"), value)));
            }
            if !evidence.metadata.is_null() {
                let rendered = serde_json::to_string_pretty(&evidence.metadata)
                    .unwrap_or_else(|_| "(unreadable metadata)".into());
                for line in rendered.lines() {
                    lines.push(Line::from(Span::styled(format!("    {line}"), label)));
                }
            }
        }

        lines
    }
}

impl Component for IncidentScreen {
    fn init(&mut self, _action_tx: UnboundedSender<Action>) -> Result<()> {
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let Some(ref alert) = self.alert else {
            return Ok(None);
        };
        let id = alert.id.clone();

        match key.code {
            KeyCode::Char('r') => Ok(Some(Action::Submit(Command::Review { id }))),
            KeyCode::Char('d') => Ok(Some(Action::ShowConfirm(ConfirmAction::Dispatch { id }))),
            KeyCode::Char('x') => Ok(Some(Action::Submit(Command::Resolve { id }))),
            KeyCode::Char('f') => Ok(Some(Action::ShowConfirm(ConfirmAction::MarkFalsePositive {
                id,
            }))),
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::OpenIncident(id) => {
                self.open_id = Some(id.clone());
                self.refresh();
            }
            Action::AlertsUpdated(alerts) => {
                self.alerts = Arc::clone(alerts);
                self.refresh();
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = match self.alert {
            Some(ref alert) => format!(" Incident {} ", alert.id),
            None => " Incident ".to_owned(),
        };

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

        let Some(ref alert) = self.alert else {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    "  This alert is no longer in the feed.",
                    Style::default().fg(theme::BORDER_GRAY),
                ))),
                inner,
            );
            return;
        };

        let mut lines = Self::detail_lines(alert);
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("  r ", theme::key_hint_key()),
            Span::styled("review  ", theme::key_hint()),
            Span::styled("d ", theme::key_hint_key()),
            Span::styled("dispatch  ", theme::key_hint()),
            Span::styled("x ", theme::key_hint_key()),
            Span::styled("resolve  ", theme::key_hint()),
            Span::styled("f ", theme::key_hint_key()),
            Span::styled("false positive  ", theme::key_hint()),
            Span::styled("Esc ", theme::key_hint_key()),
            Span::styled("back", theme::key_hint()),
        ]));

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }

    fn focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "Incident"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use safewatch_core::{AlertKind, AlertStatus, Location, Severity};

    fn alert(id: &str, status: AlertStatus) -> Arc<Alert> {
        Arc::new(Alert {
            id: AlertId::from(id),
            kind: AlertKind::Panic,
            severity: Severity::Critical,
            confidence: Some(0.95),
            timestamp: Utc::now(),
            location: Location::new(26.1, 91.7),
            source: None,
            subjects: vec!["t_001".into()],
            evidence: None,
            status,
            assignee: None,
            description: "Panic button pressed".into(),
            escalate_after: Utc::now(),
        })
    }

    #[test]
    fn authoritative_updates_refresh_the_open_incident() {
        let mut screen = IncidentScreen::new();
        screen
            .update(&Action::AlertsUpdated(Arc::new(vec![alert(
                "a1",
                AlertStatus::Pending,
            )])))
            .expect("update never fails");
        screen
            .update(&Action::OpenIncident(AlertId::from("a1")))
            .expect("update never fails");
        assert_eq!(
            screen.alert.as_ref().map(|a| a.status),
            Some(AlertStatus::Pending)
        );

        screen
            .update(&Action::AlertsUpdated(Arc::new(vec![alert(
                "a1",
                AlertStatus::Dispatched,
            )])))
            .expect("update never fails");
        assert_eq!(
            screen.alert.as_ref().map(|a| a.status),
            Some(AlertStatus::Dispatched)
        );
    }

    #[test]
    fn vanished_alert_clears_the_view_without_panicking() {
        let mut screen = IncidentScreen::new();
        screen
            .update(&Action::OpenIncident(AlertId::from("ghost")))
            .expect("update never fails");
        assert!(screen.alert.is_none());
        assert!(
            screen
                .handle_key_event(KeyEvent::from(KeyCode::Char('r')))
                .expect("key handling never fails")
                .is_none()
        );
    }
}
