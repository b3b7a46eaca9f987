//! Overview screen — aggregate system health, alert counts, overdue
//! queue, and tourist telemetry.

use std::sync::Arc;

use chrono::Utc;
use color_eyre::eyre::Result;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use tokio::sync::mpsc::UnboundedSender;

use safewatch_core::{Alert, AlertStatus, SystemStatus, TouristPing};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::{severity, time_fmt};

pub struct OverviewScreen {
    focused: bool,
    alerts: Arc<Vec<Arc<Alert>>>,
    tourists: Arc<Vec<TouristPing>>,
    status: SystemStatus,
}

impl OverviewScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            alerts: Arc::new(Vec::new()),
            tourists: Arc::new(Vec::new()),
            status: SystemStatus::default(),
        }
    }

    fn count(&self, status: AlertStatus) -> usize {
        self.alerts.iter().filter(|a| a.status == status).count()
    }

    fn render_system_panel(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" System ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let label = Style::default().fg(theme::BORDER_GRAY);
        let value = Style::default().fg(theme::DIM_WHITE);

        let lines = vec![
            Line::from(vec![
                Span::styled("  Health    ", label),
                Span::styled(
                    self.status.health.to_string(),
                    Style::default().fg(theme::health_color(self.status.health)),
                ),
            ]),
            Line::from(vec![
                Span::styled("  Cameras   ", label),
                Span::styled(
                    format!(
                        "{}/{} online",
                        self.status.cameras_online, self.status.cameras_total
                    ),
                    if self.status.cameras_online < self.status.cameras_total {
                        Style::default().fg(theme::AMBER)
                    } else {
                        value
                    },
                ),
            ]),
            Line::from(vec![
                Span::styled("  Tourists  ", label),
                Span::styled(format!("{} active", self.status.tourists_active), value),
            ]),
            Line::from(vec![
                Span::styled("  Pending   ", label),
                Span::styled(
                    format!("{} alerts", self.status.alerts_pending),
                    if self.status.alerts_pending > 0 {
                        Style::default().fg(theme::AMBER)
                    } else {
                        value
                    },
                ),
            ]),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_counts_panel(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Alerts by status ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lines: Vec<Line> = [
            AlertStatus::Pending,
            AlertStatus::Reviewing,
            AlertStatus::Dispatched,
            AlertStatus::Resolved,
            AlertStatus::FalsePositive,
        ]
        .into_iter()
        .map(|status| {
            Line::from(vec![
                Span::styled(
                    format!("  {:<16}", status.to_string()),
                    Style::default().fg(theme::status_color(status)),
                ),
                Span::styled(
                    format!("{}", self.count(status)),
                    Style::default().fg(theme::DIM_WHITE),
                ),
            ])
        })
        .collect();

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_overdue_panel(&self, frame: &mut Frame, area: Rect) {
        let now = Utc::now();
        let overdue: Vec<&Arc<Alert>> = self.alerts.iter().filter(|a| a.is_overdue(now)).collect();

        let block = Block::default()
            .title(format!(" Overdue ({}) ", overdue.len()))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if overdue.is_empty() {
                theme::border_default()
            } else {
                Style::default().fg(theme::ALERT_RED)
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines: Vec<Line> = overdue
            .iter()
            .take(inner.height as usize)
            .map(|alert| {
                Line::from(vec![
                    Span::styled("  ", theme::table_row()),
                    severity::severity_span(alert.severity),
                    Span::styled(
                        format!(
                            " {:<10} waiting {}",
                            alert.kind.to_string(),
                            time_fmt::fmt_ago(alert.timestamp, now)
                        ),
                        Style::default().fg(theme::ALERT_RED),
                    ),
                ])
            })
            .collect();

        if overdue.is_empty() {
            lines.push(Line::from(Span::styled(
                "  Nothing waiting past the escalation window.",
                Style::default().fg(theme::BORDER_GRAY),
            )));
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_tourists_panel(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" Tourists ({}) ", self.tourists.len()))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines: Vec<Line> = Vec::new();
        for ping in self.tourists.iter().take(inner.height as usize) {
            let battery = match ping.battery_level {
                Some(pct) if ping.battery_low() => Span::styled(
                    format!("  {pct:>3}%"),
                    Style::default().fg(theme::ALERT_RED),
                ),
                Some(pct) => Span::styled(
                    format!("  {pct:>3}%"),
                    Style::default().fg(theme::DIM_WHITE),
                ),
                None => Span::styled("    -", Style::default().fg(theme::BORDER_GRAY)),
            };
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {:<12}", ping.tourist_id),
                    Style::default().fg(theme::DIM_WHITE),
                ),
                Span::styled(
                    format!("{:>9.4},{:>9.4}", ping.location.lat, ping.location.lng),
                    Style::default().fg(theme::BORDER_GRAY),
                ),
                battery,
            ]));
        }

        if self.tourists.is_empty() {
            lines.push(Line::from(Span::styled(
                "  No location batch received yet.",
                Style::default().fg(theme::BORDER_GRAY),
            )));
        }

        frame.render_widget(Paragraph::new(lines), inner);
    }
}

impl Component for OverviewScreen {
    fn init(&mut self, _action_tx: UnboundedSender<Action>) -> Result<()> {
        Ok(())
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::AlertsUpdated(alerts) => self.alerts = Arc::clone(alerts),
            Action::TouristsUpdated(tourists) => self.tourists = Arc::clone(tourists),
            Action::StatusUpdated(status) => self.status = *status,
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::vertical([Constraint::Length(6), Constraint::Min(5)]).split(area);
        let top = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[0]);
        let bottom = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);

        self.render_system_panel(frame, top[0]);
        self.render_counts_panel(frame, top[1]);
        self.render_overdue_panel(frame, bottom[0]);
        self.render_tourists_panel(frame, bottom[1]);
    }

    fn focused(&self) -> bool {
        self.focused
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "Overview"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safewatch_core::{AlertId, AlertKind, Location, Severity, SystemHealth};

    fn alert(status: AlertStatus) -> Arc<Alert> {
        Arc::new(Alert {
            id: AlertId::new_local(),
            kind: AlertKind::Geofence,
            severity: Severity::Low,
            confidence: None,
            timestamp: Utc::now(),
            location: Location::new(0.0, 0.0),
            source: None,
            subjects: Vec::new(),
            evidence: None,
            status,
            assignee: None,
            description: "test".into(),
            escalate_after: Utc::now() + chrono::Duration::minutes(5),
        })
    }

    #[test]
    fn counts_partition_by_status() {
        let mut screen = OverviewScreen::new();
        screen
            .update(&Action::AlertsUpdated(Arc::new(vec![
                alert(AlertStatus::Pending),
                alert(AlertStatus::Pending),
                alert(AlertStatus::Resolved),
            ])))
            .expect("update never fails");

        assert_eq!(screen.count(AlertStatus::Pending), 2);
        assert_eq!(screen.count(AlertStatus::Resolved), 1);
        assert_eq!(screen.count(AlertStatus::Dispatched), 0);
    }

    #[test]
    fn status_push_replaces_the_snapshot() {
        let mut screen = OverviewScreen::new();
        screen
            .update(&Action::StatusUpdated(SystemStatus {
                cameras_online: 7,
                cameras_total: 8,
                tourists_active: 120,
                alerts_pending: 3,
                health: SystemHealth::Degraded,
            }))
            .expect("update never fails");

        assert_eq!(screen.status.cameras_online, 7);
        assert_eq!(screen.status.health, SystemHealth::Degraded);
    }
}
