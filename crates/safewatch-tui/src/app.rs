//! Application core — event loop, screen management, action dispatch.

use std::collections::HashMap;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Tabs},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use safewatch_core::{Role, SyncEngine};

use crate::action::{Action, ConfirmAction, Notification, NotificationLevel};
use crate::component::Component;
use crate::data_bridge::spawn_data_bridge;
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;

/// Connection status as seen by the TUI.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting {
        attempt: u32,
    },
}

/// Ticks (4 Hz) before a toast auto-dismisses.
const NOTIFICATION_TICKS: u32 = 20;

/// Top-level application state and event loop.
pub struct App {
    /// Handle to the sync engine; commands are submitted through it.
    engine: SyncEngine,
    /// Current active screen.
    active_screen: ScreenId,
    /// Previous screen for GoBack.
    previous_screen: Option<ScreenId>,
    /// All screen components, keyed by ScreenId.
    screens: HashMap<ScreenId, Box<dyn Component>>,
    /// Whether the app should keep running.
    running: bool,
    /// Connection status indicator.
    connection_status: ConnectionStatus,
    /// Help overlay visibility.
    help_visible: bool,
    /// Pending confirmation dialog, if any.
    confirm: Option<ConfirmAction>,
    /// Active toast notification and its age in ticks.
    notification: Option<(Notification, u32)>,
    /// Terminal size for responsive layout.
    terminal_size: (u16, u16),
    /// Cancels the data bridge on shutdown.
    cancel: CancellationToken,
    /// Action sender — components can dispatch actions through this.
    action_tx: mpsc::UnboundedSender<Action>,
    /// Action receiver — main loop drains this.
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    /// Create a new App with all screens mounted.
    pub fn new(engine: SyncEngine) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let screens: HashMap<ScreenId, Box<dyn Component>> = create_screens().into_iter().collect();

        Self {
            engine,
            active_screen: ScreenId::Alerts,
            previous_screen: None,
            screens,
            running: true,
            connection_status: ConnectionStatus::default(),
            help_visible: false,
            confirm: None,
            notification: None,
            terminal_size: (0, 0),
            cancel: CancellationToken::new(),
            action_tx,
            action_rx,
        }
    }

    /// Initialize all screen components with the action sender.
    fn init_screens(&mut self) -> Result<()> {
        for screen in self.screens.values_mut() {
            screen.init(self.action_tx.clone())?;
        }
        // Focus the initial screen
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
        Ok(())
    }

    /// Run the main event loop. This is the heart of the TUI.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.terminal_size = tui.size().unwrap_or((80, 24));
        self.init_screens()?;

        // Bridge engine streams into the action loop
        tokio::spawn(spawn_data_bridge(
            self.engine.clone(),
            self.action_tx.clone(),
            self.cancel.clone(),
        ));

        let mut events = EventReader::new(
            Duration::from_millis(250), // 4 Hz tick
            Duration::from_millis(33),  // ~30 FPS render
        );

        info!("TUI event loop started");

        while self.running {
            // 1. Wait for the next event
            let Some(event) = events.next().await else {
                break;
            };

            // 2. Map event → action(s)
            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Mouse(mouse) => {
                    if let Some(action) = self.handle_mouse_event(mouse)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => {
                    self.action_tx.send(Action::Resize(w, h))?;
                }
                Event::Tick => {
                    self.action_tx.send(Action::Tick)?;
                }
                Event::Render => {
                    self.action_tx.send(Action::Render)?;
                }
            }

            // 3. Drain and process all queued actions
            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop();
        self.cancel.cancel();
        info!("TUI event loop ended");
        Ok(())
    }

    /// Map a key event to an action. Global keys are handled here;
    /// screen-specific keys are delegated to the active screen component.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        // A pending confirmation swallows all input
        if self.confirm.is_some() {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Enter => Ok(Some(Action::ConfirmYes)),
                KeyCode::Char('n') | KeyCode::Esc => Ok(Some(Action::ConfirmNo)),
                _ => Ok(None),
            };
        }

        if self.help_visible {
            // In help mode, Esc or ? closes help
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Ok(Some(Action::ToggleHelp)),
                _ => Ok(None),
            };
        }

        // Global keybindings
        match (key.modifiers, key.code) {
            // Quit
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),

            // Help
            (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),

            // Screen navigation via number keys
            (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='3')) => {
                let n = c as u8 - b'0';
                if let Some(screen) = ScreenId::from_number(n) {
                    return Ok(Some(Action::SwitchScreen(screen)));
                }
            }

            // Tab / Shift+Tab for screen cycling
            (KeyModifiers::NONE, KeyCode::Tab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
            }
            (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
            }

            // Esc — context-dependent back
            (KeyModifiers::NONE, KeyCode::Esc) => return Ok(Some(Action::GoBack)),

            _ => {}
        }

        // Delegate to active screen component
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_key_event(key);
        }

        Ok(None)
    }

    /// Handle mouse events (delegate to active screen).
    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_mouse_event(mouse);
        }
        Ok(None)
    }

    /// Process a single action — update app state and propagate to
    /// components.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.running = false;
            }

            Action::Resize(w, h) => {
                self.terminal_size = (*w, *h);
            }

            Action::SwitchScreen(target) => {
                self.switch_screen(*target);
            }

            Action::GoBack => {
                if let Some(prev) = self.previous_screen.take() {
                    self.action_tx.send(Action::SwitchScreen(prev))?;
                }
            }

            Action::ToggleHelp => {
                self.help_visible = !self.help_visible;
            }

            Action::Connecting => {
                self.connection_status = ConnectionStatus::Connecting;
            }

            Action::Connected => {
                self.connection_status = ConnectionStatus::Connected;
            }

            Action::Disconnected(reason) => {
                // Not fatal: the store keeps its last-known data and
                // the channel keeps retrying in the background.
                warn!(%reason, "backend connection lost");
                self.connection_status = ConnectionStatus::Disconnected;
            }

            Action::Reconnecting { attempt } => {
                self.connection_status = ConnectionStatus::Reconnecting { attempt: *attempt };
            }

            Action::OpenIncident(_) => {
                // Seed the detail screen before making it active
                if let Some(screen) = self.screens.get_mut(&ScreenId::Incident) {
                    screen.update(action)?;
                }
                self.switch_screen(ScreenId::Incident);
            }

            Action::Submit(command) => {
                self.submit_command(command.clone());
            }

            Action::ShowConfirm(confirm) => {
                self.confirm = Some(confirm.clone());
            }

            Action::ConfirmYes => {
                if let Some(confirm) = self.confirm.take() {
                    self.submit_command(confirm.into_command());
                }
            }

            Action::ConfirmNo => {
                self.confirm = None;
            }

            Action::Notify(notification) => {
                self.notification = Some((notification.clone(), 0));
            }

            Action::DismissNotification => {
                self.notification = None;
            }

            Action::Tick => {
                // Age the toast; screens also see ticks for their own
                // time-dependent displays (escalation markers).
                if let Some((_, ref mut age)) = self.notification {
                    *age += 1;
                    if *age >= NOTIFICATION_TICKS {
                        self.notification = None;
                    }
                }
                self.propagate_to_all(action)?;
            }

            // Data snapshots fan out to every screen so backgrounded
            // screens are current the moment they become active.
            Action::AlertsUpdated(_) | Action::TouristsUpdated(_) | Action::StatusUpdated(_) => {
                self.propagate_to_all(action)?;
            }

            // Render is handled in the main loop, not here
            Action::Render => {}

            // Propagate everything else to the active screen
            other => {
                if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                    if let Some(follow_up) = screen.update(other)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Send an action to every mounted screen.
    fn propagate_to_all(&mut self, action: &Action) -> Result<()> {
        for screen in self.screens.values_mut() {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    /// Switch the active screen, moving focus with it.
    fn switch_screen(&mut self, target: ScreenId) {
        if target == self.active_screen {
            return;
        }
        debug!("switching screen: {} → {}", self.active_screen, target);
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(false);
        }
        self.previous_screen = Some(self.active_screen);
        self.active_screen = target;
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
    }

    /// Submit a command to the engine on a background task. Failures
    /// come back as toast notifications; successes are already visible
    /// through the optimistic store update.
    fn submit_command(&self, command: safewatch_core::Command) {
        let engine = self.engine.clone();
        let action_tx = self.action_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = engine.execute(command).await {
                let _ = action_tx.send(Action::Notify(Notification::error(e.to_string())));
            }
        });
    }

    /// Render the full application frame.
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // Layout: [screen content] [tab bar] [status bar]
        let layout = Layout::vertical([
            Constraint::Min(1),    // Screen content
            Constraint::Length(1), // Tab bar
            Constraint::Length(1), // Status bar
        ])
        .split(area);

        let content_area = layout[0];
        let tab_area = layout[1];
        let status_area = layout[2];

        // Render active screen
        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, content_area);
        }

        // Render tab bar
        self.render_tab_bar(frame, tab_area);

        // Render status bar
        self.render_status_bar(frame, status_area);

        // Overlays, back to front
        if let Some((ref notification, _)) = self.notification {
            render_notification(frame, content_area, notification);
        }
        if let Some(ref confirm) = self.confirm {
            render_confirm_dialog(frame, area, confirm);
        }
        if self.help_visible {
            render_help_overlay(frame, area);
        }
    }

    /// Render the bottom tab bar showing all primary screens.
    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(
                    format!(" {} {} ", id.number(), id.label()),
                    style,
                ))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(
                ScreenId::ALL
                    .iter()
                    .position(|&s| s == self.active_screen)
                    .unwrap_or(0),
            );

        frame.render_widget(tabs, area);
    }

    /// Render the bottom status bar with connection status, role, and
    /// key hints.
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let connection_indicator = match &self.connection_status {
            ConnectionStatus::Connected => {
                Span::styled("● connected", Style::default().fg(theme::CALM_GREEN))
            }
            ConnectionStatus::Disconnected => Span::styled(
                "○ disconnected (showing last known data)",
                Style::default().fg(theme::ALERT_RED),
            ),
            ConnectionStatus::Reconnecting { attempt } => Span::styled(
                format!("◐ reconnecting (attempt {attempt})"),
                Style::default().fg(theme::AMBER),
            ),
            ConnectionStatus::Connecting => {
                Span::styled("◐ connecting", Style::default().fg(theme::AMBER))
            }
        };

        let role = self.engine.config().role;
        let role_span = if role == Role::Viewer {
            Span::styled(
                format!(" │ {role} (read-only)"),
                Style::default().fg(theme::AMBER),
            )
        } else {
            Span::styled(format!(" │ {role}"), Style::default().fg(theme::DIM_WHITE))
        };

        let hints = Span::styled(" │ ? help  q quit", theme::key_hint());

        let line = Line::from(vec![Span::raw(" "), connection_indicator, role_span, hints]);

        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Render the help overlay centered on screen.
fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let help_area = centered_rect(area, 58, 20);

    // Clear the background
    frame.render_widget(
        Block::default().style(Style::default().bg(theme::BG_DARK)),
        help_area,
    );

    let block = Block::default()
        .title(" Keyboard Shortcuts ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused());

    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);

    let help_text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Navigation",
            Style::default().fg(theme::SIGNAL_CYAN),
        )),
        Line::from(Span::styled("  ─────────", theme::key_hint())),
        Line::from(vec![
            Span::styled("  1-3       ", theme::key_hint_key()),
            Span::styled("Jump to screen", theme::key_hint()),
        ]),
        Line::from(vec![
            Span::styled("  Tab       ", theme::key_hint_key()),
            Span::styled("Next screen", theme::key_hint()),
        ]),
        Line::from(vec![
            Span::styled("  j/k ↑/↓   ", theme::key_hint_key()),
            Span::styled("Move up/down", theme::key_hint()),
        ]),
        Line::from(vec![
            Span::styled("  Enter     ", theme::key_hint_key()),
            Span::styled("Open incident detail", theme::key_hint()),
        ]),
        Line::from(vec![
            Span::styled("  Esc       ", theme::key_hint_key()),
            Span::styled("Back / close", theme::key_hint()),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "  Alert actions",
            Style::default().fg(theme::SIGNAL_CYAN),
        )),
        Line::from(Span::styled("  ─────────────", theme::key_hint())),
        Line::from(vec![
            Span::styled("  r         ", theme::key_hint_key()),
            Span::styled("Review (acknowledge)", theme::key_hint()),
        ]),
        Line::from(vec![
            Span::styled("  d         ", theme::key_hint_key()),
            Span::styled("Dispatch a responder", theme::key_hint()),
        ]),
        Line::from(vec![
            Span::styled("  x         ", theme::key_hint_key()),
            Span::styled("Resolve", theme::key_hint()),
        ]),
        Line::from(vec![
            Span::styled("  f         ", theme::key_hint_key()),
            Span::styled("Mark false positive", theme::key_hint()),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "                       Esc or ? to close",
            theme::key_hint(),
        )),
    ];

    frame.render_widget(Paragraph::new(help_text), inner);
}

/// Render the confirmation dialog centered on screen.
fn render_confirm_dialog(frame: &mut Frame, area: Rect, confirm: &ConfirmAction) {
    let dialog_area = centered_rect(area, 54, 5);

    frame.render_widget(
        Block::default().style(Style::default().bg(theme::BG_DARK)),
        dialog_area,
    );

    let block = Block::default()
        .title(" Confirm ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme::AMBER));

    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let lines = vec![
        Line::from(Span::styled(
            format!(" {confirm}"),
            Style::default().fg(theme::DIM_WHITE),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" y/Enter ", theme::key_hint_key()),
            Span::styled("confirm   ", theme::key_hint()),
            Span::styled("n/Esc ", theme::key_hint_key()),
            Span::styled("cancel", theme::key_hint()),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

/// Render a toast notification in the bottom-right of the content area.
fn render_notification(frame: &mut Frame, area: Rect, notification: &Notification) {
    let color = match notification.level {
        NotificationLevel::Info => theme::SIGNAL_CYAN,
        NotificationLevel::Success => theme::CALM_GREEN,
        NotificationLevel::Warning => theme::AMBER,
        NotificationLevel::Error => theme::ALERT_RED,
    };

    let width = (u16::try_from(notification.message.len()).unwrap_or(u16::MAX) + 4)
        .min(area.width.saturating_sub(2));
    let toast_area = Rect::new(
        area.x + area.width.saturating_sub(width + 1),
        area.y + area.height.saturating_sub(4),
        width,
        3,
    );

    frame.render_widget(
        Block::default().style(Style::default().bg(theme::BG_DARK)),
        toast_area,
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color));
    let inner = block.inner(toast_area);
    frame.render_widget(block, toast_area);

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!(" {}", notification.message),
            Style::default().fg(color),
        ))),
        inner,
    );
}

/// A rect of at most `width` x `height`, centered in `area`.
fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = (area.width.saturating_sub(width)) / 2;
    let y = (area.height.saturating_sub(height)) / 2;
    Rect::new(area.x + x, area.y + y, width, height)
}
