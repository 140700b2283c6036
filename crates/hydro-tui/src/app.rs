//! Application core: event loop, action dispatch, background writes.

use std::time::Duration;

use chrono::Utc;
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use hydro_core::{Dashboard, RefreshHealth};

use crate::action::Action;
use crate::component::Component;
use crate::data_bridge::spawn_data_bridge;
use crate::event::{Event, EventReader};
use crate::screens::dashboard::DashboardScreen;
use crate::theme;
use crate::tui::Tui;

/// Top-level application state and event loop.
pub struct App {
    dashboard: Dashboard,
    screen: DashboardScreen,
    running: bool,
    help_visible: bool,
    /// Latest refresh-loop bookkeeping, for the header.
    health: RefreshHealth,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(dashboard: Dashboard) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let screen = DashboardScreen::new(dashboard.status_banner());

        Self {
            dashboard,
            screen,
            running: true,
            help_visible: false,
            health: RefreshHealth::default(),
            action_tx,
            action_rx,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;

        let refresh = self.dashboard.start_refresh();
        let bridge_cancel = CancellationToken::new();
        tokio::spawn(spawn_data_bridge(
            refresh.snapshots(),
            refresh.health(),
            self.action_tx.clone(),
            bridge_cancel.clone(),
        ));

        let mut events = EventReader::new(
            Duration::from_millis(250), // banner expiry, header age
            Duration::from_millis(33),  // ~30 FPS
        );

        info!(hub = %self.dashboard.config().url, "TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Tick => self.action_tx.send(Action::Tick)?,
                // ratatui resizes its buffers on the next draw
                Event::Resize | Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop();
        bridge_cancel.cancel();
        refresh.shutdown().await;
        info!("TUI event loop ended");
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if (key.modifiers, key.code) == (KeyModifiers::CONTROL, KeyCode::Char('c')) {
            return Ok(Some(Action::Quit));
        }

        // Text entry and modal alerts own the keyboard.
        if self.screen.captures_input() {
            return self.screen.handle_key_event(key);
        }

        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Char('q')) => Ok(Some(Action::Quit)),
            (KeyModifiers::NONE, KeyCode::Char('?')) => Ok(Some(Action::ToggleHelp)),
            _ => self.screen.handle_key_event(key),
        }
    }

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,
            Action::ToggleHelp => self.help_visible = !self.help_visible,
            Action::HealthUpdated(health) => self.health = health.clone(),
            Action::Render => {}

            Action::SubmitAssignment(request) => {
                let controller = self.dashboard.assignments().clone();
                let request = request.clone();
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    let outcome = controller.submit(&request).await;
                    let _ = tx.send(Action::AssignmentFinished(outcome));
                });
            }

            Action::SubmitRename(request) => {
                let controller = self.dashboard.renames().clone();
                let request = request.clone();
                let tx = self.action_tx.clone();
                tokio::spawn(async move {
                    let action = match controller.rename(request).await {
                        Ok(done) => Action::RenameSucceeded(done),
                        Err(e) => Action::RenameFailed(e),
                    };
                    let _ = tx.send(action);
                });
            }

            other => {
                if let Some(follow_up) = self.screen.update(other)? {
                    self.action_tx.send(follow_up)?;
                }
            }
        }

        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::vertical([
            Constraint::Length(1), // Header
            Constraint::Min(1),    // Screen content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

        self.render_header(frame, layout[0]);
        self.screen.render(frame, layout[1]);
        Self::render_status_bar(frame, layout[2]);

        if self.help_visible {
            Self::render_help_overlay(frame, area);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(" HydroDash ", theme::title_style()),
            Span::styled("│ hub ", theme::key_hint()),
            Span::styled(self.dashboard.config().url.to_string(), theme::table_row()),
            Span::styled(" │ ", theme::key_hint()),
        ];

        spans.push(match self.health.last_success {
            Some(at) => {
                let age = (Utc::now() - at).to_std().unwrap_or_default();
                let age = Duration::from_secs(age.as_secs());
                Span::styled(
                    format!("refreshed {} ago", humantime::format_duration(age)),
                    Style::default().fg(theme::SUCCESS_GREEN),
                )
            }
            None => Span::styled("waiting for first refresh", Style::default().fg(theme::SAND)),
        });

        if self.health.consecutive_failures > 0 {
            spans.push(Span::styled(" │ ", theme::key_hint()));
            spans.push(Span::styled(
                format!("{} failed", self.health.consecutive_failures),
                Style::default().fg(theme::ERROR_RED),
            ));
            if let Some(err) = &self.health.last_error {
                spans.push(Span::styled(format!(" ({err})"), theme::key_hint()));
            }
        }

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_status_bar(frame: &mut Frame, area: Rect) {
        let hints = Line::from(vec![
            Span::styled(" ? ", theme::key_hint_key()),
            Span::styled("help  ", theme::key_hint()),
            Span::styled("q ", theme::key_hint_key()),
            Span::styled("quit", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), area);
    }

    fn render_help_overlay(frame: &mut Frame, area: Rect) {
        let help_width = 52u16.min(area.width.saturating_sub(4));
        let help_height = 16u16.min(area.height.saturating_sub(4));

        let x = area.width.saturating_sub(help_width) / 2;
        let y = area.height.saturating_sub(help_height) / 2;
        let help_area = Rect::new(area.x + x, area.y + y, help_width, help_height);

        frame.render_widget(Clear, help_area);

        let block = Block::default()
            .title(" Keyboard Shortcuts ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));

        let entry = |key: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(format!("  {key:<10}"), theme::key_hint_key()),
                Span::styled(what, theme::key_hint()),
            ])
        };

        let help_text = vec![
            Line::from(""),
            entry("j/k ↑/↓", "Select node"),
            entry("e Enter", "Rename selected node"),
            entry("Tab", "Cycle focus: nodes, reservoir, well"),
            entry("h/l ←/→", "Change reservoir / well choice"),
            entry("s", "Send assignment"),
            Line::from(""),
            entry("Esc", "Cancel rename / close"),
            entry("?", "This help"),
            entry("q", "Quit"),
            Line::from(""),
            Line::from(Span::styled("  Esc or ? to close", theme::key_hint())),
        ];

        frame.render_widget(Paragraph::new(help_text).block(block), help_area);
    }
}
