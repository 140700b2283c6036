//! Dashboard screen: node table, assignment form, rename prompt.
//!
//! This screen is the single owner of the [`RenderEngine`]: snapshots from
//! the refresh loop rebuild it wholesale, a confirmed rename patches one
//! name cell, and nothing else writes to it.

use std::time::Instant;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap,
};
use tracing::debug;
use tui_input::{Input, InputRequest};

use hydro_core::{
    AssignRole, AssignmentRequest, DeviceSnapshot, NameCell, NodeId, NodeRow, RenameError,
    RenameRequest, RenderEngine, SelectList, StatusBanner,
};

use crate::action::Action;
use crate::component::Component;
use crate::theme;
use crate::widgets::{signal_bars, status_indicator};

const RENAME_REJECTED: &str = "Failed to update the name.";

/// Which part of the screen receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Focus {
    #[default]
    Nodes,
    Reservoir,
    Well,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Self::Nodes => Self::Reservoir,
            Self::Reservoir => Self::Well,
            Self::Well => Self::Nodes,
        }
    }
}

/// Open rename prompt for one node.
struct RenamePrompt {
    id: NodeId,
    input: Input,
}

pub struct DashboardScreen {
    engine: RenderEngine,
    banner: StatusBanner,
    table_state: TableState,
    focus: Focus,
    /// Current choice in each selection list, kept by id across refreshes.
    reservoir: Option<NodeId>,
    well: Option<NodeId>,
    rename: Option<RenamePrompt>,
    alert: Option<String>,
}

impl DashboardScreen {
    pub fn new(banner: StatusBanner) -> Self {
        Self {
            engine: RenderEngine::new(),
            banner,
            table_state: TableState::default(),
            focus: Focus::default(),
            reservoir: None,
            well: None,
            rename: None,
            alert: None,
        }
    }

    fn selected_row(&self) -> Option<&NodeRow> {
        self.table_state
            .selected()
            .and_then(|i| self.engine.rows().get(i))
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.engine.rows().len();
        if len == 0 {
            self.table_state.select(None);
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(len - 1);
        self.table_state.select(Some(next));
    }

    fn apply_snapshot(&mut self, snapshot: &DeviceSnapshot) {
        let selected_id = self.selected_row().map(|row| row.id.clone());

        self.engine.render(snapshot);

        let rows = self.engine.rows();
        let index = selected_id
            .and_then(|id| rows.iter().position(|row| row.id == id))
            .or_else(|| self.table_state.selected().map(|i| i.min(rows.len().saturating_sub(1))))
            .or(Some(0))
            .filter(|_| !rows.is_empty());
        self.table_state.select(index);

        self.reservoir = keep_choice(self.engine.reservoir_options(), self.reservoir.take());
        self.well = keep_choice(self.engine.well_options(), self.well.take());
    }

    fn choice(&self, role: AssignRole) -> Option<&NodeId> {
        match role {
            AssignRole::Reservoir => self.reservoir.as_ref(),
            AssignRole::Well => self.well.as_ref(),
        }
    }

    fn cycle_choice(&mut self, role: AssignRole, forward: bool) {
        let list = self.engine.options(role);
        if list.is_empty() {
            return;
        }
        let len = list.len();
        let current = self.choice(role).and_then(|id| list.position(id)).unwrap_or(0);
        let next = if forward { (current + 1) % len } else { (current + len - 1) % len };
        let picked = list.get(next).map(|o| o.value.clone());
        match role {
            AssignRole::Reservoir => self.reservoir = picked,
            AssignRole::Well => self.well = picked,
        }
    }

    /// The form as it stands. Empty lists submit empty values and the hub
    /// answers with its own error text.
    fn assignment_request(&self) -> AssignmentRequest {
        match (&self.reservoir, &self.well) {
            (Some(reservoir), Some(well)) => AssignmentRequest::new(reservoir, well),
            (reservoir, well) => AssignmentRequest::from_fields([
                (
                    AssignRole::Reservoir.field_name(),
                    reservoir.as_ref().map_or("", NodeId::as_str),
                ),
                (
                    AssignRole::Well.field_name(),
                    well.as_ref().map_or("", NodeId::as_str),
                ),
            ]),
        }
    }

    fn open_rename(&mut self) {
        if let Some(row) = self.selected_row() {
            let id = row.rename_target().clone();
            debug!(%id, "rename prompt opened");
            self.rename = Some(RenamePrompt {
                id,
                input: Input::default(),
            });
        }
    }

    fn handle_rename_key(&mut self, key: KeyEvent) -> Option<Action> {
        let prompt = self.rename.as_mut()?;
        let request = match key.code {
            KeyCode::Esc => None,
            KeyCode::Enter => Some(prompt.input.value().to_owned()),
            code => {
                if let Some(req) = input_request(code) {
                    prompt.input.handle(req);
                }
                return None;
            }
        };

        let prompt = self.rename.take()?;
        match RenameRequest::from_input(prompt.id, request) {
            Ok(request) => Some(Action::SubmitRename(request)),
            Err(e) => {
                debug!(error = %e, "rename aborted");
                None
            }
        }
    }

    // ── Rendering ──────────────────────────────────────────────────────

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let title = format!(" Nodes ({}) ", self.engine.rows().len());
        let block = Block::default()
            .title(title)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focus == Focus::Nodes {
                theme::border_focused()
            } else {
                theme::border_default()
            });

        let header = Row::new(
            ["Name", "ID", "Type", "Status", "RSSI", "Last seen"]
                .map(|h| Cell::from(h).style(theme::table_header())),
        );

        let rows: Vec<Row> = self
            .engine
            .rows()
            .iter()
            .map(|row| {
                Row::new(vec![
                    Cell::from(name_span(&row.name)),
                    Cell::from(row.id.to_string()),
                    Cell::from(row.device_type.to_string()),
                    Cell::from(status_indicator::status_span(row.health, &row.status)),
                    Cell::from(Line::from(vec![
                        signal_bars::signal_span(row.rssi),
                        Span::raw(format!(" {}", row.rssi)),
                    ])),
                    Cell::from(row.last_seen.clone()),
                ])
                .style(theme::table_row())
            })
            .collect();

        let widths = [
            Constraint::Min(16),
            Constraint::Length(14),
            Constraint::Length(14),
            Constraint::Length(16),
            Constraint::Length(10),
            Constraint::Length(9),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(theme::table_selected())
            .highlight_symbol("▸ ");

        let mut state = self.table_state;
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect) {
        let line = match self.selected_row() {
            Some(row) => {
                let link = row.assigned_to.as_deref().unwrap_or("none");
                Line::from(vec![
                    Span::styled(" ", theme::key_hint()),
                    Span::styled(row.id.to_string(), theme::key_hint_key()),
                    Span::styled("  assigned to ", theme::key_hint()),
                    Span::styled(link.to_owned(), theme::table_row()),
                ])
            }
            None => Line::from(Span::styled(" waiting for hub data…", theme::key_hint())),
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_form(&self, frame: &mut Frame, area: Rect) {
        let focused = matches!(self.focus, Focus::Reservoir | Focus::Well);
        let block = Block::default()
            .title(" Assign well → reservoir ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut selectors = vec![Span::raw(" ")];
        selectors.extend(self.selector_spans(AssignRole::Reservoir, Focus::Reservoir));
        selectors.push(Span::raw("    "));
        selectors.extend(self.selector_spans(AssignRole::Well, Focus::Well));
        selectors.push(Span::styled("    s ", theme::key_hint_key()));
        selectors.push(Span::styled("assign", theme::key_hint()));

        let lines = vec![
            Line::from(selectors),
            Line::from(Span::styled(format!(" {}", self.banner.text()), theme::banner())),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn selector_spans(&self, role: AssignRole, focus: Focus) -> Vec<Span<'static>> {
        let list = self.engine.options(role);
        let label = self
            .choice(role)
            .and_then(|id| list.position(id))
            .and_then(|i| list.get(i))
            .map_or_else(|| "(none)".to_owned(), |o| o.label.clone());
        let value_style = if self.focus == focus {
            theme::table_selected()
        } else {
            theme::table_row()
        };
        vec![
            Span::styled(format!("{role} "), theme::key_hint()),
            Span::styled("◀ ", theme::key_hint()),
            Span::styled(label, value_style),
            Span::styled(" ▶", theme::key_hint()),
        ]
    }

    fn render_hints(frame: &mut Frame, area: Rect) {
        let hints = Line::from(vec![
            Span::styled("  j/k ", theme::key_hint_key()),
            Span::styled("navigate  ", theme::key_hint()),
            Span::styled("e ", theme::key_hint_key()),
            Span::styled("rename  ", theme::key_hint()),
            Span::styled("Tab ", theme::key_hint_key()),
            Span::styled("focus  ", theme::key_hint()),
            Span::styled("h/l ", theme::key_hint_key()),
            Span::styled("choose  ", theme::key_hint()),
            Span::styled("s ", theme::key_hint_key()),
            Span::styled("assign", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), area);
    }

    fn render_rename(frame: &mut Frame, area: Rect, prompt: &RenamePrompt) {
        let popup = centered(area, 50, 3);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(format!(" New name for {} ", prompt.id))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let width = usize::from(inner.width.max(1));
        let scroll = prompt.input.visual_scroll(width);
        let field = Paragraph::new(prompt.input.value())
            .style(theme::table_row())
            .scroll((0, to_u16(scroll)));
        frame.render_widget(field, inner);

        let cursor = prompt.input.visual_cursor().saturating_sub(scroll);
        frame.set_cursor_position((inner.x.saturating_add(to_u16(cursor)), inner.y));
    }

    fn render_alert(frame: &mut Frame, area: Rect, message: &str) {
        let popup = centered(area, 44, 5);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(" Error ")
            .title_style(theme::alert_border())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::alert_border())
            .style(Style::default().bg(theme::BG_DARK));
        let lines = vec![
            Line::from(message.to_owned()),
            Line::from(""),
            Line::from(Span::styled("Enter to dismiss", theme::key_hint())),
        ];
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
            popup,
        );
    }
}

impl Component for DashboardScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.alert.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.alert = None;
            }
            return Ok(None);
        }

        if self.rename.is_some() {
            return Ok(self.handle_rename_key(key));
        }

        let action = match (self.focus, key.code) {
            (_, KeyCode::Tab) => {
                self.focus = self.focus.next();
                None
            }
            (_, KeyCode::Char('s')) => Some(Action::SubmitAssignment(self.assignment_request())),

            (Focus::Nodes, KeyCode::Char('j') | KeyCode::Down) => {
                self.move_selection(1);
                None
            }
            (Focus::Nodes, KeyCode::Char('k') | KeyCode::Up) => {
                self.move_selection(-1);
                None
            }
            (Focus::Nodes, KeyCode::Char('e') | KeyCode::Enter) => {
                self.open_rename();
                None
            }

            (Focus::Reservoir, KeyCode::Char('l') | KeyCode::Right) => {
                self.cycle_choice(AssignRole::Reservoir, true);
                None
            }
            (Focus::Reservoir, KeyCode::Char('h') | KeyCode::Left) => {
                self.cycle_choice(AssignRole::Reservoir, false);
                None
            }
            (Focus::Well, KeyCode::Char('l') | KeyCode::Right) => {
                self.cycle_choice(AssignRole::Well, true);
                None
            }
            (Focus::Well, KeyCode::Char('h') | KeyCode::Left) => {
                self.cycle_choice(AssignRole::Well, false);
                None
            }
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SnapshotReceived(snapshot) => self.apply_snapshot(snapshot),
            Action::Tick => {
                self.banner.expire(Instant::now());
            }
            Action::AssignmentFinished(outcome) => {
                outcome.show_on(&mut self.banner, Instant::now());
            }
            Action::RenameSucceeded(request) => {
                request.apply_to(&mut self.engine);
            }
            Action::RenameFailed(RenameError::Rejected { .. }) => {
                self.alert = Some(RENAME_REJECTED.to_owned());
            }
            // Declined never reaches the hub; transport failures are logged
            // by the controller and left to the next refresh.
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(area);

        self.render_table(frame, layout[0]);
        self.render_detail(frame, layout[1]);
        self.render_form(frame, layout[2]);
        Self::render_hints(frame, layout[3]);

        if let Some(prompt) = &self.rename {
            Self::render_rename(frame, area, prompt);
        }
        if let Some(message) = &self.alert {
            Self::render_alert(frame, area, message);
        }
    }

    fn captures_input(&self) -> bool {
        self.rename.is_some() || self.alert.is_some()
    }
}

/// Keep `current` if it is still offered, else fall back to the first option.
fn keep_choice(list: &SelectList, current: Option<NodeId>) -> Option<NodeId> {
    current
        .filter(|id| list.position(id).is_some())
        .or_else(|| list.get(0).map(|o| o.value.clone()))
}

fn name_span(name: &NameCell) -> Span<'_> {
    let style = if name.is_placeholder() {
        theme::name_placeholder()
    } else {
        theme::node_name()
    };
    Span::styled(name.text(), style)
}

fn input_request(code: KeyCode) -> Option<InputRequest> {
    let req = match code {
        KeyCode::Char(c) => InputRequest::InsertChar(c),
        KeyCode::Backspace => InputRequest::DeletePrevChar,
        KeyCode::Delete => InputRequest::DeleteNextChar,
        KeyCode::Left => InputRequest::GoToPrevChar,
        KeyCode::Right => InputRequest::GoToNextChar,
        KeyCode::Home => InputRequest::GoToStart,
        KeyCode::End => InputRequest::GoToEnd,
        _ => return None,
    };
    Some(req)
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

fn to_u16(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}
