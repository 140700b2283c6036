//! Colour palette and semantic styles.

use ratatui::style::{Color, Modifier, Style};

// ── Core Palette ──────────────────────────────────────────────────────

pub const AQUA: Color = Color::Rgb(94, 234, 212); // #5eead4
pub const DEEP_BLUE: Color = Color::Rgb(56, 132, 255); // #3884ff
pub const SAND: Color = Color::Rgb(250, 204, 21); // #facc15
pub const CORAL: Color = Color::Rgb(255, 106, 193); // #ff6ac1
pub const SUCCESS_GREEN: Color = Color::Rgb(80, 250, 123); // #50fa7b
pub const ERROR_RED: Color = Color::Rgb(255, 99, 99); // #ff6363

// ── Neutrals ──────────────────────────────────────────────────────────

pub const DIM_WHITE: Color = Color::Rgb(189, 193, 207); // #bdc1cf
pub const SLATE: Color = Color::Rgb(98, 114, 164); // #6272a4
pub const BG_HIGHLIGHT: Color = Color::Rgb(28, 42, 58); // #1c2a3a
pub const BG_DARK: Color = Color::Rgb(15, 23, 33); // #0f1721

// ── Semantic Styles ───────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(AQUA).add_modifier(Modifier::BOLD)
}

pub fn border_focused() -> Style {
    Style::default().fg(DEEP_BLUE)
}

pub fn border_default() -> Style {
    Style::default().fg(SLATE)
}

pub fn table_header() -> Style {
    Style::default()
        .fg(AQUA)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

pub fn table_row() -> Style {
    Style::default().fg(DIM_WHITE)
}

pub fn table_selected() -> Style {
    Style::default()
        .fg(AQUA)
        .bg(BG_HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

/// Operator-assigned node name.
pub fn node_name() -> Style {
    Style::default().fg(DIM_WHITE).add_modifier(Modifier::BOLD)
}

/// Placeholder shown for unnamed nodes; must never look like a real name.
pub fn name_placeholder() -> Style {
    Style::default().fg(SLATE).add_modifier(Modifier::ITALIC)
}

pub fn key_hint() -> Style {
    Style::default().fg(SLATE)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(AQUA).add_modifier(Modifier::BOLD)
}

pub fn banner() -> Style {
    Style::default().fg(SAND)
}

pub fn alert_border() -> Style {
    Style::default().fg(ERROR_RED).add_modifier(Modifier::BOLD)
}
