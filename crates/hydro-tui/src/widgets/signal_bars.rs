//! Radio signal strength bars: ▂▄▆█ with colour thresholds.

use ratatui::style::Style;
use ratatui::text::Span;

use crate::theme;

/// Bars for an RSSI reading in dBm.
///
/// | Bars    | dBm         | Colour        |
/// |---------|-------------|---------------|
/// | `▂▄▆█`  | >= -60      | Success Green |
/// | `▂▄▆ `  | -60 to -75  | Aqua          |
/// | `▂▄  `  | -75 to -90  | Sand          |
/// | `▂   `  | -90 to -105 | Coral         |
/// | `·   `  | < -105      | Error Red     |
///
/// Thresholds suit LoRa links, which stay usable far below Wi-Fi levels.
pub fn signal_span(dbm: i32) -> Span<'static> {
    let (bars, color) = bars_for(dbm);
    Span::styled(bars, Style::default().fg(color))
}

fn bars_for(dbm: i32) -> (&'static str, ratatui::style::Color) {
    if dbm >= -60 {
        ("▂▄▆█", theme::SUCCESS_GREEN)
    } else if dbm >= -75 {
        ("▂▄▆ ", theme::AQUA)
    } else if dbm >= -90 {
        ("▂▄  ", theme::SAND)
    } else if dbm >= -105 {
        ("▂   ", theme::CORAL)
    } else {
        ("·   ", theme::ERROR_RED)
    }
}
