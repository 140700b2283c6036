//! Node status indicator: ●/◐/○ coloured by health class.

use ratatui::style::Style;
use ratatui::text::Span;

use hydro_core::NodeStatus;

use crate::theme;

/// Dot followed by the raw status text reported by the hub.
pub fn status_span(health: NodeStatus, status: &str) -> Span<'static> {
    let (symbol, color) = match health {
        NodeStatus::Online => ("●", theme::SUCCESS_GREEN),
        NodeStatus::Pending => ("◐", theme::SAND),
        NodeStatus::Offline => ("○", theme::ERROR_RED),
    };
    Span::styled(format!("{symbol} {status}"), Style::default().fg(color))
}
