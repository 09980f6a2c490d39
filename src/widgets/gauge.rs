/// Percentage gauge used by every metric panel

use ratatui::{
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Gauge},
};

use crate::utils::{CRITICAL_THRESHOLD, WARN_THRESHOLD};

/// Clamp to [0, 100]; NaN reads as 0
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Gauge label, one decimal place
pub fn percent_label(value: f64) -> String {
    format!("{:.1}%", clamp_percent(value))
}

pub fn level_color(value: f64) -> Color {
    let value = clamp_percent(value);
    if value > CRITICAL_THRESHOLD {
        Color::Red
    } else if value > WARN_THRESHOLD {
        Color::Yellow
    } else {
        Color::Green
    }
}

pub fn percent_gauge(value: f64, caption: &str) -> Gauge<'static> {
    let value = clamp_percent(value);

    Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(caption.to_string()),
        )
        .gauge_style(Style::default().fg(level_color(value)).bg(Color::DarkGray))
        .ratio(value / 100.0)
        .label(Span::styled(
            percent_label(value),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ))
}
