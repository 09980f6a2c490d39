/// Reusable dashboard widgets built on ratatui primitives

pub mod chart;
pub mod gauge;

pub use chart::{line_series, render_history, LineSeries};
pub use gauge::{clamp_percent, percent_gauge, percent_label};
