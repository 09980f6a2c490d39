/// Rolling-history line charts
///
/// X is the sample position inside the window, Y is a percentage. CPU windows
/// produce one series per core; memory and disk produce a single series.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::core::snapshot::{MetricSample, CORE_PREFIX, VALUE_FIELD};
use crate::core::{MetricKind, RollingWindow};

const PALETTE: [Color; 8] = [
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Green,
    Color::LightBlue,
    Color::LightRed,
    Color::LightGreen,
    Color::LightMagenta,
];

#[derive(Debug, Clone, PartialEq)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

/// Numeric order for core fields so core10 sorts after core9
fn core_index(field: &str) -> u64 {
    field
        .strip_prefix(CORE_PREFIX)
        .and_then(|n| n.parse().ok())
        .unwrap_or(u64::MAX)
}

/// Build the plotted series for a window.
/// A core missing from a sample leaves a gap at that position.
pub fn line_series(window: &RollingWindow<MetricSample>, kind: MetricKind) -> Vec<LineSeries> {
    let mut fields: Vec<String> = match kind {
        MetricKind::Cpu => window
            .iter()
            .flat_map(|s| s.cores().map(|(name, _)| name.to_string()))
            .collect(),
        _ => vec![VALUE_FIELD.to_string()],
    };
    fields.sort_by(|a, b| core_index(a).cmp(&core_index(b)).then_with(|| a.cmp(b)));
    fields.dedup();

    fields
        .into_iter()
        .map(|name| {
            let points = window
                .iter()
                .enumerate()
                .filter_map(|(i, sample)| sample.fields.get(&name).map(|v| (i as f64, *v)))
                .collect();
            LineSeries { name, points }
        })
        .collect()
}

/// First, middle and last timestamps of the window
pub fn axis_labels(window: &RollingWindow<MetricSample>) -> Vec<String> {
    let len = window.len();
    if len == 0 {
        return Vec::new();
    }

    let mut indices = vec![0, len / 2, len - 1];
    indices.dedup();
    indices
        .into_iter()
        .filter_map(|i| window.get(i).map(|s| s.t.clone()))
        .collect()
}

pub fn render_history(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    window: &RollingWindow<MetricSample>,
    kind: MetricKind,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", title));

    if window.is_empty() {
        let waiting = Paragraph::new("Waiting for data...")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(waiting, area);
        return;
    }

    let series = line_series(window, kind);
    let datasets: Vec<Dataset> = series
        .iter()
        .enumerate()
        .map(|(i, s)| {
            Dataset::default()
                .name(s.name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(PALETTE[i % PALETTE.len()]))
                .data(&s.points)
        })
        .collect();

    let x_max = window.len().saturating_sub(1).max(1) as f64;
    let x_labels: Vec<Span> = axis_labels(window).into_iter().map(Span::raw).collect();
    let y_labels = vec![Span::raw("0"), Span::raw("50"), Span::raw("100")];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title(Span::styled("%", Style::default().add_modifier(Modifier::BOLD)))
                .style(Style::default().fg(Color::Gray))
                .bounds([0.0, 100.0])
                .labels(y_labels),
        );

    frame.render_widget(chart, area);
}
