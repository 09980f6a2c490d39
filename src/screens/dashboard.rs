/// Main dashboard screen

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::core::state::Phase;
use crate::core::{DashboardState, MetricKind};
use crate::widgets::{percent_gauge, render_history};

const GAUGE_WIDTH: u16 = 28;

pub struct Dashboard {
    title: String,
    source: String,
}

impl Dashboard {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            title: format!("nodewatch v{}", env!("CARGO_PKG_VERSION")),
            source: source.into(),
        }
    }

    pub fn render(&self, frame: &mut Frame, state: &DashboardState) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(3), // Instance selector
                Constraint::Min(0),    // Panels
                Constraint::Length(3), // Footer
            ])
            .split(frame.size());

        let title = Paragraph::new(Line::from(vec![
            Span::styled(
                &self.title,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(&self.source, Style::default().fg(Color::DarkGray)),
        ]))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, chunks[0]);

        frame.render_widget(self.render_selector(state), chunks[1]);

        if state.phase() == Phase::Loading {
            self.render_message(frame, chunks[2], "Loading instances...", Color::Gray);
        } else if !state.is_global() && state.instances().is_empty() {
            let message = if state.last_error().is_some() {
                "Could not load instances"
            } else {
                "No instances found"
            };
            self.render_message(frame, chunks[2], message, Color::Yellow);
        } else {
            self.render_panels(frame, chunks[2], state);
        }

        frame.render_widget(self.render_footer(state), chunks[3]);
    }

    /// Instance tab bar, or the unscoped marker in global mode
    fn render_selector(&self, state: &DashboardState) -> Paragraph<'_> {
        let mut spans = vec![Span::styled(" Instance: ", Style::default().fg(Color::Gray))];

        if state.is_global() {
            spans.push(Span::styled(
                " all instances ",
                Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
            ));
        } else if state.instances().is_empty() {
            spans.push(Span::styled("-", Style::default().fg(Color::DarkGray)));
        } else {
            for instance in state.instances() {
                let style = if state.selected() == Some(instance.as_str()) {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                spans.push(Span::styled(format!(" {} ", instance), style));
                spans.push(Span::raw(" "));
            }
        }

        Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL))
    }

    fn render_panels(&self, frame: &mut Frame, area: Rect, state: &DashboardState) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ])
            .split(area);

        for (kind, row) in MetricKind::all().iter().zip(rows.iter()) {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(GAUGE_WIDTH), Constraint::Min(0)])
                .split(*row);

            let caption = format!("{} ({})", kind.title(), kind.gauge_caption());
            frame.render_widget(percent_gauge(state.current(*kind), &caption), columns[0]);
            render_history(frame, columns[1], kind.title(), state.window(*kind), *kind);
        }
    }

    fn render_message(&self, frame: &mut Frame, area: Rect, message: &str, color: Color) {
        let paragraph = Paragraph::new(message)
            .alignment(Alignment::Center)
            .style(Style::default().fg(color))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn render_footer(&self, state: &DashboardState) -> Paragraph<'_> {
        let help = if state.is_global() {
            "[q]uit"
        } else {
            "[← →] Instance | [r]eload instances | [q]uit"
        };

        let mut spans = vec![Span::raw(help)];
        if let Some(t) = state.last_update() {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(format!("Updated {}", t), Style::default().fg(Color::Gray)));
        }
        if let Some(error) = state.last_error() {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(
                format!("Error: {}", error),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));
        }

        Paragraph::new(Line::from(spans))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL))
    }
}
