use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::{confidence_bar, confidence_color, format_date, truncate};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .concepts
        .items
        .iter()
        .map(|view| {
            let concept = &view.concept;
            let current = view.current_confidence;
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<30}", truncate(&concept.name, 28)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    confidence_bar(current),
                    Style::default().fg(confidence_color(current)),
                ),
                Span::styled(
                    format!(" {:>3.0}%", current * 100.0),
                    Style::default().fg(Color::Yellow),
                ),
                Span::styled(
                    format!(" {:>3.0}%   ", concept.confidence * 100.0),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format_date(concept.last_reviewed_at),
                    Style::default().fg(Color::White),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Concepts ({}) ", app.concepts.items.len()))
        .title_style(Style::default().fg(Color::Cyan));

    let header_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::BOLD);
    let header = Line::from(vec![
        Span::styled(format!("  {:<30}", "Name"), header_style),
        Span::styled(format!("{:<10}", "Now"), header_style),
        Span::styled(" Now  Stored   ", header_style),
        Span::styled("Reviewed", header_style),
    ]);

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.concepts.selected);

    let header_area = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: 1,
    };
    f.render_widget(Paragraph::new(header), header_area);

    let list_area = Rect {
        x: area.x,
        y: area.y + 1,
        width: area.width,
        height: area.height.saturating_sub(1),
    };

    f.render_stateful_widget(list, list_area, &mut state);
}
