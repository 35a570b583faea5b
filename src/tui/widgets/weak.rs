use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::{confidence_color, truncate};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Weak Concepts ")
        .title_style(Style::default().fg(Color::Cyan));

    if app.weak.items.is_empty() {
        let paragraph = Paragraph::new("Nothing below the weakness threshold.")
            .style(Style::default().fg(Color::Green))
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .weak
        .items
        .iter()
        .map(|weak| {
            let confidence = weak.concept.confidence;
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<28}", truncate(&weak.concept.name, 26)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:>5.2}  ", weak.priority),
                    Style::default().fg(Color::Magenta),
                ),
                Span::styled(
                    format!("{:>3.0}%  ", confidence * 100.0),
                    Style::default().fg(confidence_color(confidence)),
                ),
                Span::styled(
                    weak.recommendation.message(),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect();

    let header_style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::BOLD);
    let header = Line::from(vec![
        Span::styled(format!("  {:<28}", "Concept"), header_style),
        Span::styled("Prio.  ", header_style),
        Span::styled("Conf.  ", header_style),
        Span::styled("Recommendation", header_style),
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
    state.select(app.weak.selected);

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
