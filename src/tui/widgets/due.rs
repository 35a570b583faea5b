use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::{format_date, truncate};
use crate::models::{ConfidenceLevel, Flashcard};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    draw_queue(f, app, chunks[0]);
    draw_card(f, app, chunks[1]);
}

fn draw_queue(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Due Cards ({}) ", app.due.items.len()))
        .title_style(Style::default().fg(Color::Yellow));

    if app.due.items.is_empty() {
        let paragraph = Paragraph::new("All caught up.")
            .style(Style::default().fg(Color::Green))
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = app
        .due
        .items
        .iter()
        .map(|card| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("[{}] ", card.leitner_box),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(
                    truncate(&card.front, 36),
                    Style::default().fg(Color::White),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.due.selected);
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_card(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Card ")
        .title_style(Style::default().fg(Color::Cyan));

    let Some(card) = app.due.selected_item() else {
        f.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let paragraph = Paragraph::new(card_text(app, card))
        .block(block)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn card_text<'a>(app: &'a App, card: &'a Flashcard) -> Vec<Line<'a>> {
    let concept = app.concept_name(card.concept_id).unwrap_or("?");
    let mut text = vec![
        Line::from(vec![
            Span::styled("Concept: ", Style::default().fg(Color::Gray)),
            Span::styled(concept, Style::default().fg(Color::Yellow)),
            Span::styled("   Last seen: ", Style::default().fg(Color::Gray)),
            Span::styled(format_date(card.last_seen_at), Style::default().fg(Color::White)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            card.front.as_str(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    if app.show_answer {
        text.push(Line::from(Span::styled(
            card.back.as_str(),
            Style::default().fg(Color::Green),
        )));
        text.push(Line::from(""));
        for level in ConfidenceLevel::ALL {
            text.push(Line::from(vec![
                Span::styled(
                    format!(" {} ", level.as_i32()),
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(level.label()),
            ]));
        }
    } else {
        text.push(Line::from(Span::styled(
            "<Space> to reveal the answer",
            Style::default().fg(Color::DarkGray),
        )));
    }

    if let Some(status) = &app.status {
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(
            status.as_str(),
            Style::default().fg(Color::Magenta),
        )));
    }

    text
}
