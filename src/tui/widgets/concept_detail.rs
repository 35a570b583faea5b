use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::{confidence_bar, confidence_color, format_date, truncate};
use crate::models::ReviewTargetType;
use crate::service::ConceptView;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some(view) = &app.selected_concept else {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Concept ");
        let paragraph = Paragraph::new("No concept selected").block(block);
        f.render_widget(paragraph, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),      // Header + confidence
            Constraint::Percentage(50), // Flashcards
            Constraint::Min(0),         // Review history
        ])
        .split(area);

    draw_header(f, view, chunks[0]);
    draw_flashcards(f, app, chunks[1]);
    draw_history(f, app, chunks[2]);
}

fn draw_header(f: &mut Frame, view: &ConceptView, area: Rect) {
    let concept = &view.concept;
    let description = concept.description.as_deref().unwrap_or("No description");

    let text = vec![
        Line::from(vec![
            Span::styled("Description: ", Style::default().fg(Color::Gray)),
            Span::styled(description, Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled("Confidence: ", Style::default().fg(Color::Gray)),
            Span::styled(
                confidence_bar(view.current_confidence),
                Style::default().fg(confidence_color(view.current_confidence)),
            ),
            Span::styled(
                format!(
                    " {:.1}% now, {:.1}% at last review",
                    view.current_confidence * 100.0,
                    concept.confidence * 100.0
                ),
                Style::default().fg(Color::Yellow),
            ),
        ]),
        Line::from(vec![
            Span::styled("Last reviewed: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format_date(concept.last_reviewed_at),
                Style::default().fg(Color::White),
            ),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", concept.name))
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_flashcards(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .selected_cards
        .iter()
        .map(|card| {
            let next = match card.next_review_at() {
                Some(at) => format!("next {}", at.format("%b %d")),
                None => "new".to_string(),
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("[{}] ", card.leitner_box),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(
                    format!("{:<50}", truncate(&card.front, 48)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(next, Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Flashcards ({}) ", app.selected_cards.len()))
        .title_style(Style::default().fg(Color::Cyan));

    if items.is_empty() {
        let paragraph = Paragraph::new("No flashcards for this concept.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(paragraph, area);
    } else {
        f.render_widget(List::new(items).block(block), area);
    }
}

fn draw_history(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .selected_history
        .iter()
        .take(20)
        .map(|event| {
            let kind = match event.target_type {
                ReviewTargetType::Flashcard => "Card",
                ReviewTargetType::Quiz => "Quiz",
            };
            let outcome_color = if event.outcome >= 0.5 {
                Color::Green
            } else {
                Color::Red
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<14}", event.timestamp.format("%b %d %H:%M")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(format!("{:<6}", kind), Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!("{:>4.0}%", event.outcome * 100.0),
                    Style::default().fg(outcome_color),
                ),
                Span::styled(
                    format!("  {:.1}s", f64::from(event.response_time_ms) / 1000.0),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Review History ({}) ", app.selected_history.len()))
        .title_style(Style::default().fg(Color::Magenta));

    if items.is_empty() {
        let paragraph = Paragraph::new("Not reviewed yet.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(paragraph, area);
    } else {
        f.render_widget(List::new(items).block(block), area);
    }
}
