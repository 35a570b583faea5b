use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::{confidence_bar, confidence_color, truncate};
use crate::dashboard::MasteryBand;
use crate::tui::App;

const BANDS: [MasteryBand; 4] = [
    MasteryBand::Beginner,
    MasteryBand::Learning,
    MasteryBand::Proficient,
    MasteryBand::Mastered,
];

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // Stats + histogram row
            Constraint::Min(0),    // Weakest concepts
        ])
        .split(area);

    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[0]);

    draw_stats(f, app, top_chunks[0]);
    draw_distribution(f, app, top_chunks[1]);
    draw_weakest(f, app, chunks[1]);
}

fn draw_stats(f: &mut Frame, app: &App, area: Rect) {
    let overview = &app.overview;
    let average = match overview.summary.average_confidence {
        Some(avg) => format!("{:.0}%", avg * 100.0),
        None => "-".to_string(),
    };

    let text = vec![
        Line::from(vec![
            Span::styled("Concepts: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", overview.summary.total_concepts),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Avg confidence: ", Style::default().fg(Color::Gray)),
            Span::styled(average, Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::styled("Due cards: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", overview.due_flashcards),
                Style::default().fg(if overview.due_flashcards > 0 {
                    Color::Yellow
                } else {
                    Color::White
                }),
            ),
        ]),
        Line::from(vec![
            Span::styled("Reviews (7d): ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", overview.recent_reviews),
                Style::default().fg(Color::White),
            ),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", app.hive.name))
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_distribution(f: &mut Frame, app: &App, area: Rect) {
    let distribution = &app.overview.summary.distribution;
    let data: Vec<(&str, u64)> = BANDS
        .iter()
        .map(|band| (band.label(), distribution.count(*band) as u64))
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Mastery ")
                .title_style(Style::default().fg(Color::Green)),
        )
        .data(data.as_slice())
        .bar_width(10)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Green))
        .value_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(chart, area);
}

fn draw_weakest(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .overview
        .weakest
        .iter()
        .enumerate()
        .map(|(i, concept)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    format!("{:<30}", truncate(&concept.name, 28)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    confidence_bar(concept.confidence),
                    Style::default().fg(confidence_color(concept.confidence)),
                ),
                Span::styled(
                    format!(" {:>3.0}%", concept.confidence * 100.0),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Weakest Concepts ")
        .title_style(Style::default().fg(Color::Yellow));

    if items.is_empty() {
        let paragraph = Paragraph::new("No concepts yet. Add some with `mastery concept add`.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(paragraph, area);
    } else {
        f.render_widget(List::new(items).block(block), area);
    }
}
