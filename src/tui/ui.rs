use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::widgets::{concept_detail, concepts, dashboard, due, weak};
use super::{App, View};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Help bar
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_help_bar(f, app, chunks[2]);
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let tab_titles = vec!["Dashboard", "Concepts", "Weak", "Due"];
    let selected = match app.view {
        View::Dashboard => 0,
        View::Concepts | View::ConceptDetail => 1,
        View::Weak => 2,
        View::Due => 3,
    };

    let tabs = Tabs::new(tab_titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Mastery: {} ", app.hive.name)),
        )
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

fn draw_content(f: &mut Frame, app: &App, area: Rect) {
    match app.view {
        View::Dashboard => dashboard::draw(f, app, area),
        View::Concepts => concepts::draw(f, app, area),
        View::ConceptDetail => concept_detail::draw(f, app, area),
        View::Weak => weak::draw(f, app, area),
        View::Due => due::draw(f, app, area),
    }
}

fn key(k: &str) -> Span<'_> {
    Span::styled(k, Style::default().fg(Color::Cyan))
}

fn draw_help_bar(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![key("h/l"), Span::raw(" Views  ")];

    match app.view {
        View::Dashboard => {
            spans.extend(vec![key("^r"), Span::raw(" Refresh  ")]);
        }
        View::Concepts | View::Weak => {
            spans.extend(vec![
                key("j/k"),
                Span::raw(" Nav  "),
                key("g/G"),
                Span::raw(" Top/Bot  "),
                key("l/<CR>"),
                Span::raw(" Open  "),
            ]);
        }
        View::ConceptDetail => {
            spans.extend(vec![
                key("h/<Esc>"),
                Span::raw(" Back  "),
                key("^r"),
                Span::raw(" Refresh  "),
            ]);
        }
        View::Due => {
            spans.extend(vec![key("j/k"), Span::raw(" Nav  "), key("<Space>"), Span::raw(" Flip  ")]);
            if app.show_answer {
                spans.extend(vec![key("0-4"), Span::raw(" Grade  ")]);
            }
        }
    }

    spans.extend(vec![key("q"), Span::raw(" Quit")]);

    let help = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    f.render_widget(help, area);
}
