mod ui;
mod widgets;

use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::debug;
use uuid::Uuid;

use crate::dashboard::DashboardOverview;
use crate::db::Database;
use crate::error::Result;
use crate::models::{ConfidenceLevel, Flashcard, Hive, ReviewEvent};
use crate::prioritizer::WeakConcept;
use crate::service::{ConceptView, StudyService};

/// Due cards loaded into the review queue at once.
const DUE_QUEUE_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Concepts,
    ConceptDetail,
    Weak,
    Due,
}

impl View {
    fn next(&self) -> Self {
        match self {
            View::Dashboard => View::Concepts,
            View::Concepts => View::Weak,
            View::ConceptDetail => View::Concepts,
            View::Weak => View::Due,
            View::Due => View::Dashboard,
        }
    }

    fn prev(&self) -> Self {
        match self {
            View::Dashboard => View::Due,
            View::Concepts => View::Dashboard,
            View::ConceptDetail => View::Concepts,
            View::Weak => View::Concepts,
            View::Due => View::Weak,
        }
    }
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(i);
    }

    fn first(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(0);
        }
    }

    fn last(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(self.items.len() - 1);
        }
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

pub struct App {
    service: StudyService<Database>,
    pub hive: Hive,
    pub view: View,
    pub overview: DashboardOverview,
    pub concepts: StatefulList<ConceptView>,
    pub selected_concept: Option<ConceptView>,
    pub selected_cards: Vec<Flashcard>,
    pub selected_history: Vec<ReviewEvent>,
    pub weak: StatefulList<WeakConcept>,
    pub due: StatefulList<Flashcard>,
    pub show_answer: bool,
    card_shown_at: Instant,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(service: StudyService<Database>, hive_id: Uuid) -> Result<Self> {
        let hive = service.open_hive(hive_id)?;
        let overview = service.dashboard(hive_id)?;
        let concepts = service.concepts(hive_id)?;
        let weak = service.weak_concepts(hive_id)?;
        let due = service.next_review_items(Some(hive_id), true, DUE_QUEUE_LIMIT)?;

        Ok(Self {
            service,
            hive,
            view: View::Dashboard,
            overview,
            concepts: StatefulList::with_items(concepts),
            selected_concept: None,
            selected_cards: Vec::new(),
            selected_history: Vec::new(),
            weak: StatefulList::with_items(weak),
            due: StatefulList::with_items(due),
            show_answer: false,
            card_shown_at: Instant::now(),
            status: None,
            should_quit: false,
        })
    }

    pub fn concept_name(&self, concept_id: Uuid) -> Option<&str> {
        self.concepts
            .items
            .iter()
            .find(|v| v.concept.id == concept_id)
            .map(|v| v.concept.name.as_str())
    }

    pub fn refresh_data(&mut self) -> Result<()> {
        let hive_id = self.hive.id;
        self.overview = self.service.dashboard(hive_id)?;
        self.concepts = StatefulList::with_items(self.service.concepts(hive_id)?);
        self.weak = StatefulList::with_items(self.service.weak_concepts(hive_id)?);
        self.due = StatefulList::with_items(self.service.next_review_items(
            Some(hive_id),
            true,
            DUE_QUEUE_LIMIT,
        )?);
        if let Some(selected) = &self.selected_concept {
            let id = selected.concept.id;
            self.load_concept(id)?;
        }
        self.reset_card();
        Ok(())
    }

    fn load_concept(&mut self, concept_id: Uuid) -> Result<()> {
        self.selected_concept = Some(self.service.concept_view(concept_id)?);
        self.selected_cards = self.service.flashcards_for_concept(concept_id)?;
        self.selected_history = self.service.review_history(concept_id)?;
        Ok(())
    }

    fn select_concept(&mut self) -> Result<()> {
        let concept_id = match self.view {
            View::Concepts => self.concepts.selected_item().map(|v| v.concept.id),
            View::Weak => self.weak.selected_item().map(|w| w.concept.id),
            _ => None,
        };
        if let Some(id) = concept_id {
            self.load_concept(id)?;
            self.view = View::ConceptDetail;
        }
        Ok(())
    }

    fn reset_card(&mut self) {
        self.show_answer = false;
        self.card_shown_at = Instant::now();
    }

    fn grade_selected(&mut self, level: ConfidenceLevel) -> Result<()> {
        let Some(card) = self.due.selected_item() else {
            return Ok(());
        };
        let card_id = card.id;
        let elapsed = self.card_shown_at.elapsed().as_millis();
        let response_time_ms = u32::try_from(elapsed).unwrap_or(u32::MAX);

        let outcome = self
            .service
            .review_flashcard(card_id, level, response_time_ms)?;
        debug!(flashcard = %card_id, level = level.as_str(), "graded from dashboard");
        self.status = Some(format!(
            "{}: box {}, confidence {:.0}%",
            level.label(),
            outcome.flashcard.leitner_box,
            outcome.concept.confidence * 100.0
        ));
        self.refresh_data()
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> Result<()> {
        match key {
            KeyCode::Char('q') => self.should_quit = true,

            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.refresh_data()?;
                self.status = Some("Refreshed".to_string());
            }

            KeyCode::Esc => {
                if self.view == View::ConceptDetail {
                    self.view = View::Concepts;
                    self.selected_concept = None;
                } else {
                    self.status = None;
                }
            }

            KeyCode::Char('h') | KeyCode::Left => match self.view {
                View::ConceptDetail => {
                    self.view = View::Concepts;
                    self.selected_concept = None;
                }
                _ => self.view = self.view.prev(),
            },
            KeyCode::Char('l') | KeyCode::Right => match self.view {
                View::Concepts | View::Weak => self.select_concept()?,
                _ => self.view = self.view.next(),
            },

            KeyCode::Tab => self.view = self.view.next(),
            KeyCode::BackTab => self.view = self.view.prev(),

            KeyCode::Char('j') | KeyCode::Down => match self.view {
                View::Concepts => self.concepts.next(),
                View::Weak => self.weak.next(),
                View::Due => {
                    self.due.next();
                    self.reset_card();
                }
                _ => {}
            },
            KeyCode::Char('k') | KeyCode::Up => match self.view {
                View::Concepts => self.concepts.previous(),
                View::Weak => self.weak.previous(),
                View::Due => {
                    self.due.previous();
                    self.reset_card();
                }
                _ => {}
            },

            KeyCode::Char('g') => match self.view {
                View::Concepts => self.concepts.first(),
                View::Weak => self.weak.first(),
                View::Due => self.due.first(),
                _ => {}
            },
            KeyCode::Char('G') => match self.view {
                View::Concepts => self.concepts.last(),
                View::Weak => self.weak.last(),
                View::Due => self.due.last(),
                _ => {}
            },

            KeyCode::Enter => match self.view {
                View::Concepts | View::Weak => self.select_concept()?,
                _ => {}
            },

            KeyCode::Char(' ') if self.view == View::Due => {
                self.show_answer = !self.show_answer;
            }
            KeyCode::Char(c @ '0'..='4') if self.view == View::Due && self.show_answer => {
                let level = ConfidenceLevel::parse(&c.to_string())?;
                self.grade_selected(level)?;
            }

            _ => {}
        }
        Ok(())
    }
}

pub fn run(service: StudyService<Database>, hive_id: Uuid) -> Result<()> {
    // Build state before touching the terminal so lookup errors print normally
    let mut app = App::new(service, hive_id)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code, key.modifiers)?;
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
