//! Study use cases: load entities, run the pure algorithms, persist the results.
//!
//! Not-found and input validation errors are raised here; the engine, scheduler, prioritizer
//! and dashboard below this layer are total over their inputs.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::dashboard::{self, DashboardOverview};
use crate::engine::LearningEngine;
use crate::error::{MasteryError, Result};
use crate::models::{
    ConfidenceLevel, Concept, Flashcard, FlashcardEvidence, Hive, QuizEvidence, ReviewEvent,
    ReviewTargetType,
};
use crate::prioritizer::{WeakConcept, WeakConceptPrioritizer};
use crate::scheduler;
use crate::store::{Clock, Store, SystemClock};

/// How many of the weakest concepts the dashboard lists.
pub const DASHBOARD_WEAKEST: usize = 5;
/// Window for the dashboard's recent-review count.
pub const RECENT_REVIEW_DAYS: i64 = 7;

/// Result of grading one flashcard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewOutcome {
    pub concept: Concept,
    pub flashcard: Flashcard,
    pub event: ReviewEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizOutcome {
    pub concept: Concept,
    pub event: ReviewEvent,
}

/// One answered question in a quiz batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAnswer {
    pub question_id: String,
    pub was_correct: bool,
    #[serde(default)]
    pub response_time_ms: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizSubmissionSummary {
    pub total_questions: usize,
    pub correct_answers: usize,
    pub score_percentage: f64,
    pub total_time_ms: u64,
}

impl QuizSubmissionSummary {
    fn from_answers(answers: &[QuizAnswer]) -> Self {
        let total_questions = answers.len();
        let correct_answers = answers.iter().filter(|a| a.was_correct).count();
        let score_percentage = if total_questions == 0 {
            0.0
        } else {
            correct_answers as f64 / total_questions as f64 * 100.0
        };
        Self {
            total_questions,
            correct_answers,
            score_percentage,
            total_time_ms: answers.iter().map(|a| u64::from(a.response_time_ms)).sum(),
        }
    }
}

/// A concept with its stored confidence and the decayed value shown to the learner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConceptView {
    #[serde(flatten)]
    pub concept: Concept,
    pub current_confidence: f64,
}

pub struct StudyService<S, C = SystemClock> {
    store: S,
    engine: LearningEngine,
    prioritizer: WeakConceptPrioritizer,
    clock: C,
}

impl<S: Store, C: Clock> StudyService<S, C> {
    pub fn new(
        store: S,
        engine: LearningEngine,
        prioritizer: WeakConceptPrioritizer,
        clock: C,
    ) -> Self {
        Self {
            store,
            engine,
            prioritizer,
            clock,
        }
    }

    pub fn from_config(store: S, config: &Config, clock: C) -> Self {
        Self::new(
            store,
            LearningEngine::from_config(&config.engine),
            WeakConceptPrioritizer::new(config.priority.clone()),
            clock,
        )
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn engine(&self) -> &LearningEngine {
        &self.engine
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // Hive operations
    pub fn create_hive(&self, name: &str, description: Option<&str>) -> Result<Hive> {
        let hive = Hive::new(name, description, self.now())?;
        self.store.insert_hive(&hive)?;
        info!(hive = %hive.id, name = %hive.name, "created hive");
        Ok(hive)
    }

    pub fn list_hives(&self) -> Result<Vec<Hive>> {
        self.store.list_hives()
    }

    pub fn hive(&self, id: Uuid) -> Result<Hive> {
        self.store
            .get_hive(id)?
            .ok_or_else(|| MasteryError::not_found("Hive", id))
    }

    /// Loads a hive and records the access.
    pub fn open_hive(&self, id: Uuid) -> Result<Hive> {
        let mut hive = self.hive(id)?;
        hive.last_accessed_at = self.now();
        self.store.touch_hive(id, hive.last_accessed_at)?;
        Ok(hive)
    }

    pub fn delete_hive(&self, id: Uuid) -> Result<()> {
        if !self.store.delete_hive(id)? {
            return Err(MasteryError::not_found("Hive", id));
        }
        Ok(())
    }

    // Concept operations
    pub fn create_concept(
        &self,
        hive_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<Concept> {
        self.hive(hive_id)?;
        let concept = Concept::new(hive_id, name, description)?;
        self.store.save_concept(&concept)?;
        info!(concept = %concept.id, hive = %hive_id, name = %concept.name, "created concept");
        Ok(concept)
    }

    pub fn concept(&self, id: Uuid) -> Result<Concept> {
        self.store
            .get_concept(id)?
            .ok_or_else(|| MasteryError::not_found("Concept", id))
    }

    pub fn concepts(&self, hive_id: Uuid) -> Result<Vec<ConceptView>> {
        self.hive(hive_id)?;
        let now = self.now();
        Ok(self
            .store
            .concepts_for_hive(hive_id)?
            .into_iter()
            .map(|concept| self.view(concept, now))
            .collect())
    }

    pub fn concept_view(&self, id: Uuid) -> Result<ConceptView> {
        let concept = self.concept(id)?;
        Ok(self.view(concept, self.now()))
    }

    pub fn current_confidence(&self, id: Uuid) -> Result<f64> {
        let concept = self.concept(id)?;
        Ok(self.engine.current_confidence(&concept, self.now()))
    }

    pub fn delete_concept(&self, id: Uuid) -> Result<()> {
        if !self.store.delete_concept(id)? {
            return Err(MasteryError::not_found("Concept", id));
        }
        Ok(())
    }

    // Flashcard operations
    pub fn add_flashcard(&self, concept_id: Uuid, front: &str, back: &str) -> Result<Flashcard> {
        self.concept(concept_id)?;
        let card = Flashcard::new(concept_id, front, back)?;
        self.store.save_flashcard(&card)?;
        debug!(flashcard = %card.id, concept = %concept_id, "added flashcard");
        Ok(card)
    }

    pub fn flashcard(&self, id: Uuid) -> Result<Flashcard> {
        self.store
            .get_flashcard(id)?
            .ok_or_else(|| MasteryError::not_found("Flashcard", id))
    }

    /// Weakest box first.
    pub fn flashcards_for_concept(&self, concept_id: Uuid) -> Result<Vec<Flashcard>> {
        self.concept(concept_id)?;
        self.store.flashcards_for_concept(concept_id)
    }

    // Review use cases
    pub fn review_flashcard(
        &self,
        flashcard_id: Uuid,
        level: ConfidenceLevel,
        response_time_ms: u32,
    ) -> Result<ReviewOutcome> {
        let card = self.flashcard(flashcard_id)?;
        let concept = self.concept(card.concept_id)?;
        let now = self.now();

        let evidence = FlashcardEvidence::new(level, response_time_ms);
        let prior = concept.confidence;
        let concept = self.engine.apply_flashcard_evidence(&concept, &evidence, now);
        debug!(
            concept = %concept.id,
            strategy = self.engine.strategy().name(),
            prior,
            posterior = concept.confidence,
            "applied flashcard evidence"
        );
        let flashcard = scheduler::schedule(&card, level, now);

        let event = ReviewEvent::new(
            concept.id,
            ReviewTargetType::Flashcard,
            flashcard.id.to_string(),
            level.score(),
            response_time_ms,
            now,
        )?;
        self.store.atomically(|store| {
            store.save_concept(&concept)?;
            store.save_flashcard(&flashcard)?;
            store.append_review_event(&event)
        })?;

        info!(
            flashcard = %flashcard.id,
            concept = %concept.id,
            level = level.as_str(),
            confidence = concept.confidence,
            leitner_box = flashcard.leitner_box.get(),
            "reviewed flashcard"
        );
        Ok(ReviewOutcome {
            concept,
            flashcard,
            event,
        })
    }

    pub fn submit_quiz_result(
        &self,
        concept_id: Uuid,
        question_id: &str,
        was_correct: bool,
        response_time_ms: u32,
    ) -> Result<QuizOutcome> {
        let question_id = question_id.trim();
        if question_id.is_empty() {
            warn!(concept = %concept_id, "rejected quiz result without a question id");
            return Err(MasteryError::InvalidInput(
                "Quiz question id cannot be empty".to_string(),
            ));
        }
        let concept = self.concept(concept_id)?;
        let now = self.now();

        let evidence = QuizEvidence::new(was_correct, response_time_ms);
        let prior = concept.confidence;
        let concept = self.engine.apply_quiz_evidence(&concept, &evidence, now);
        debug!(
            concept = %concept.id,
            strategy = self.engine.strategy().name(),
            prior,
            posterior = concept.confidence,
            "applied quiz evidence"
        );
        let outcome = if was_correct { 1.0 } else { 0.0 };
        let event = ReviewEvent::new(
            concept.id,
            ReviewTargetType::Quiz,
            question_id,
            outcome,
            response_time_ms,
            now,
        )?;
        self.store.atomically(|store| {
            store.save_concept(&concept)?;
            store.append_review_event(&event)
        })?;

        info!(
            concept = %concept.id,
            question = question_id,
            was_correct,
            confidence = concept.confidence,
            "submitted quiz result"
        );
        Ok(QuizOutcome { concept, event })
    }

    /// Applies every answer in order, then summarizes the batch.
    pub fn submit_quiz_batch(
        &self,
        concept_id: Uuid,
        answers: &[QuizAnswer],
    ) -> Result<QuizSubmissionSummary> {
        self.concept(concept_id)?;
        for answer in answers {
            self.submit_quiz_result(
                concept_id,
                &answer.question_id,
                answer.was_correct,
                answer.response_time_ms,
            )?;
        }
        let summary = QuizSubmissionSummary::from_answers(answers);
        debug!(
            concept = %concept_id,
            total = summary.total_questions,
            correct = summary.correct_answers,
            "quiz batch complete"
        );
        Ok(summary)
    }

    // Read-side queries
    pub fn weak_concepts(&self, hive_id: Uuid) -> Result<Vec<WeakConcept>> {
        self.hive(hive_id)?;
        let concepts = self.store.concepts_for_hive(hive_id)?;
        Ok(self.prioritizer.rank(&concepts, self.now()))
    }

    pub fn weak_concepts_with(
        &self,
        hive_id: Uuid,
        threshold: f64,
        limit: usize,
    ) -> Result<Vec<WeakConcept>> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            warn!(threshold, "rejected weak-concept threshold");
            return Err(MasteryError::InvalidInput(format!(
                "threshold {} must be in (0, 1]",
                threshold
            )));
        }
        self.hive(hive_id)?;
        let concepts = self.store.concepts_for_hive(hive_id)?;
        Ok(self
            .prioritizer
            .rank_with(&concepts, threshold, limit, self.now()))
    }

    /// Due flashcards in one hive, or across all hives when `hive_id` is `None`.
    pub fn next_review_items(
        &self,
        hive_id: Option<Uuid>,
        include_mastered: bool,
        limit: usize,
    ) -> Result<Vec<Flashcard>> {
        if let Some(id) = hive_id {
            self.hive(id)?;
        }
        let cards = self.store.flashcards_for_hive(hive_id)?;
        Ok(scheduler::due_for_review(
            cards,
            self.now(),
            include_mastered,
            limit,
        ))
    }

    pub fn dashboard(&self, hive_id: Uuid) -> Result<DashboardOverview> {
        self.hive(hive_id)?;
        let now = self.now();

        let concepts = self.store.concepts_for_hive(hive_id)?;
        let concept_ids: HashSet<Uuid> = concepts.iter().map(|c| c.id).collect();
        let summary = dashboard::summarize(&concepts);

        let weakest = self.store.weakest_concepts(hive_id, DASHBOARD_WEAKEST)?;
        let due_flashcards = scheduler::due_for_review(
            self.store.flashcards_for_hive(Some(hive_id))?,
            now,
            true,
            usize::MAX,
        )
        .len();
        let recent_reviews = self
            .recent_reviews(Duration::days(RECENT_REVIEW_DAYS))?
            .iter()
            .filter(|e| concept_ids.contains(&e.concept_id))
            .count();

        Ok(DashboardOverview {
            hive_id,
            summary,
            weakest,
            due_flashcards,
            recent_reviews,
        })
    }

    /// Most recent first.
    pub fn review_history(&self, concept_id: Uuid) -> Result<Vec<ReviewEvent>> {
        self.concept(concept_id)?;
        self.store.events_for_concept(concept_id)
    }

    /// Events across all hives within `window` of now, most recent first.
    pub fn recent_reviews(&self, window: Duration) -> Result<Vec<ReviewEvent>> {
        let now = self.now();
        self.store.events_in_range(now - window, now)
    }

    fn view(&self, concept: Concept, now: DateTime<Utc>) -> ConceptView {
        let current_confidence = self.engine.current_confidence(&concept, now);
        ConceptView {
            concept,
            current_confidence,
        }
    }
}
