//! Ranks weak concepts by how urgently they need study.
//!
//! `priority = confidence_weight * (1 - confidence) + recency_weight * time_priority`, where
//! time priority grows with the number of whole days since the last review. Ties keep their
//! input order.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::PriorityConfig;
use crate::models::Concept;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    BuildFoundation,
    PracticeRegularly,
    TakeQuizzes,
    PeriodicReview,
}

impl Recommendation {
    pub fn for_confidence(confidence: f64) -> Self {
        if confidence < 0.2 {
            Recommendation::BuildFoundation
        } else if confidence < 0.4 {
            Recommendation::PracticeRegularly
        } else if confidence < 0.6 {
            Recommendation::TakeQuizzes
        } else {
            Recommendation::PeriodicReview
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::BuildFoundation => "Review flashcards daily to build foundation",
            Recommendation::PracticeRegularly => "Practice flashcards regularly and take quizzes",
            Recommendation::TakeQuizzes => "Take quizzes to solidify understanding",
            Recommendation::PeriodicReview => "Periodic review to maintain mastery",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeakConcept {
    pub concept: Concept,
    pub priority: f64,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeakConceptPrioritizer {
    config: PriorityConfig,
}

impl WeakConceptPrioritizer {
    pub fn new(config: PriorityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PriorityConfig {
        &self.config
    }

    pub fn time_priority(&self, concept: &Concept, now: DateTime<Utc>) -> f64 {
        let Some(last) = concept.last_reviewed_at else {
            return self.config.unreviewed_priority;
        };
        let days = (now - last).num_days();
        self.config
            .stale_tiers
            .iter()
            .find(|(min_days, _)| days > *min_days)
            .map(|(_, priority)| *priority)
            .unwrap_or(self.config.fresh_priority)
    }

    pub fn priority(&self, concept: &Concept, now: DateTime<Utc>) -> f64 {
        self.config.confidence_weight * (1.0 - concept.confidence)
            + self.config.recency_weight * self.time_priority(concept, now)
    }

    /// Ranks with the configured threshold and limit.
    pub fn rank(&self, candidates: &[Concept], now: DateTime<Utc>) -> Vec<WeakConcept> {
        self.rank_with(candidates, self.config.threshold, self.config.limit, now)
    }

    pub fn rank_with(
        &self,
        candidates: &[Concept],
        threshold: f64,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<WeakConcept> {
        let mut ranked: Vec<WeakConcept> = candidates
            .iter()
            .filter(|c| c.confidence < threshold)
            .map(|c| WeakConcept {
                concept: c.clone(),
                priority: self.priority(c, now),
                recommendation: Recommendation::for_confidence(c.confidence),
            })
            .collect();

        // sort_by is stable, equal priorities keep input order
        ranked.sort_by(|a, b| b.priority.total_cmp(&a.priority));
        ranked.truncate(limit);
        ranked
    }
}
