//! Summary statistics over a hive's concepts.
//!
//! Mastery bands are half-open so every concept lands in exactly one:
//! beginner `[0, 0.3)`, learning `[0.3, 0.6)`, proficient `[0.6, 0.8)`, mastered `[0.8, 1]`.

use serde::Serialize;
use uuid::Uuid;

use crate::models::Concept;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryBand {
    Beginner,
    Learning,
    Proficient,
    Mastered,
}

impl MasteryBand {
    pub fn for_confidence(confidence: f64) -> Self {
        if confidence < 0.3 {
            MasteryBand::Beginner
        } else if confidence < 0.6 {
            MasteryBand::Learning
        } else if confidence < 0.8 {
            MasteryBand::Proficient
        } else {
            MasteryBand::Mastered
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MasteryBand::Beginner => "Beginner",
            MasteryBand::Learning => "Learning",
            MasteryBand::Proficient => "Proficient",
            MasteryBand::Mastered => "Mastered",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MasteryDistribution {
    pub beginner: usize,
    pub learning: usize,
    pub proficient: usize,
    pub mastered: usize,
}

impl MasteryDistribution {
    pub fn count(&self, band: MasteryBand) -> usize {
        match band {
            MasteryBand::Beginner => self.beginner,
            MasteryBand::Learning => self.learning,
            MasteryBand::Proficient => self.proficient,
            MasteryBand::Mastered => self.mastered,
        }
    }

    pub fn total(&self) -> usize {
        self.beginner + self.learning + self.proficient + self.mastered
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceSummary {
    pub total_concepts: usize,
    /// `None` when there are no concepts; never reported as zero
    pub average_confidence: Option<f64>,
    pub distribution: MasteryDistribution,
}

/// Full dashboard for one hive, assembled by the service layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardOverview {
    pub hive_id: Uuid,
    pub summary: ConfidenceSummary,
    pub weakest: Vec<Concept>,
    pub due_flashcards: usize,
    pub recent_reviews: usize,
}

pub fn average_confidence(concepts: &[Concept]) -> Option<f64> {
    if concepts.is_empty() {
        return None;
    }
    let total: f64 = concepts.iter().map(|c| c.confidence).sum();
    Some(total / concepts.len() as f64)
}

pub fn mastery_distribution(concepts: &[Concept]) -> MasteryDistribution {
    concepts
        .iter()
        .fold(MasteryDistribution::default(), |mut dist, c| {
            match MasteryBand::for_confidence(c.confidence) {
                MasteryBand::Beginner => dist.beginner += 1,
                MasteryBand::Learning => dist.learning += 1,
                MasteryBand::Proficient => dist.proficient += 1,
                MasteryBand::Mastered => dist.mastered += 1,
            }
            dist
        })
}

pub fn summarize(concepts: &[Concept]) -> ConfidenceSummary {
    ConfidenceSummary {
        total_concepts: concepts.len(),
        average_confidence: average_confidence(concepts),
        distribution: mastery_distribution(concepts),
    }
}
