use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MasteryError, Result};
use crate::scheduler::LeitnerBox;

/// Prior probability of mastery for a freshly created concept.
pub const INITIAL_CONFIDENCE: f64 = 0.3;

/// A focused learning context (a course, subject or goal). Owns concepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hive {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

impl Hive {
    pub fn new(name: &str, description: Option<&str>, now: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            name: required_text("Hive name", name)?,
            description: optional_text(description),
            created_at: now,
            last_accessed_at: now,
        })
    }
}

/// A unit of knowledge whose mastery is tracked as a probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub id: Uuid,
    pub hive_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Posterior probability that the learner has mastered this concept
    pub confidence: f64,
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

impl Concept {
    pub fn new(hive_id: Uuid, name: &str, description: Option<&str>) -> Result<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            hive_id,
            name: required_text("Concept name", name)?,
            description: optional_text(description),
            confidence: INITIAL_CONFIDENCE,
            last_reviewed_at: None,
        })
    }

    /// Rejects confidence values the engine could not have produced.
    pub fn validate(&self) -> Result<()> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(MasteryError::InvalidInput(format!(
                "concept {} has confidence {} outside [0, 1]",
                self.id, self.confidence
            )));
        }
        Ok(())
    }
}

/// A study item tied to one concept, scheduled on the Leitner ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: Uuid,
    pub concept_id: Uuid,
    pub front: String,
    pub back: String,
    pub leitner_box: LeitnerBox,
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl Flashcard {
    pub fn new(concept_id: Uuid, front: &str, back: &str) -> Result<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            concept_id,
            front: required_text("Flashcard front", front)?,
            back: required_text("Flashcard back", back)?,
            leitner_box: LeitnerBox::FIRST,
            last_seen_at: None,
        })
    }

    /// Derived from the box and the last time the card was seen; `None` for unseen cards.
    pub fn next_review_at(&self) -> Option<DateTime<Utc>> {
        self.last_seen_at
            .map(|seen| seen + self.leitner_box.interval())
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.next_review_at() {
            Some(next) => next <= now,
            None => true,
        }
    }
}

/// Self-reported recall quality for a flashcard, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Unknown,
    KnownLittle,
    KnownFairly,
    KnownWell,
    Mastered,
}

impl ConfidenceLevel {
    pub const ALL: [ConfidenceLevel; 5] = [
        ConfidenceLevel::Unknown,
        ConfidenceLevel::KnownLittle,
        ConfidenceLevel::KnownFairly,
        ConfidenceLevel::KnownWell,
        ConfidenceLevel::Mastered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::Unknown => "unknown",
            ConfidenceLevel::KnownLittle => "known_little",
            ConfidenceLevel::KnownFairly => "known_fairly",
            ConfidenceLevel::KnownWell => "known_well",
            ConfidenceLevel::Mastered => "mastered",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceLevel::Unknown => "Unknown",
            ConfidenceLevel::KnownLittle => "Known a little",
            ConfidenceLevel::KnownFairly => "Known fairly",
            ConfidenceLevel::KnownWell => "Known well",
            ConfidenceLevel::Mastered => "Mastered",
        }
    }

    /// Accepts names, short aliases and the 0-4 numeric scale.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "unknown" | "u" | "0" => Ok(ConfidenceLevel::Unknown),
            "known_little" | "little" | "l" | "1" => Ok(ConfidenceLevel::KnownLittle),
            "known_fairly" | "fairly" | "f" | "2" => Ok(ConfidenceLevel::KnownFairly),
            "known_well" | "well" | "w" | "3" => Ok(ConfidenceLevel::KnownWell),
            "mastered" | "m" | "4" => Ok(ConfidenceLevel::Mastered),
            other => Err(MasteryError::InvalidEvidence(format!(
                "unknown confidence level '{}'",
                other
            ))),
        }
    }

    pub fn from_i32(v: i32) -> Result<Self> {
        usize::try_from(v)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| {
                MasteryError::InvalidEvidence(format!("confidence level {} outside 0..=4", v))
            })
    }

    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// Numeric outcome recorded in the review log.
    pub fn score(&self) -> f64 {
        match self {
            ConfidenceLevel::Unknown => 0.0,
            ConfidenceLevel::KnownLittle => 0.25,
            ConfidenceLevel::KnownFairly => 0.5,
            ConfidenceLevel::KnownWell => 0.75,
            ConfidenceLevel::Mastered => 1.0,
        }
    }
}

/// Evidence from grading one flashcard.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlashcardEvidence {
    pub level: ConfidenceLevel,
    pub response_time_ms: u32,
    pub was_correct: bool,
}

impl FlashcardEvidence {
    pub fn new(level: ConfidenceLevel, response_time_ms: u32) -> Self {
        Self {
            level,
            response_time_ms,
            was_correct: level >= ConfidenceLevel::KnownFairly,
        }
    }
}

/// Evidence from answering one quiz question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizEvidence {
    pub was_correct: bool,
    pub response_time_ms: u32,
}

impl QuizEvidence {
    pub fn new(was_correct: bool, response_time_ms: u32) -> Self {
        Self {
            was_correct,
            response_time_ms,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewTargetType {
    Flashcard,
    Quiz,
}

impl ReviewTargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewTargetType::Flashcard => "flashcard",
            ReviewTargetType::Quiz => "quiz",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "flashcard" => Some(ReviewTargetType::Flashcard),
            "quiz" => Some(ReviewTargetType::Quiz),
            _ => None,
        }
    }
}

/// Append-only analytics record of a single review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub id: Uuid,
    pub concept_id: Uuid,
    pub target_type: ReviewTargetType,
    pub target_id: String,
    pub outcome: f64,
    pub response_time_ms: u32,
    pub timestamp: DateTime<Utc>,
}

impl ReviewEvent {
    pub fn new(
        concept_id: Uuid,
        target_type: ReviewTargetType,
        target_id: impl Into<String>,
        outcome: f64,
        response_time_ms: u32,
        timestamp: DateTime<Utc>,
    ) -> Result<Self> {
        if !outcome.is_finite() || !(0.0..=1.0).contains(&outcome) {
            return Err(MasteryError::InvalidEvidence(format!(
                "review outcome {} outside [0, 1]",
                outcome
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            concept_id,
            target_type,
            target_id: target_id.into(),
            outcome,
            response_time_ms,
            timestamp,
        })
    }
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

fn required_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MasteryError::InvalidInput(format!("{} cannot be empty", field)));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
