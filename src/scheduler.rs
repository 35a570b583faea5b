//! Leitner box ladder for flashcard review scheduling.
//!
//! Boxes run from 1 (weakest, reviewed daily) to 5 (reviewed monthly). A weak rating sends a
//! card back to box 1, a fair rating keeps it in place, a strong rating promotes it one box.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MasteryError, Result};
use crate::models::{ConfidenceLevel, Flashcard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LeitnerBox(u8);

impl LeitnerBox {
    pub const FIRST: LeitnerBox = LeitnerBox(1);
    pub const LAST: LeitnerBox = LeitnerBox(5);

    pub fn new(n: u8) -> Result<Self> {
        if (Self::FIRST.0..=Self::LAST.0).contains(&n) {
            Ok(LeitnerBox(n))
        } else {
            Err(MasteryError::InvalidInput(format!(
                "Leitner box {} outside 1..=5",
                n
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Days until the next review for a card sitting in this box.
    pub fn interval_days(self) -> i64 {
        match self.0 {
            1 => 1,
            2 => 3,
            3 => 7,
            4 => 14,
            _ => 30,
        }
    }

    pub fn interval(self) -> Duration {
        Duration::days(self.interval_days())
    }

    pub fn after_rating(self, level: ConfidenceLevel) -> Self {
        match level {
            ConfidenceLevel::Unknown | ConfidenceLevel::KnownLittle => Self::FIRST,
            ConfidenceLevel::KnownFairly => self,
            ConfidenceLevel::KnownWell | ConfidenceLevel::Mastered => {
                LeitnerBox((self.0 + 1).min(Self::LAST.0))
            }
        }
    }
}

impl TryFrom<u8> for LeitnerBox {
    type Error = MasteryError;

    fn try_from(n: u8) -> Result<Self> {
        LeitnerBox::new(n)
    }
}

impl From<LeitnerBox> for u8 {
    fn from(b: LeitnerBox) -> u8 {
        b.0
    }
}

impl std::fmt::Display for LeitnerBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Moves a card along the ladder for a rating given at `now`.
pub fn schedule(card: &Flashcard, level: ConfidenceLevel, now: DateTime<Utc>) -> Flashcard {
    Flashcard {
        leitner_box: card.leitner_box.after_rating(level),
        last_seen_at: Some(now),
        ..card.clone()
    }
}

/// Lowest boxes first, then the longest-unseen cards; never-seen cards lead their box.
pub fn order_for_review(mut cards: Vec<Flashcard>) -> Vec<Flashcard> {
    cards.sort_by(|a, b| {
        a.leitner_box
            .cmp(&b.leitner_box)
            .then(a.last_seen_at.cmp(&b.last_seen_at))
    });
    cards
}

/// Cards due at `now`, optionally leaving out the top box, ordered and capped at `limit`.
pub fn due_for_review(
    cards: Vec<Flashcard>,
    now: DateTime<Utc>,
    include_mastered: bool,
    limit: usize,
) -> Vec<Flashcard> {
    let max_box = if include_mastered {
        LeitnerBox::LAST
    } else {
        LeitnerBox(LeitnerBox::LAST.0 - 1)
    };
    let due = cards
        .into_iter()
        .filter(|c| c.leitner_box <= max_box && c.is_due(now))
        .collect();
    let mut ordered = order_for_review(due);
    ordered.truncate(limit);
    ordered
}
