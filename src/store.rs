//! Collaborator interfaces the use cases depend on.
//!
//! The SQLite [`Database`](crate::db::Database) implements all of them. Writes for one
//! concept must be serialized by the implementation; a single `Database` owns a single
//! connection and is not `Sync`, which gives single-writer access per process.

use std::cell::Cell;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Concept, Flashcard, Hive, ReviewEvent};

pub trait HiveStore {
    fn insert_hive(&self, hive: &Hive) -> Result<()>;
    fn get_hive(&self, id: Uuid) -> Result<Option<Hive>>;
    fn list_hives(&self) -> Result<Vec<Hive>>;
    /// Cascades to the hive's concepts, flashcards and review events.
    fn delete_hive(&self, id: Uuid) -> Result<bool>;
    fn touch_hive(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;
}

pub trait ConceptStore {
    fn get_concept(&self, id: Uuid) -> Result<Option<Concept>>;
    /// Inserts or replaces by id.
    fn save_concept(&self, concept: &Concept) -> Result<()>;
    fn concepts_for_hive(&self, hive_id: Uuid) -> Result<Vec<Concept>>;
    /// Lowest confidence first.
    fn weakest_concepts(&self, hive_id: Uuid, limit: usize) -> Result<Vec<Concept>>;
    fn delete_concept(&self, id: Uuid) -> Result<bool>;
}

pub trait FlashcardStore {
    fn get_flashcard(&self, id: Uuid) -> Result<Option<Flashcard>>;
    /// Inserts or replaces by id.
    fn save_flashcard(&self, card: &Flashcard) -> Result<()>;
    fn flashcards_for_concept(&self, concept_id: Uuid) -> Result<Vec<Flashcard>>;
    /// Every flashcard in the hive, or in all hives when `hive_id` is `None`.
    fn flashcards_for_hive(&self, hive_id: Option<Uuid>) -> Result<Vec<Flashcard>>;
}

/// Append-only review log.
pub trait ReviewEventSink {
    fn append_review_event(&self, event: &ReviewEvent) -> Result<()>;
}

pub trait ReviewHistory {
    /// Most recent first.
    fn events_for_concept(&self, concept_id: Uuid) -> Result<Vec<ReviewEvent>>;
    /// Inclusive on both ends, most recent first.
    fn events_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<ReviewEvent>>;
}

/// Groups several writes so they land together or not at all.
pub trait UnitOfWork {
    /// Runs `work` atomically. Any `Err` returned by `work` discards every write it made.
    /// Calls do not nest.
    fn atomically<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>;
}

/// Everything the use cases need from storage.
pub trait Store:
    HiveStore + ConceptStore + FlashcardStore + ReviewEventSink + ReviewHistory + UnitOfWork
{
}

impl<T> Store for T where
    T: HiveStore + ConceptStore + FlashcardStore + ReviewEventSink + ReviewHistory + UnitOfWork
{
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Cell<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_advances() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = FixedClock::new(t0);
        assert_eq!(clock.now(), t0);
        clock.advance(Duration::days(3));
        assert_eq!(clock.now(), t0 + Duration::days(3));
        clock.set(t0);
        assert_eq!((&clock).now(), t0);
    }

    #[test]
    fn system_clock_moves_forward() {
        let a = SystemClock.now();
        let b = SystemClock.now();
        assert!(b >= a);
    }
}
