use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Concept, Flashcard, Hive, ReviewEvent, ReviewTargetType};
use crate::scheduler::LeitnerBox;
use crate::store::{
    ConceptStore, FlashcardStore, HiveStore, ReviewEventSink, ReviewHistory, UnitOfWork,
};

const HIVE_COLUMNS: &str = "id, name, description, created_at, last_accessed_at";
const CONCEPT_COLUMNS: &str = "id, hive_id, name, description, confidence, last_reviewed_at";
const FLASHCARD_COLUMNS: &str = "f.id, f.concept_id, f.front, f.back, f.leitner_box, f.last_seen_at";
const EVENT_COLUMNS: &str =
    "id, concept_id, target_type, target_id, outcome, response_time_ms, timestamp";

/// SQLite-backed store. Timestamps are kept as integer milliseconds since the epoch,
/// so sub-millisecond precision does not survive a round trip.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS hives (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                created_at INTEGER NOT NULL,
                last_accessed_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS concepts (
                id TEXT PRIMARY KEY,
                hive_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                confidence REAL NOT NULL DEFAULT 0.3 CHECK(confidence >= 0.0 AND confidence <= 1.0),
                last_reviewed_at INTEGER,
                FOREIGN KEY (hive_id) REFERENCES hives(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS flashcards (
                id TEXT PRIMARY KEY,
                concept_id TEXT NOT NULL,
                front TEXT NOT NULL,
                back TEXT NOT NULL,
                leitner_box INTEGER NOT NULL DEFAULT 1 CHECK(leitner_box BETWEEN 1 AND 5),
                last_seen_at INTEGER,
                FOREIGN KEY (concept_id) REFERENCES concepts(id) ON DELETE CASCADE
            );

            -- Append-only review log
            CREATE TABLE IF NOT EXISTS review_events (
                id TEXT PRIMARY KEY,
                concept_id TEXT NOT NULL,
                target_type TEXT NOT NULL CHECK(target_type IN ('flashcard', 'quiz')),
                target_id TEXT NOT NULL,
                outcome REAL NOT NULL CHECK(outcome >= 0.0 AND outcome <= 1.0),
                response_time_ms INTEGER NOT NULL DEFAULT 0,
                timestamp INTEGER NOT NULL,
                FOREIGN KEY (concept_id) REFERENCES concepts(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_concepts_hive ON concepts(hive_id);
            CREATE INDEX IF NOT EXISTS idx_concepts_confidence ON concepts(hive_id, confidence);
            CREATE INDEX IF NOT EXISTS idx_flashcards_concept ON flashcards(concept_id);
            CREATE INDEX IF NOT EXISTS idx_review_events_concept ON review_events(concept_id);
            CREATE INDEX IF NOT EXISTS idx_review_events_timestamp ON review_events(timestamp);
            "#,
        )?;
        debug!("database schema ready");
        Ok(())
    }
}

impl HiveStore for Database {
    fn insert_hive(&self, hive: &Hive) -> Result<()> {
        self.conn.execute(
            "INSERT INTO hives (id, name, description, created_at, last_accessed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                hive.id.to_string(),
                hive.name,
                hive.description,
                hive.created_at.timestamp_millis(),
                hive.last_accessed_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    fn get_hive(&self, id: Uuid) -> Result<Option<Hive>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM hives WHERE id = ?1", HIVE_COLUMNS))?;

        match stmt.query_row(params![id.to_string()], hive_from_row) {
            Ok(hive) => Ok(Some(hive)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_hives(&self) -> Result<Vec<Hive>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM hives ORDER BY last_accessed_at DESC, name",
            HIVE_COLUMNS
        ))?;
        let rows = stmt.query_map([], hive_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn delete_hive(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM hives WHERE id = ?1", params![id.to_string()])?;
        if rows > 0 {
            info!(hive = %id, "deleted hive and its contents");
        }
        Ok(rows > 0)
    }

    fn touch_hive(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "UPDATE hives SET last_accessed_at = ?2 WHERE id = ?1",
            params![id.to_string(), at.timestamp_millis()],
        )?;
        Ok(())
    }
}

impl ConceptStore for Database {
    fn get_concept(&self, id: Uuid) -> Result<Option<Concept>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM concepts WHERE id = ?1", CONCEPT_COLUMNS))?;

        match stmt.query_row(params![id.to_string()], concept_from_row) {
            Ok(concept) => Ok(Some(concept)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save_concept(&self, concept: &Concept) -> Result<()> {
        concept.validate()?;
        self.conn.execute(
            r#"
            INSERT INTO concepts (id, hive_id, name, description, confidence, last_reviewed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                confidence = excluded.confidence,
                last_reviewed_at = excluded.last_reviewed_at
            "#,
            params![
                concept.id.to_string(),
                concept.hive_id.to_string(),
                concept.name,
                concept.description,
                concept.confidence,
                concept.last_reviewed_at.map(|t| t.timestamp_millis()),
            ],
        )?;
        debug!(concept = %concept.id, confidence = concept.confidence, "saved concept");
        Ok(())
    }

    fn concepts_for_hive(&self, hive_id: Uuid) -> Result<Vec<Concept>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM concepts WHERE hive_id = ?1 ORDER BY name, id",
            CONCEPT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![hive_id.to_string()], concept_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn weakest_concepts(&self, hive_id: Uuid, limit: usize) -> Result<Vec<Concept>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM concepts WHERE hive_id = ?1 ORDER BY confidence ASC, name, id LIMIT ?2",
            CONCEPT_COLUMNS
        ))?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![hive_id.to_string(), limit], concept_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn delete_concept(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM concepts WHERE id = ?1", params![id.to_string()])?;
        Ok(rows > 0)
    }
}

impl FlashcardStore for Database {
    fn get_flashcard(&self, id: Uuid) -> Result<Option<Flashcard>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM flashcards f WHERE f.id = ?1",
            FLASHCARD_COLUMNS
        ))?;

        match stmt.query_row(params![id.to_string()], flashcard_from_row) {
            Ok(card) => Ok(Some(card)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save_flashcard(&self, card: &Flashcard) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO flashcards (id, concept_id, front, back, leitner_box, last_seen_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                front = excluded.front,
                back = excluded.back,
                leitner_box = excluded.leitner_box,
                last_seen_at = excluded.last_seen_at
            "#,
            params![
                card.id.to_string(),
                card.concept_id.to_string(),
                card.front,
                card.back,
                card.leitner_box.get(),
                card.last_seen_at.map(|t| t.timestamp_millis()),
            ],
        )?;
        Ok(())
    }

    fn flashcards_for_concept(&self, concept_id: Uuid) -> Result<Vec<Flashcard>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM flashcards f WHERE f.concept_id = ?1 ORDER BY f.leitner_box, f.front",
            FLASHCARD_COLUMNS
        ))?;
        let rows = stmt.query_map(params![concept_id.to_string()], flashcard_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn flashcards_for_hive(&self, hive_id: Option<Uuid>) -> Result<Vec<Flashcard>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}
            FROM flashcards f
            JOIN concepts c ON c.id = f.concept_id
            WHERE ?1 IS NULL OR c.hive_id = ?1
            ORDER BY f.leitner_box, f.id
            "#,
            FLASHCARD_COLUMNS
        ))?;
        let rows = stmt.query_map(
            params![hive_id.map(|id| id.to_string())],
            flashcard_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl ReviewEventSink for Database {
    fn append_review_event(&self, event: &ReviewEvent) -> Result<()> {
        self.conn.execute(
            "INSERT INTO review_events (id, concept_id, target_type, target_id, outcome, response_time_ms, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                event.id.to_string(),
                event.concept_id.to_string(),
                event.target_type.as_str(),
                event.target_id,
                event.outcome,
                event.response_time_ms,
                event.timestamp.timestamp_millis(),
            ],
        )?;
        Ok(())
    }
}

impl ReviewHistory for Database {
    fn events_for_concept(&self, concept_id: Uuid) -> Result<Vec<ReviewEvent>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM review_events WHERE concept_id = ?1 ORDER BY timestamp DESC, rowid DESC",
            EVENT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![concept_id.to_string()], event_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn events_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<ReviewEvent>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM review_events WHERE timestamp BETWEEN ?1 AND ?2 ORDER BY timestamp DESC, rowid DESC",
            EVENT_COLUMNS
        ))?;
        let rows = stmt.query_map(
            params![start.timestamp_millis(), end.timestamp_millis()],
            event_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

impl UnitOfWork for Database {
    fn atomically<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        // Dropping the transaction without commit rolls it back.
        let tx = self.conn.unchecked_transaction()?;
        let value = work(self)?;
        tx.commit()?;
        Ok(value)
    }
}

fn hive_from_row(row: &Row) -> rusqlite::Result<Hive> {
    Ok(Hive {
        id: uuid_column(row, 0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: required_time_column(row, 3)?,
        last_accessed_at: required_time_column(row, 4)?,
    })
}

fn concept_from_row(row: &Row) -> rusqlite::Result<Concept> {
    Ok(Concept {
        id: uuid_column(row, 0)?,
        hive_id: uuid_column(row, 1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        confidence: row.get(4)?,
        last_reviewed_at: time_column(row, 5)?,
    })
}

fn flashcard_from_row(row: &Row) -> rusqlite::Result<Flashcard> {
    let raw_box: u8 = row.get(4)?;
    let leitner_box = LeitnerBox::try_from(raw_box)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Integer, Box::new(e)))?;
    Ok(Flashcard {
        id: uuid_column(row, 0)?,
        concept_id: uuid_column(row, 1)?,
        front: row.get(2)?,
        back: row.get(3)?,
        leitner_box,
        last_seen_at: time_column(row, 5)?,
    })
}

fn event_from_row(row: &Row) -> rusqlite::Result<ReviewEvent> {
    let raw_type: String = row.get(2)?;
    let target_type = ReviewTargetType::from_str(&raw_type).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            format!("unknown review target type '{}'", raw_type).into(),
        )
    })?;
    Ok(ReviewEvent {
        id: uuid_column(row, 0)?,
        concept_id: uuid_column(row, 1)?,
        target_type,
        target_id: row.get(3)?,
        outcome: row.get(4)?,
        response_time_ms: row.get(5)?,
        timestamp: required_time_column(row, 6)?,
    })
}

fn uuid_column(row: &Row, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn time_column(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let millis: Option<i64> = row.get(idx)?;
    millis
        .map(|ms| {
            DateTime::from_timestamp_millis(ms).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    Type::Integer,
                    format!("timestamp {} out of range", ms).into(),
                )
            })
        })
        .transpose()
}

fn required_time_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    time_column(row, idx)?.ok_or(rusqlite::Error::InvalidColumnType(
        idx,
        "timestamp".to_string(),
        Type::Null,
    ))
}
