//! Concept mastery tracking.
//!
//! A probabilistic confidence engine fuses flashcard and quiz evidence into a per-concept
//! mastery estimate, a Leitner ladder schedules flashcards, and read-only views rank weak
//! concepts and summarize a hive. [`service::StudyService`] ties these to a
//! [`store::Store`], normally the SQLite [`db::Database`].

pub mod config;
pub mod dashboard;
pub mod db;
pub mod engine;
pub mod error;
pub mod format;
pub mod models;
pub mod prioritizer;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod tui;

pub use error::{MasteryError, Result};
