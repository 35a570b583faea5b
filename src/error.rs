//! Error types for the mastery engine and its storage layer.
//!
//! The pure algorithms (engine, scheduler, prioritizer, dashboard) never fail for in-range
//! input. Everything here is raised at the boundary: parsing user input, talking to SQLite,
//! or loading configuration.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MasteryError {
    /// A referenced hive, concept or flashcard does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Confidence level, outcome or response time outside its defined domain
    #[error("Invalid evidence: {0}")]
    InvalidEvidence(String),

    /// Malformed entity data (blank names, box out of range, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl MasteryError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        MasteryError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MasteryError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, MasteryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_entity() {
        let err = MasteryError::not_found("Flashcard", "abc");
        assert_eq!(err.to_string(), "Flashcard not found: abc");
        assert!(err.is_not_found());
    }

    #[test]
    fn evidence_errors_are_not_not_found() {
        let err = MasteryError::InvalidEvidence("level 9".to_string());
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "Invalid evidence: level 9");
    }

    #[test]
    fn sqlite_errors_convert() {
        let err: MasteryError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, MasteryError::Database(_)));
    }
}
