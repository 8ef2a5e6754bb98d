//! Error types for SQLite storage operations.
//!
//! Provides a unified error type covering database access, conversion,
//! migration, and integrity failures.

use product_schema_core::{DraftError, ErrorKind, IntegrityError};
use thiserror::Error;

/// Errors that can occur during SQLite storage operations.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Row-to-document conversion failure.
    #[error("conversion error: {0}")]
    ConversionError(String),

    /// JSON column could not be encoded or decoded.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Migration lifecycle operation failure.
    #[error("migration error: {0}")]
    MigrationError(String),

    /// Table prefix contains invalid characters.
    #[error("invalid prefix '{0}': must contain only alphanumeric characters and underscores")]
    InvalidPrefix(String),

    /// Requested draft or template does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// Published templates are immutable and are never replaced.
    #[error("template {0} already exists")]
    TemplateExists(String),

    /// A stored draft breaks one or more structural invariants.
    #[error("draft {id} failed integrity checks ({} problems)", .errors.len())]
    Integrity {
        id: String,
        errors: Vec<IntegrityError>,
    },

    /// A draft operation was rejected.
    #[error(transparent)]
    Draft(#[from] DraftError),

    /// Error reading the JSON document store during seeding.
    #[error("loader error: {0}")]
    LoaderError(#[from] product_schema_db::DatabaseError),
}

impl SqliteError {
    /// Returns `true` for missing drafts, templates, sections and fields.
    pub fn is_not_found(&self) -> bool {
        match self {
            SqliteError::NotFound { .. } => true,
            SqliteError::Draft(err) => err.kind() == ErrorKind::NotFound,
            SqliteError::LoaderError(err) => err.is_not_found(),
            _ => false,
        }
    }
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
