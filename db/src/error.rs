//! Error types for the JSON document store.
//!
//! Covers every failure mode of the store: I/O, serialization, rejected draft
//! operations, integrity violations in loaded drafts, and missing documents.

use product_schema_core::{DraftError, ErrorKind, IntegrityError};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A draft operation was rejected.
    #[error(transparent)]
    Draft(#[from] DraftError),

    /// A stored draft breaks one or more structural invariants.
    #[error("draft {id} failed integrity checks: {}", join(.errors))]
    Integrity {
        id: String,
        errors: Vec<IntegrityError>,
    },

    /// No document with this id exists in the store.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// The id cannot be used as a document file name.
    #[error("invalid document id '{0}'")]
    InvalidId(String),

    /// Published templates are immutable and are never overwritten.
    #[error("template {0} already exists")]
    TemplateExists(String),
}

impl DatabaseError {
    /// Returns `true` for missing drafts, templates, sections and fields.
    pub fn is_not_found(&self) -> bool {
        match self {
            DatabaseError::NotFound { .. } => true,
            DatabaseError::Draft(err) => err.kind() == ErrorKind::NotFound,
            _ => false,
        }
    }
}

fn join(errors: &[IntegrityError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias for results with [`DatabaseError`].
pub type Result<T> = std::result::Result<T, DatabaseError>;
