//! Error types for draft authoring operations.
//!
//! Failures fall into two families: [`ValidationError`] for structurally
//! invalid input and [`NotFoundError`] for references to ids that do not
//! exist in the draft. Every fallible operation checks its preconditions
//! before mutating, so an `Err` always leaves the aggregate untouched.

use thiserror::Error;

use crate::ids::SectionId;
use crate::layout::{Breakpoint, LayoutGroup};
use crate::types::GranularityLevel;

/// Structurally invalid input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A breakpoint value lies outside the 12-column grid.
    #[error("invalid {group} value {value} at breakpoint {breakpoint}: expected an integer between 1 and 12")]
    InvalidBreakpointValue {
        group: LayoutGroup,
        breakpoint: Breakpoint,
        value: i32,
    },
    /// A layout group is missing its mandatory `sm` value.
    #[error("invalid {group}: breakpoint sm is required")]
    MissingSmallBreakpoint { group: LayoutGroup },
    /// A repeatable section was created without a granularity level.
    #[error("repeatable section '{0}' requires a granularity level")]
    MissingGranularityLevel(String),
    /// A repeatable section was given a parent.
    #[error("Repeater section can only be added as root section")]
    RepeatableNotRoot,
    /// Child and parent declare different granularity levels.
    #[error(
        "sub section {child_id} has granularity level {child_level} but parent section {parent_id} has granularity level {parent_level}"
    )]
    GranularityMismatch {
        parent_id: SectionId,
        parent_level: GranularityLevel,
        child_id: SectionId,
        child_level: GranularityLevel,
    },
    /// Attempted to detach a section that is not listed as a child.
    #[error("section {child} is not a sub section of {parent}")]
    SubSectionNotPresent { parent: SectionId, child: SectionId },
    /// A section with the same id already exists in the draft.
    #[error("section {0} already exists in the draft")]
    DuplicateSection(SectionId),
    /// A field with the same id already exists in the draft.
    #[error("data field {0} already exists in the draft")]
    DuplicateDataField(String),
    /// A section claims a parent that does not list it as a sub section.
    #[error("section {child} claims parent {parent}, which does not list it as a sub section")]
    UnlinkedParent { parent: SectionId, child: SectionId },
    /// The major version cannot be incremented any further.
    #[error("version {0} cannot be incremented")]
    VersionOverflow(String),
    /// Version string is not `major.minor.patch`.
    #[error("invalid version '{0}': expected major.minor.patch")]
    InvalidVersion(String),
}

/// Reference to a section or field id that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity} with id {id} not found")]
pub struct NotFoundError {
    /// Kind of entity that was looked up (`"section"`, `"data field"`).
    pub entity: &'static str,
    /// The id that could not be resolved.
    pub id: String,
}

impl NotFoundError {
    pub(crate) fn section(id: &SectionId) -> Self {
        Self {
            entity: "section",
            id: id.to_string(),
        }
    }

    pub(crate) fn data_field(id: impl ToString) -> Self {
        Self {
            entity: "data field",
            id: id.to_string(),
        }
    }
}

/// Coarse classification used by calling layers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Maps to a "bad request" style response.
    Validation,
    /// Maps to a "not found" style response.
    NotFound,
}

/// Any failure raised by a draft operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
}

impl DraftError {
    /// Returns the error family.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DraftError::Validation(_) => ErrorKind::Validation,
            DraftError::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

/// Convenience alias for results with [`DraftError`].
pub type Result<T> = std::result::Result<T, DraftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeatable_message_is_stable() {
        assert_eq!(
            ValidationError::RepeatableNotRoot.to_string(),
            "Repeater section can only be added as root section"
        );
    }

    #[test]
    fn test_kind_classification() {
        let err: DraftError = NotFoundError::section(&SectionId::from("s1")).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "section with id s1 not found");

        let err: DraftError = ValidationError::RepeatableNotRoot.into();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
