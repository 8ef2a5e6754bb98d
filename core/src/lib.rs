//! Draft authoring and publishing for product data models.
//!
//! This crate defines the types an author edits and the immutable artifacts
//! they publish:
//!
//! - [`Layout`]: responsive 12-column grid placement per breakpoint.
//! - [`DataFieldDraft`]: a typed, named value slot with free-form options.
//! - [`DataSectionDraft`]: a group or repeatable container of fields.
//! - [`TemplateDraft`]: the aggregate root. Sections live in one flat list
//!   and reference each other by id only.
//! - [`Template`]: the immutable, versioned result of
//!   [`TemplateDraft::publish`]. Section and field ids are preserved.
//!
//! Structural checks for drafts that were loaded rather than built through
//! the aggregate live in [`validate_draft`].
//!
//! # Example
//!
//! ```
//! use product_schema_core::*;
//!
//! let mut draft = TemplateDraft::create(TemplateDraftProps {
//!     name: "Battery".into(),
//!     description: String::new(),
//!     sectors: vec!["BATTERY".into()],
//!     organization_id: OrganizationId::from("org-1"),
//!     user_id: UserId::from("user-1"),
//! });
//!
//! let cells = DataSectionDraft::create(DataSectionDraftProps {
//!     name: "Cells".into(),
//!     section_type: SectionType::Repeatable,
//!     layout: Layout::full_width(),
//!     granularity_level: Some(GranularityLevel::Item),
//! })
//! .unwrap();
//! let cells_id = cells.id().clone();
//! draft.add_section(cells).unwrap();
//!
//! // Repeatable sections are root-only.
//! let nested = DataSectionDraft::create(DataSectionDraftProps {
//!     name: "Modules".into(),
//!     section_type: SectionType::Repeatable,
//!     layout: Layout::full_width(),
//!     granularity_level: Some(GranularityLevel::Item),
//! })
//! .unwrap();
//! let err = draft.add_sub_section(&cells_id, nested).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Validation);
//!
//! let template = draft.publish(UserId::from("user-2")).unwrap();
//! assert_eq!(template.sections()[0].id(), &cells_id);
//! ```

mod draft;
mod error;
mod field;
mod ids;
mod layout;
mod merge;
mod section;
mod template;
mod types;
mod validate;
mod version;

pub use draft::{Publication, TemplateDraft, TemplateDraftProps};
pub use error::{DraftError, ErrorKind, NotFoundError, Result, ValidationError};
pub use field::{DataFieldDraft, DataFieldDraftProps, DataFieldModification};
pub use ids::{DataFieldId, OrganizationId, SectionId, TemplateId, UserId};
pub use layout::{
    Breakpoint, Breakpoints, GRID_MAX, GRID_MIN, Layout, LayoutGroup, LayoutPatch, LayoutProps,
};
pub use merge::{DataFieldOptions, merge_options};
pub use section::{DataSectionDraft, DataSectionDraftProps, SectionModification};
pub use template::{DataField, DataSection, Template};
pub use types::{DataFieldType, GranularityLevel, MoveDirection, ParseEnumError, SectionType};
pub use validate::{IntegrityError, validate_draft};
pub use version::SchemaVersion;
