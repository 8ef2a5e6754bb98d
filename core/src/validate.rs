//! Structural integrity checks for whole drafts.
//!
//! [`TemplateDraft`] methods keep the section tree consistent on their own,
//! but a draft read back from disk or a database bypasses them. These checks
//! catch broken references, asymmetric parent/child links, misplaced
//! repeatable sections and out-of-order publication history before such a
//! draft is handed to callers.
//!
//! # Examples
//!
//! ```
//! use product_schema_core::*;
//!
//! let draft = TemplateDraft::create(TemplateDraftProps {
//!     name: "Laptop".into(),
//!     description: String::new(),
//!     sectors: vec![],
//!     organization_id: OrganizationId::from("org-1"),
//!     user_id: UserId::from("user-1"),
//! });
//! assert!(validate_draft(&draft).is_empty());
//! ```

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::ids::SectionId;
use crate::section::DataSectionDraft;
use crate::types::{GranularityLevel, SectionType};
use crate::version::SchemaVersion;
use crate::TemplateDraft;

/// A broken invariant found in a persisted draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("duplicate section id: {0}")]
    DuplicateSection(SectionId),
    #[error("duplicate data field id: {0}")]
    DuplicateDataField(String),
    /// A section names a parent that is not in the draft.
    #[error("section {child} references missing parent {parent}")]
    MissingParent { child: SectionId, parent: SectionId },
    /// A `sub_sections` entry points at a section that is not in the draft.
    #[error("section {parent} lists missing sub section {child}")]
    MissingSubSection { parent: SectionId, child: SectionId },
    /// Parent and child disagree about their relationship.
    #[error("link between {parent} and {child} is not symmetric")]
    AsymmetricLink { parent: SectionId, child: SectionId },
    #[error("section {0} is its own ancestor")]
    Cycle(SectionId),
    #[error("repeatable section {0} is not a root section")]
    RepeatableNotRoot(SectionId),
    #[error("repeatable section {0} has no granularity level")]
    RepeatableWithoutGranularity(SectionId),
    #[error(
        "section {child} has granularity level {child_level} but its parent {parent} has {parent_level}"
    )]
    GranularityMismatch {
        parent: SectionId,
        parent_level: GranularityLevel,
        child: SectionId,
        child_level: GranularityLevel,
    },
    /// Publication history is not strictly increasing.
    #[error("publication version {current} does not follow {previous}")]
    PublicationOrder {
        previous: SchemaVersion,
        current: SchemaVersion,
    },
}

/// Checks every structural invariant of `draft` and returns all violations.
pub fn validate_draft(draft: &TemplateDraft) -> Vec<IntegrityError> {
    let mut errors = Vec::new();
    let mut by_id: HashMap<&SectionId, &DataSectionDraft> = HashMap::new();
    let mut field_ids = HashSet::new();

    for section in draft.sections() {
        if by_id.insert(section.id(), section).is_some() {
            errors.push(IntegrityError::DuplicateSection(section.id().clone()));
        }
        for field in section.data_fields() {
            if !field_ids.insert(field.id()) {
                errors.push(IntegrityError::DuplicateDataField(field.id().to_string()));
            }
        }
    }

    for section in draft.sections() {
        validate_links(section, &by_id, &mut errors);
        validate_kind(section, &by_id, &mut errors);
    }

    validate_acyclic(draft, &by_id, &mut errors);
    validate_publications(draft, &mut errors);

    errors
}

fn validate_links(
    section: &DataSectionDraft,
    by_id: &HashMap<&SectionId, &DataSectionDraft>,
    errors: &mut Vec<IntegrityError>,
) {
    if let Some(parent_id) = section.parent_id() {
        match by_id.get(parent_id) {
            None => errors.push(IntegrityError::MissingParent {
                child: section.id().clone(),
                parent: parent_id.clone(),
            }),
            Some(parent) if !parent.sub_sections().contains(section.id()) => {
                errors.push(IntegrityError::AsymmetricLink {
                    parent: parent_id.clone(),
                    child: section.id().clone(),
                });
            }
            Some(_) => {}
        }
    }

    for child_id in section.sub_sections() {
        match by_id.get(child_id) {
            None => errors.push(IntegrityError::MissingSubSection {
                parent: section.id().clone(),
                child: child_id.clone(),
            }),
            Some(child) if child.parent_id() != Some(section.id()) => {
                errors.push(IntegrityError::AsymmetricLink {
                    parent: section.id().clone(),
                    child: child_id.clone(),
                });
            }
            Some(_) => {}
        }
    }
}

fn validate_kind(
    section: &DataSectionDraft,
    by_id: &HashMap<&SectionId, &DataSectionDraft>,
    errors: &mut Vec<IntegrityError>,
) {
    if section.section_type() == SectionType::Repeatable {
        if !section.is_root() {
            errors.push(IntegrityError::RepeatableNotRoot(section.id().clone()));
        }
        if section.granularity_level().is_none() {
            errors.push(IntegrityError::RepeatableWithoutGranularity(
                section.id().clone(),
            ));
        }
    }

    let parent = section.parent_id().and_then(|id| by_id.get(id).copied());
    if let Some(parent) = parent {
        if let (Some(parent_level), Some(child_level)) =
            (parent.granularity_level(), section.granularity_level())
        {
            if parent_level != child_level {
                errors.push(IntegrityError::GranularityMismatch {
                    parent: parent.id().clone(),
                    parent_level,
                    child: section.id().clone(),
                    child_level,
                });
            }
        }
    }
}

fn validate_acyclic(
    draft: &TemplateDraft,
    by_id: &HashMap<&SectionId, &DataSectionDraft>,
    errors: &mut Vec<IntegrityError>,
) {
    for section in draft.sections() {
        let mut seen = HashSet::new();
        let mut current = section;
        seen.insert(current.id());
        while let Some(parent) = current.parent_id().and_then(|id| by_id.get(id).copied()) {
            if parent.id() == section.id() {
                errors.push(IntegrityError::Cycle(section.id().clone()));
                break;
            }
            if !seen.insert(parent.id()) {
                // Cycle above this section; reported for its own members.
                break;
            }
            current = parent;
        }
    }
}

fn validate_publications(draft: &TemplateDraft, errors: &mut Vec<IntegrityError>) {
    for pair in draft.publications().windows(2) {
        if pair[1].version <= pair[0].version {
            errors.push(IntegrityError::PublicationOrder {
                previous: pair[0].version,
                current: pair[1].version,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        DataSectionDraftProps, Layout, OrganizationId, TemplateDraftProps, UserId,
    };

    fn draft() -> TemplateDraft {
        TemplateDraft::create(TemplateDraftProps {
            name: "Laptop".into(),
            description: String::new(),
            sectors: vec![],
            organization_id: OrganizationId::from("org-1"),
            user_id: UserId::from("user-1"),
        })
    }

    fn group(name: &str) -> DataSectionDraft {
        DataSectionDraft::create(DataSectionDraftProps {
            name: name.into(),
            section_type: SectionType::Group,
            layout: Layout::full_width(),
            granularity_level: None,
        })
        .unwrap()
    }

    /// Round-trips through JSON so tests can corrupt the persisted shape.
    fn edit(draft: &TemplateDraft, f: impl FnOnce(&mut serde_json::Value)) -> TemplateDraft {
        let mut value = serde_json::to_value(draft).unwrap();
        f(&mut value);
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_consistent_draft_has_no_errors() {
        let mut d = draft();
        let root = group("A");
        let root_id = root.id().clone();
        d.add_section(root).unwrap();
        d.add_sub_section(&root_id, group("B")).unwrap();
        d.publish(UserId::from("u")).unwrap();
        d.publish(UserId::from("u")).unwrap();
        assert!(validate_draft(&d).is_empty());
    }

    #[test]
    fn test_detects_missing_parent_and_asymmetric_link() {
        let mut d = draft();
        let root = group("A");
        let root_id = root.id().clone();
        d.add_section(root).unwrap();
        d.add_sub_section(&root_id, group("B")).unwrap();

        let broken = edit(&d, |v| {
            v["sections"][0]["subSections"] = json!([]);
        });
        let errors = validate_draft(&broken);
        assert!(matches!(
            errors.as_slice(),
            [IntegrityError::AsymmetricLink { .. }]
        ));

        let broken = edit(&d, |v| {
            v["sections"][1]["parentId"] = json!("ghost");
        });
        let errors = validate_draft(&broken);
        assert!(errors.contains(&IntegrityError::MissingParent {
            child: d.sections()[1].id().clone(),
            parent: SectionId::from("ghost"),
        }));
    }

    #[test]
    fn test_detects_nested_repeatable() {
        let mut d = draft();
        let root = group("A");
        let root_id = root.id().clone();
        d.add_section(root).unwrap();
        d.add_sub_section(&root_id, group("B")).unwrap();

        let broken = edit(&d, |v| {
            v["sections"][1]["type"] = json!("REPEATABLE");
            v["sections"][1]["granularityLevel"] = json!("ITEM");
        });
        let errors = validate_draft(&broken);
        assert_eq!(
            errors,
            vec![IntegrityError::RepeatableNotRoot(
                d.sections()[1].id().clone()
            )]
        );
    }

    #[test]
    fn test_detects_cycle() {
        let mut d = draft();
        d.add_section(group("A")).unwrap();
        let id = d.sections()[0].id().clone();
        let broken = edit(&d, |v| {
            v["sections"][0]["parentId"] = json!(id.as_str());
            v["sections"][0]["subSections"] = json!([id.as_str()]);
        });
        assert!(validate_draft(&broken).contains(&IntegrityError::Cycle(id)));
    }

    #[test]
    fn test_detects_publication_order() {
        let d = edit(&draft(), |v| {
            v["publications"] = json!([
                {"id": "t1", "version": "2.0.0"},
                {"id": "t2", "version": "1.0.0"},
            ]);
        });
        assert_eq!(
            validate_draft(&d),
            vec![IntegrityError::PublicationOrder {
                previous: SchemaVersion::new(2, 0, 0),
                current: SchemaVersion::new(1, 0, 0),
            }]
        );
    }
}
