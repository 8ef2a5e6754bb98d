//! The template draft aggregate.
//!
//! [`TemplateDraft`] is the only public entry point for structural edits.
//! Sections live in one flat, insertion-ordered list; hierarchy is encoded by
//! `parent_id` on the child and the child's id in the parent's
//! `sub_sections`. Every method resolves ids and checks its preconditions
//! before touching state, so a failed call leaves the draft as it was.
//!
//! # Example
//!
//! ```
//! use product_schema_core::*;
//!
//! let mut draft = TemplateDraft::create(TemplateDraftProps {
//!     name: "Laptop".into(),
//!     description: "Portable computers".into(),
//!     sectors: vec!["ELECTRONICS".into()],
//!     organization_id: OrganizationId::from("org-1"),
//!     user_id: UserId::from("user-1"),
//! });
//!
//! let specs = DataSectionDraft::create(DataSectionDraftProps {
//!     name: "Specs".into(),
//!     section_type: SectionType::Group,
//!     layout: Layout::full_width(),
//!     granularity_level: Some(GranularityLevel::Model),
//! })
//! .unwrap();
//! let specs_id = specs.id().clone();
//! draft.add_section(specs).unwrap();
//!
//! let processor = DataFieldDraft::create(DataFieldDraftProps {
//!     name: "Processor".into(),
//!     field_type: DataFieldType::TextField,
//!     options: None,
//!     layout: Layout::full_width(),
//!     granularity_level: GranularityLevel::Model,
//! });
//! draft.add_data_field_to_section(&specs_id, processor).unwrap();
//!
//! let first = draft.publish(UserId::from("user-x")).unwrap();
//! assert_eq!(first.version().to_string(), "1.0.0");
//! let second = draft.publish(UserId::from("user-x")).unwrap();
//! assert_eq!(second.version().to_string(), "2.0.0");
//! assert_eq!(draft.publications().len(), 2);
//! ```

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NotFoundError, Result, ValidationError};
use crate::field::{DataFieldDraft, DataFieldModification};
use crate::ids::{DataFieldId, OrganizationId, SectionId, TemplateId, UserId};
use crate::section::{DataSectionDraft, SectionModification, shift};
use crate::template::Template;
use crate::types::{MoveDirection, SectionType};
use crate::version::SchemaVersion;

/// Record of one successful publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    /// Id of the template produced by the publication.
    pub id: TemplateId,
    pub version: SchemaVersion,
}

/// Input for [`TemplateDraft::create`].
#[derive(Debug, Clone)]
pub struct TemplateDraftProps {
    pub name: String,
    pub description: String,
    pub sectors: Vec<String>,
    pub organization_id: OrganizationId,
    pub user_id: UserId,
}

/// Mutable working copy of a product data model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDraft {
    id: TemplateId,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    sectors: Vec<String>,
    version: SchemaVersion,
    #[serde(default)]
    publications: Vec<Publication>,
    owned_by_organization_id: OrganizationId,
    created_by_user_id: UserId,
    #[serde(default)]
    sections: Vec<DataSectionDraft>,
}

impl TemplateDraft {
    /// Creates an empty draft at version `1.0.0`.
    pub fn create(props: TemplateDraftProps) -> Self {
        Self {
            id: TemplateId::generate(),
            name: props.name,
            description: props.description,
            sectors: props.sectors,
            version: SchemaVersion::INITIAL,
            publications: Vec::new(),
            owned_by_organization_id: props.organization_id,
            created_by_user_id: props.user_id,
            sections: Vec::new(),
        }
    }

    pub fn id(&self) -> &TemplateId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn sectors(&self) -> &[String] {
        &self.sectors
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    pub fn owned_by_organization_id(&self) -> &OrganizationId {
        &self.owned_by_organization_id
    }

    pub fn created_by_user_id(&self) -> &UserId {
        &self.created_by_user_id
    }

    /// Publication history, oldest first.
    pub fn publications(&self) -> &[Publication] {
        &self.publications
    }

    pub fn latest_publication(&self) -> Option<&Publication> {
        self.publications.last()
    }

    pub fn is_published(&self) -> bool {
        !self.publications.is_empty()
    }

    /// All sections in insertion order.
    pub fn sections(&self) -> &[DataSectionDraft] {
        &self.sections
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn find_section(&self, id: &SectionId) -> Option<&DataSectionDraft> {
        self.sections.iter().find(|s| &s.id == id)
    }

    /// Resolves `id` or fails with [`NotFoundError`].
    pub fn find_section_or_fail(
        &self,
        id: &SectionId,
    ) -> std::result::Result<&DataSectionDraft, NotFoundError> {
        self.find_section(id)
            .ok_or_else(|| NotFoundError::section(id))
    }

    /// Resolves `id` together with its parent, if it has one.
    pub fn find_section_with_parent(
        &self,
        id: &SectionId,
    ) -> Option<(&DataSectionDraft, Option<&DataSectionDraft>)> {
        let section = self.find_section(id)?;
        let parent = section
            .parent_id
            .as_ref()
            .and_then(|parent_id| self.find_section(parent_id));
        Some((section, parent))
    }

    /// Sections without a parent, in collection order.
    pub fn root_sections(&self) -> impl Iterator<Item = &DataSectionDraft> {
        self.sections.iter().filter(|s| s.parent_id.is_none())
    }

    /// Locates a field anywhere in the draft with its owning section.
    pub fn find_data_field(&self, id: &DataFieldId) -> Option<(&DataSectionDraft, &DataFieldDraft)> {
        self.sections
            .iter()
            .find_map(|section| section.find_data_field(id).map(|field| (section, field)))
    }

    /// Children of `id`, in the parent's `sub_sections` order.
    pub fn sub_sections_of(&self, id: &SectionId) -> Vec<&DataSectionDraft> {
        self.find_section(id)
            .map(|parent| {
                parent
                    .sub_sections
                    .iter()
                    .filter_map(|child| self.find_section(child))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn section_index(&self, id: &SectionId) -> std::result::Result<usize, NotFoundError> {
        self.sections
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| NotFoundError::section(id))
    }

    fn section_mut(&mut self, id: &SectionId) -> std::result::Result<&mut DataSectionDraft, NotFoundError> {
        let index = self.section_index(id)?;
        Ok(&mut self.sections[index])
    }

    /// Appends a section to the flat collection.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::RepeatableNotRoot`] if `section` is repeatable and
    ///   already carries a parent id.
    /// - [`ValidationError::DuplicateSection`] if the id is already in use.
    /// - [`ValidationError::UnlinkedParent`] if the section carries a parent
    ///   id that no section in the draft links back to.
    pub fn add_section(&mut self, section: DataSectionDraft) -> Result<()> {
        if section.section_type() == SectionType::Repeatable && section.parent_id.is_some() {
            return Err(ValidationError::RepeatableNotRoot.into());
        }
        if self.find_section(&section.id).is_some() {
            return Err(ValidationError::DuplicateSection(section.id).into());
        }
        if let Some(parent_id) = &section.parent_id {
            let linked = self
                .find_section(parent_id)
                .is_some_and(|parent| parent.sub_sections.contains(&section.id));
            if !linked {
                return Err(ValidationError::UnlinkedParent {
                    parent: parent_id.clone(),
                    child: section.id.clone(),
                }
                .into());
            }
        }
        self.sections.push(section);
        Ok(())
    }

    /// Adds `child` below the section `parent_id`.
    ///
    /// A child without a granularity level inherits the parent's level; a
    /// child whose level differs from the parent's is rejected, as is a
    /// repeatable child.
    pub fn add_sub_section(&mut self, parent_id: &SectionId, mut child: DataSectionDraft) -> Result<()> {
        let parent_index = self.section_index(parent_id)?;
        if self.find_section(&child.id).is_some() {
            return Err(ValidationError::DuplicateSection(child.id).into());
        }
        self.sections[parent_index].add_sub_section(&mut child)?;
        self.sections.push(child);
        Ok(())
    }

    /// Deletes a section and its whole subtree, detaching it from its parent.
    pub fn delete_section(&mut self, id: &SectionId) -> Result<()> {
        let index = self.section_index(id)?;
        let parent_index = self.sections[index]
            .parent_id
            .as_ref()
            .and_then(|parent_id| self.sections.iter().position(|s| &s.id == parent_id));

        if let Some((parent, section)) =
            parent_index.and_then(|parent_index| pair_mut(&mut self.sections, parent_index, index))
        {
            parent.delete_sub_section(section)?;
        }

        let mut doomed = Vec::new();
        let mut seen = HashSet::new();
        self.collect_subtree(id, &mut doomed, &mut seen);
        self.sections.retain(|s| !seen.contains(&s.id));

        debug!(
            draft = %self.id,
            section = %id,
            removed = doomed.len(),
            "deleted section subtree"
        );
        Ok(())
    }

    /// Pre-order walk over `id` and its descendants, based on the
    /// `sub_sections` lists as they are right now.
    fn collect_subtree(
        &self,
        id: &SectionId,
        order: &mut Vec<SectionId>,
        seen: &mut HashSet<SectionId>,
    ) {
        if !seen.insert(id.clone()) {
            return;
        }
        order.push(id.clone());
        if let Some(section) = self.find_section(id) {
            for child in &section.sub_sections {
                self.collect_subtree(child, order, seen);
            }
        }
    }

    /// Renames a section and/or modifies its layout.
    pub fn modify_section(&mut self, id: &SectionId, modification: SectionModification) -> Result<()> {
        let section = self.section_mut(id)?;
        if let Some(patch) = modification.layout {
            section.modify_layout(patch)?;
        }
        if let Some(name) = modification.name {
            section.rename(name);
        }
        Ok(())
    }

    /// Moves a section one step among its siblings.
    ///
    /// Children are reordered inside the parent's `sub_sections`; root
    /// sections are reordered relative to the other roots in the flat list.
    pub fn move_section(&mut self, id: &SectionId, direction: MoveDirection) -> Result<()> {
        let index = self.section_index(id)?;
        if let Some(parent_id) = self.sections[index].parent_id.clone() {
            let parent = self.section_mut(&parent_id)?;
            if !parent.move_sub_section(id, direction) {
                return Err(ValidationError::SubSectionNotPresent {
                    parent: parent_id,
                    child: id.clone(),
                }
                .into());
            }
            return Ok(());
        }

        let roots: Vec<usize> = self
            .sections
            .iter()
            .enumerate()
            .filter(|(_, s)| s.parent_id.is_none())
            .map(|(i, _)| i)
            .collect();
        let Some(position) = roots.iter().position(|&i| i == index) else {
            return Ok(());
        };
        let mut order = roots.clone();
        shift(&mut order, position, direction);
        if let Some((&a, &b)) = roots
            .iter()
            .zip(order.iter())
            .find(|(before, after)| before != after)
        {
            self.sections.swap(a, b);
        }
        Ok(())
    }

    pub fn add_data_field_to_section(
        &mut self,
        section_id: &SectionId,
        field: DataFieldDraft,
    ) -> Result<()> {
        let index = self.section_index(section_id)?;
        if self.find_data_field(field.id()).is_some() {
            return Err(ValidationError::DuplicateDataField(field.id().to_string()).into());
        }
        self.sections[index].add_data_field(field)?;
        Ok(())
    }

    pub fn delete_data_field_of_section(
        &mut self,
        section_id: &SectionId,
        field_id: &DataFieldId,
    ) -> Result<DataFieldDraft> {
        Ok(self.section_mut(section_id)?.delete_data_field(field_id)?)
    }

    pub fn modify_data_field(
        &mut self,
        section_id: &SectionId,
        field_id: &DataFieldId,
        modification: DataFieldModification,
    ) -> Result<()> {
        self.section_mut(section_id)?
            .modify_data_field(field_id, modification)
    }

    pub fn move_data_field(
        &mut self,
        section_id: &SectionId,
        field_id: &DataFieldId,
        direction: MoveDirection,
    ) -> Result<()> {
        self.section_mut(section_id)?
            .move_data_field(field_id, direction)?;
        Ok(())
    }

    /// Version the next call to [`publish`](Self::publish) will assign.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::VersionOverflow`] if the latest major
    /// version cannot be incremented.
    pub fn next_version(&self) -> Result<SchemaVersion> {
        match self.publications.last() {
            Some(latest) => Ok(latest.version.increment_major()?),
            None => Ok(SchemaVersion::INITIAL),
        }
    }

    /// Snapshots the draft into a new immutable [`Template`].
    ///
    /// The template gets a fresh id and the next major version; section and
    /// field ids are kept. A publication record is appended to the draft,
    /// which otherwise stays untouched and editable.
    ///
    /// # Errors
    ///
    /// Fails without touching the draft if the next version cannot be
    /// computed (see [`next_version`](Self::next_version)).
    pub fn publish(&mut self, created_by_user_id: UserId) -> Result<Template> {
        let version = self.next_version()?;
        let template = Template {
            id: TemplateId::generate(),
            name: self.name.clone(),
            description: self.description.clone(),
            sectors: self.sectors.clone(),
            version,
            owned_by_organization_id: self.owned_by_organization_id.clone(),
            created_by_user_id,
            created_at: Utc::now(),
            sections: self.sections.iter().map(DataSectionDraft::publish).collect(),
        };
        self.publications.push(Publication {
            id: template.id.clone(),
            version,
        });
        debug!(
            draft = %self.id,
            template = %template.id,
            %version,
            sections = template.sections.len(),
            "published template draft"
        );
        Ok(template)
    }
}

/// Borrows two distinct sections mutably. Returns `None` when `a == b`.
fn pair_mut(
    sections: &mut [DataSectionDraft],
    a: usize,
    b: usize,
) -> Option<(&mut DataSectionDraft, &mut DataSectionDraft)> {
    if a < b {
        let (left, right) = sections.split_at_mut(b);
        Some((&mut left[a], &mut right[0]))
    } else if a > b {
        let (left, right) = sections.split_at_mut(a);
        Some((&mut right[0], &mut left[b]))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DraftError, ErrorKind};
    use crate::field::DataFieldDraftProps;
    use crate::layout::{Breakpoints, Layout, LayoutPatch};
    use crate::section::DataSectionDraftProps;
    use crate::types::{DataFieldType, GranularityLevel};

    fn draft() -> TemplateDraft {
        TemplateDraft::create(TemplateDraftProps {
            name: "Laptop".into(),
            description: "Portable computers".into(),
            sectors: vec!["ELECTRONICS".into()],
            organization_id: OrganizationId::from("org-1"),
            user_id: UserId::from("user-1"),
        })
    }

    fn group(name: &str, level: Option<GranularityLevel>) -> DataSectionDraft {
        DataSectionDraft::create(DataSectionDraftProps {
            name: name.into(),
            section_type: SectionType::Group,
            layout: Layout::full_width(),
            granularity_level: level,
        })
        .unwrap()
    }

    fn repeatable(name: &str) -> DataSectionDraft {
        DataSectionDraft::create(DataSectionDraftProps {
            name: name.into(),
            section_type: SectionType::Repeatable,
            layout: Layout::full_width(),
            granularity_level: Some(GranularityLevel::Item),
        })
        .unwrap()
    }

    fn text_field(name: &str) -> DataFieldDraft {
        DataFieldDraft::create(DataFieldDraftProps {
            name: name.into(),
            field_type: DataFieldType::TextField,
            options: None,
            layout: Layout::full_width(),
            granularity_level: GranularityLevel::Model,
        })
    }

    /// Adds a root group and returns its id.
    fn add_root(d: &mut TemplateDraft, name: &str) -> SectionId {
        let s = group(name, None);
        let id = s.id().clone();
        d.add_section(s).unwrap();
        id
    }

    fn add_child(d: &mut TemplateDraft, parent: &SectionId, name: &str) -> SectionId {
        let s = group(name, None);
        let id = s.id().clone();
        d.add_sub_section(parent, s).unwrap();
        id
    }

    fn names(d: &TemplateDraft) -> Vec<&str> {
        d.sections().iter().map(|s| s.name()).collect()
    }

    #[test]
    fn test_new_draft_defaults() {
        let d = draft();
        assert_eq!(d.version().to_string(), "1.0.0");
        assert!(d.publications().is_empty());
        assert!(!d.is_published());
        assert!(d.sections().is_empty());
    }

    #[test]
    fn test_repeatable_with_parent_rejected_at_root() {
        let mut d = draft();
        let section = repeatable("Batteries").with_parent_id(SectionId::from("p"));
        let err = d.add_section(section).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Repeater section can only be added as root section"
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(d.sections().is_empty());
    }

    #[test]
    fn test_group_with_dangling_parent_rejected() {
        let mut d = draft();
        let orphan = group("Orphan", None).with_parent_id(SectionId::from("ghost"));
        let orphan_id = orphan.id().clone();
        let err = d.add_section(orphan).unwrap_err();
        assert_eq!(
            err,
            DraftError::Validation(ValidationError::UnlinkedParent {
                parent: SectionId::from("ghost"),
                child: orphan_id,
            })
        );
        assert!(d.sections().is_empty());

        let a = add_root(&mut d, "A");
        let stray = group("Stray", None).with_parent_id(a.clone());
        let err = d.add_section(stray).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(d.find_section(&a).unwrap().sub_sections().is_empty());
        assert!(crate::validate::validate_draft(&d).is_empty());
    }

    #[test]
    fn test_repeatable_without_parent_accepted_at_root() {
        let mut d = draft();
        d.add_section(repeatable("Batteries")).unwrap();
        assert_eq!(d.sections().len(), 1);
    }

    #[test]
    fn test_add_duplicate_section_rejected() {
        let mut d = draft();
        let s = group("Specs", None);
        d.add_section(s.clone()).unwrap();
        assert!(matches!(
            d.add_section(s),
            Err(crate::DraftError::Validation(ValidationError::DuplicateSection(_)))
        ));
    }

    #[test]
    fn test_add_sub_section_links_both_sides() {
        let mut d = draft();
        let parent = add_root(&mut d, "Specs");
        let child = add_child(&mut d, &parent, "Display");

        let (c, p) = d.find_section_with_parent(&child).unwrap();
        assert_eq!(c.parent_id(), Some(&parent));
        assert_eq!(p.unwrap().sub_sections(), &[child.clone()]);
        assert_eq!(d.sections().len(), 2);
        assert_eq!(d.root_sections().count(), 1);
        assert_eq!(d.sub_sections_of(&parent)[0].id(), &child);
    }

    #[test]
    fn test_add_sub_section_unknown_parent() {
        let mut d = draft();
        let err = d
            .add_sub_section(&SectionId::from("missing"), group("x", None))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(d.sections().is_empty());
    }

    #[test]
    fn test_repeatable_sub_section_rejected_without_mutation() {
        let mut d = draft();
        let parent = add_root(&mut d, "Specs");
        let err = d.add_sub_section(&parent, repeatable("Cells")).unwrap_err();
        assert_eq!(
            err,
            crate::DraftError::Validation(ValidationError::RepeatableNotRoot)
        );
        assert!(d.find_section(&parent).unwrap().sub_sections().is_empty());
        assert_eq!(d.sections().len(), 1);
    }

    #[test]
    fn test_granularity_inherited_from_parent() {
        let mut d = draft();
        let parent = group("Specs", Some(GranularityLevel::Model));
        let parent_id = parent.id().clone();
        d.add_section(parent).unwrap();
        let child = add_child(&mut d, &parent_id, "Display");
        assert_eq!(
            d.find_section(&child).unwrap().granularity_level(),
            Some(GranularityLevel::Model)
        );
    }

    #[test]
    fn test_granularity_mismatch_rejected() {
        let mut d = draft();
        let parent = group("Specs", Some(GranularityLevel::Model));
        let parent_id = parent.id().clone();
        d.add_section(parent).unwrap();

        let child = group("Serial", Some(GranularityLevel::Item));
        let child_id = child.id().clone();
        let err = d.add_sub_section(&parent_id, child).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(parent_id.as_str()));
        assert!(message.contains(child_id.as_str()));
        assert!(message.contains("MODEL"));
        assert!(message.contains("ITEM"));
        assert_eq!(d.sections().len(), 1);
    }

    #[test]
    fn test_child_level_kept_when_parent_has_none() {
        let mut d = draft();
        let parent = add_root(&mut d, "Specs");
        let child = group("Serial", Some(GranularityLevel::Item));
        let child_id = child.id().clone();
        d.add_sub_section(&parent, child).unwrap();
        assert_eq!(
            d.find_section(&child_id).unwrap().granularity_level(),
            Some(GranularityLevel::Item)
        );
    }

    #[test]
    fn test_cascade_delete_removes_subtree_only() {
        let mut d = draft();
        let a = add_root(&mut d, "A");
        let b = add_child(&mut d, &a, "B");
        let c = add_child(&mut d, &b, "C");
        let _d1 = add_child(&mut d, &c, "D");
        let e = add_child(&mut d, &a, "E");
        let f = add_root(&mut d, "F");

        d.delete_section(&b).unwrap();

        assert_eq!(names(&d), vec!["A", "E", "F"]);
        assert_eq!(d.find_section(&a).unwrap().sub_sections(), &[e.clone()]);
        assert!(d.find_section(&f).unwrap().sub_sections().is_empty());
        assert_eq!(d.find_section(&e).unwrap().parent_id(), Some(&a));
    }

    #[test]
    fn test_delete_root_removes_everything_below() {
        let mut d = draft();
        let a = add_root(&mut d, "A");
        let b = add_child(&mut d, &a, "B");
        add_child(&mut d, &b, "C");
        d.delete_section(&a).unwrap();
        assert!(d.sections().is_empty());
    }

    #[test]
    fn test_delete_unknown_section() {
        let mut d = draft();
        add_root(&mut d, "A");
        let err = d.delete_section(&SectionId::from("ghost")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(d.sections().len(), 1);
    }

    #[test]
    fn test_modify_section_rejects_bad_layout_atomically() {
        let mut d = draft();
        let a = add_root(&mut d, "A");
        let err = d
            .modify_section(
                &a,
                SectionModification {
                    name: Some("Renamed".into()),
                    layout: Some(LayoutPatch {
                        col_start: Some(Breakpoints::sm(13)),
                        ..Default::default()
                    }),
                },
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(d.find_section(&a).unwrap().name(), "A");

        d.modify_section(
            &a,
            SectionModification {
                name: Some("Renamed".into()),
                layout: Some(LayoutPatch {
                    col_start: Some(Breakpoints::sm(2)),
                    ..Default::default()
                }),
            },
        )
        .unwrap();
        let section = d.find_section(&a).unwrap();
        assert_eq!(section.name(), "Renamed");
        assert_eq!(section.layout().col_start().sm, Some(2));
    }

    #[test]
    fn test_field_operations_delegate() {
        let mut d = draft();
        let a = add_root(&mut d, "A");
        let f = text_field("Processor");
        let fid = f.id().clone();
        d.add_data_field_to_section(&a, f).unwrap();

        d.modify_data_field(
            &a,
            &fid,
            DataFieldModification {
                name: Some("CPU".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(d.find_section(&a).unwrap().data_fields()[0].name(), "CPU");

        let err = d
            .delete_data_field_of_section(&a, &DataFieldId::from("nope"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let removed = d.delete_data_field_of_section(&a, &fid).unwrap();
        assert_eq!(removed.id(), &fid);

        let err = d
            .add_data_field_to_section(&SectionId::from("nope"), text_field("x"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_same_field_in_two_sections_rejected() {
        let mut d = draft();
        let a = add_root(&mut d, "A");
        let b = add_root(&mut d, "B");
        let f = text_field("Shared");
        let fid = f.id().clone();
        d.add_data_field_to_section(&a, f.clone()).unwrap();

        let err = d.add_data_field_to_section(&b, f).unwrap_err();
        assert_eq!(
            err,
            DraftError::Validation(ValidationError::DuplicateDataField(fid.to_string()))
        );
        assert!(d.find_section(&b).unwrap().data_fields().is_empty());
        assert_eq!(d.find_data_field(&fid).unwrap().0.id(), &a);
        assert!(crate::validate::validate_draft(&d).is_empty());
    }

    #[test]
    fn test_move_root_sections_skips_children() {
        let mut d = draft();
        let a = add_root(&mut d, "A");
        add_child(&mut d, &a, "A1");
        let b = add_root(&mut d, "B");

        d.move_section(&b, MoveDirection::Up).unwrap();
        let roots: Vec<_> = d.root_sections().map(|s| s.name()).collect();
        assert_eq!(roots, vec!["B", "A"]);

        d.move_section(&b, MoveDirection::Up).unwrap();
        let roots: Vec<_> = d.root_sections().map(|s| s.name()).collect();
        assert_eq!(roots, vec!["B", "A"]);
    }

    #[test]
    fn test_move_child_section() {
        let mut d = draft();
        let a = add_root(&mut d, "A");
        let x = add_child(&mut d, &a, "X");
        let y = add_child(&mut d, &a, "Y");
        d.move_section(&x, MoveDirection::Down).unwrap();
        assert_eq!(d.find_section(&a).unwrap().sub_sections(), &[y, x]);
    }

    #[test]
    fn test_publish_versions_and_history() {
        let mut d = draft();
        let t1 = d.publish(UserId::from("u")).unwrap();
        let t2 = d.publish(UserId::from("u")).unwrap();
        let t3 = d.publish(UserId::from("u")).unwrap();

        assert_eq!(t1.version().to_string(), "1.0.0");
        assert_eq!(t2.version().to_string(), "2.0.0");
        assert_eq!(t3.version().to_string(), "3.0.0");
        assert_eq!(
            d.publications(),
            &[
                Publication { id: t1.id().clone(), version: t1.version() },
                Publication { id: t2.id().clone(), version: t2.version() },
                Publication { id: t3.id().clone(), version: t3.version() },
            ]
        );
        assert_eq!(d.next_version().unwrap().to_string(), "4.0.0");
    }

    #[test]
    fn test_publish_increments_from_latest_publication() {
        let mut d = draft();
        d.publications.push(Publication {
            id: TemplateId::from("legacy"),
            version: "4.2.1".parse().unwrap(),
        });
        let t = d.publish(UserId::from("u")).unwrap();
        assert_eq!(t.version().to_string(), "5.0.0");
    }

    #[test]
    fn test_publish_at_maximum_version_fails_cleanly() {
        let mut d = draft();
        let last = SchemaVersion::new(u64::MAX, 0, 0);
        d.publications.push(Publication {
            id: TemplateId::from("last"),
            version: last,
        });
        let err = d.publish(UserId::from("u")).unwrap_err();
        assert_eq!(
            err,
            DraftError::Validation(ValidationError::VersionOverflow(last.to_string()))
        );
        assert_eq!(d.publications().len(), 1);
    }

    #[test]
    fn test_publish_preserves_ids_and_metadata() {
        let mut d = draft();
        let a = add_root(&mut d, "A");
        let b = add_child(&mut d, &a, "B");
        let f = text_field("F");
        let fid = f.id().clone();
        d.add_data_field_to_section(&b, f).unwrap();

        let t = d.publish(UserId::from("publisher")).unwrap();
        assert_ne!(t.id(), d.id());
        assert_eq!(t.name(), "Laptop");
        assert_eq!(t.description(), "Portable computers");
        assert_eq!(t.sectors(), &["ELECTRONICS".to_string()]);
        assert_eq!(t.created_by_user_id(), &UserId::from("publisher"));
        assert_eq!(t.owned_by_organization_id(), d.owned_by_organization_id());

        let draft_ids: Vec<_> = d.sections().iter().map(|s| s.id().clone()).collect();
        let template_ids: Vec<_> = t.sections().iter().map(|s| s.id().clone()).collect();
        assert_eq!(draft_ids, template_ids);
        let (section, field) = t.find_data_field(&fid).unwrap();
        assert_eq!(section.id(), &b);
        assert_eq!(field.name(), "F");
        assert_eq!(t.sub_sections_of(&a)[0].id(), &b);
    }

    #[test]
    fn test_draft_stays_editable_after_publish() {
        let mut d = draft();
        let a = add_root(&mut d, "A");
        let before = d.publish(UserId::from("u")).unwrap();
        d.modify_section(
            &a,
            SectionModification {
                name: Some("Changed".into()),
                layout: None,
            },
        )
        .unwrap();
        assert_eq!(before.sections()[0].name(), "A");
        assert_eq!(d.find_section(&a).unwrap().name(), "Changed");
        assert_eq!(d.version().to_string(), "1.0.0");
    }
}
