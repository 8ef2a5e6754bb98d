//! Section nodes of the draft tree.
//!
//! A section owns its data fields but only *references* its children and its
//! parent by id. The owning [`TemplateDraft`](crate::TemplateDraft) keeps all
//! sections in one flat list, and the tree is rebuilt by following
//! `parent_id` / `sub_sections`.

use serde::{Deserialize, Serialize};

use crate::error::{DraftError, NotFoundError, ValidationError};
use crate::field::{DataFieldDraft, DataFieldModification};
use crate::ids::{DataFieldId, SectionId};
use crate::layout::{Layout, LayoutPatch};
use crate::template::DataSection;
use crate::types::{GranularityLevel, MoveDirection, SectionType};

/// Input for [`DataSectionDraft::create`].
#[derive(Debug, Clone)]
pub struct DataSectionDraftProps {
    pub name: String,
    pub section_type: SectionType,
    pub layout: Layout,
    pub granularity_level: Option<GranularityLevel>,
}

/// Partial update applied by
/// [`TemplateDraft::modify_section`](crate::TemplateDraft::modify_section).
#[derive(Debug, Clone, Default)]
pub struct SectionModification {
    pub name: Option<String>,
    pub layout: Option<LayoutPatch>,
}

/// A group or repeatable container of data fields.
///
/// # Examples
///
/// ```
/// use product_schema_core::*;
///
/// // Repeatable sections must declare a granularity level.
/// let err = DataSectionDraft::create(DataSectionDraftProps {
///     name: "Materials".into(),
///     section_type: SectionType::Repeatable,
///     layout: Layout::full_width(),
///     granularity_level: None,
/// });
/// assert!(err.is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSectionDraft {
    pub(crate) id: SectionId,
    name: String,
    #[serde(rename = "type")]
    section_type: SectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) parent_id: Option<SectionId>,
    #[serde(default)]
    pub(crate) sub_sections: Vec<SectionId>,
    layout: Layout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) granularity_level: Option<GranularityLevel>,
    #[serde(default)]
    data_fields: Vec<DataFieldDraft>,
}

impl DataSectionDraft {
    /// Creates a detached section with a fresh identity.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingGranularityLevel`] for a repeatable
    /// section without a granularity level.
    pub fn create(props: DataSectionDraftProps) -> Result<Self, ValidationError> {
        if props.section_type == SectionType::Repeatable && props.granularity_level.is_none() {
            return Err(ValidationError::MissingGranularityLevel(props.name));
        }
        Ok(Self {
            id: SectionId::generate(),
            name: props.name,
            section_type: props.section_type,
            parent_id: None,
            sub_sections: Vec::new(),
            layout: props.layout,
            granularity_level: props.granularity_level,
            data_fields: Vec::new(),
        })
    }

    pub fn id(&self) -> &SectionId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn section_type(&self) -> SectionType {
        self.section_type
    }

    pub fn parent_id(&self) -> Option<&SectionId> {
        self.parent_id.as_ref()
    }

    /// Child section ids in display order.
    pub fn sub_sections(&self) -> &[SectionId] {
        &self.sub_sections
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn granularity_level(&self) -> Option<GranularityLevel> {
        self.granularity_level
    }

    pub fn data_fields(&self) -> &[DataFieldDraft] {
        &self.data_fields
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Sets the parent reference on a detached section.
    ///
    /// This does not register the section with the parent.
    /// [`TemplateDraft::add_section`](crate::TemplateDraft::add_section)
    /// rejects a section whose parent does not already list it; use
    /// [`TemplateDraft::add_sub_section`](crate::TemplateDraft::add_sub_section)
    /// to nest sections.
    pub fn with_parent_id(mut self, parent_id: SectionId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn modify_layout(&mut self, patch: LayoutPatch) -> Result<(), ValidationError> {
        self.layout.modify(patch)
    }

    pub fn find_data_field(&self, field_id: &DataFieldId) -> Option<&DataFieldDraft> {
        self.data_fields.iter().find(|f| f.id() == field_id)
    }

    pub fn find_data_field_mut(&mut self, field_id: &DataFieldId) -> Option<&mut DataFieldDraft> {
        self.data_fields.iter_mut().find(|f| f.id() == field_id)
    }

    fn data_field_index(&self, field_id: &DataFieldId) -> Result<usize, NotFoundError> {
        self.data_fields
            .iter()
            .position(|f| f.id() == field_id)
            .ok_or_else(|| NotFoundError::data_field(field_id))
    }

    /// Appends a data field.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateDataField`] if a field with the
    /// same id is already present.
    pub fn add_data_field(&mut self, field: DataFieldDraft) -> Result<(), ValidationError> {
        if self.find_data_field(field.id()).is_some() {
            return Err(ValidationError::DuplicateDataField(field.id().to_string()));
        }
        self.data_fields.push(field);
        Ok(())
    }

    /// Removes and returns the field with `field_id`.
    pub fn delete_data_field(
        &mut self,
        field_id: &DataFieldId,
    ) -> Result<DataFieldDraft, NotFoundError> {
        let index = self.data_field_index(field_id)?;
        Ok(self.data_fields.remove(index))
    }

    /// Renames, merges options and/or modifies the layout of a field.
    pub fn modify_data_field(
        &mut self,
        field_id: &DataFieldId,
        modification: DataFieldModification,
    ) -> Result<(), DraftError> {
        let index = self.data_field_index(field_id)?;
        self.data_fields[index].modify(modification)?;
        Ok(())
    }

    /// Swaps a field with its neighbour. Moving past either end is a no-op.
    pub fn move_data_field(
        &mut self,
        field_id: &DataFieldId,
        direction: MoveDirection,
    ) -> Result<(), NotFoundError> {
        let index = self.data_field_index(field_id)?;
        shift(&mut self.data_fields, index, direction);
        Ok(())
    }

    /// Links `child` below this section.
    ///
    /// Only reachable through the aggregate. Re-checks the root-only and
    /// granularity rules so the link can never break them, and lets a child
    /// without a granularity level inherit this section's level.
    pub(crate) fn add_sub_section(
        &mut self,
        child: &mut DataSectionDraft,
    ) -> Result<(), ValidationError> {
        if child.section_type == SectionType::Repeatable {
            return Err(ValidationError::RepeatableNotRoot);
        }
        if let (Some(parent_level), Some(child_level)) =
            (self.granularity_level, child.granularity_level)
        {
            if parent_level != child_level {
                return Err(ValidationError::GranularityMismatch {
                    parent_id: self.id.clone(),
                    parent_level,
                    child_id: child.id.clone(),
                    child_level,
                });
            }
        }
        if child.granularity_level.is_none() {
            child.granularity_level = self.granularity_level;
        }
        self.sub_sections.push(child.id.clone());
        child.parent_id = Some(self.id.clone());
        Ok(())
    }

    /// Unlinks `child` from this section, clears its parent reference and
    /// hands the detached child back.
    pub(crate) fn delete_sub_section<'c>(
        &mut self,
        child: &'c mut DataSectionDraft,
    ) -> Result<&'c mut DataSectionDraft, ValidationError> {
        let index = self
            .sub_sections
            .iter()
            .position(|id| id == &child.id)
            .ok_or_else(|| ValidationError::SubSectionNotPresent {
                parent: self.id.clone(),
                child: child.id.clone(),
            })?;
        self.sub_sections.remove(index);
        child.parent_id = None;
        Ok(child)
    }

    /// Reorders a child id within `sub_sections`. Returns `false` if the id
    /// is not a child of this section.
    pub(crate) fn move_sub_section(&mut self, child_id: &SectionId, direction: MoveDirection) -> bool {
        match self.sub_sections.iter().position(|id| id == child_id) {
            Some(index) => {
                shift(&mut self.sub_sections, index, direction);
                true
            }
            None => false,
        }
    }

    /// Snapshots the section and its fields, keeping every identity.
    pub fn publish(&self) -> DataSection {
        DataSection {
            id: self.id.clone(),
            name: self.name.clone(),
            section_type: self.section_type,
            parent_id: self.parent_id.clone(),
            sub_sections: self.sub_sections.clone(),
            layout: self.layout,
            granularity_level: self.granularity_level,
            data_fields: self.data_fields.iter().map(DataFieldDraft::publish).collect(),
        }
    }
}

/// Swaps `items[index]` with its neighbour in `direction`, if any.
pub(crate) fn shift<T>(items: &mut [T], index: usize, direction: MoveDirection) {
    match direction {
        MoveDirection::Up if index > 0 => items.swap(index, index - 1),
        MoveDirection::Down if index + 1 < items.len() => items.swap(index, index + 1),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::DataFieldDraftProps;
    use crate::types::DataFieldType;

    fn section(name: &str, level: Option<GranularityLevel>) -> DataSectionDraft {
        DataSectionDraft::create(DataSectionDraftProps {
            name: name.into(),
            section_type: SectionType::Group,
            layout: Layout::full_width(),
            granularity_level: level,
        })
        .unwrap()
    }

    fn field(name: &str) -> DataFieldDraft {
        DataFieldDraft::create(DataFieldDraftProps {
            name: name.into(),
            field_type: DataFieldType::TextField,
            options: None,
            layout: Layout::full_width(),
            granularity_level: GranularityLevel::Model,
        })
    }

    #[test]
    fn test_repeatable_requires_granularity() {
        let err = DataSectionDraft::create(DataSectionDraftProps {
            name: "Parts".into(),
            section_type: SectionType::Repeatable,
            layout: Layout::full_width(),
            granularity_level: None,
        })
        .unwrap_err();
        assert_eq!(err, ValidationError::MissingGranularityLevel("Parts".into()));

        assert!(
            DataSectionDraft::create(DataSectionDraftProps {
                name: "Parts".into(),
                section_type: SectionType::Repeatable,
                layout: Layout::full_width(),
                granularity_level: Some(GranularityLevel::Item),
            })
            .is_ok()
        );
    }

    #[test]
    fn test_delete_unknown_field_is_not_found() {
        let mut s = section("Specs", None);
        let err = s.delete_data_field(&DataFieldId::from("nope")).unwrap_err();
        assert_eq!(err.entity, "data field");
    }

    #[test]
    fn test_modify_unknown_field_is_not_found() {
        let mut s = section("Specs", None);
        let err = s
            .modify_data_field(&DataFieldId::from("nope"), DataFieldModification::default())
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::NotFound);
    }

    #[test]
    fn test_add_and_delete_field() {
        let mut s = section("Specs", None);
        let f = field("Processor");
        let id = f.id().clone();
        s.add_data_field(f.clone()).unwrap();
        assert_eq!(
            s.add_data_field(f),
            Err(ValidationError::DuplicateDataField(id.to_string()))
        );
        let removed = s.delete_data_field(&id).unwrap();
        assert_eq!(removed.name(), "Processor");
        assert!(s.data_fields().is_empty());
    }

    #[test]
    fn test_move_data_field() {
        let mut s = section("Specs", None);
        let a = field("a");
        let b = field("b");
        let a_id = a.id().clone();
        s.add_data_field(a).unwrap();
        s.add_data_field(b).unwrap();

        s.move_data_field(&a_id, MoveDirection::Up).unwrap();
        assert_eq!(s.data_fields()[0].name(), "a");

        s.move_data_field(&a_id, MoveDirection::Down).unwrap();
        let names: Vec<_> = s.data_fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn test_sub_section_link_is_symmetric() {
        let mut parent = section("Parent", Some(GranularityLevel::Item));
        let mut child = section("Child", None);

        parent.add_sub_section(&mut child).unwrap();
        assert_eq!(parent.sub_sections(), &[child.id().clone()]);
        assert_eq!(child.parent_id(), Some(parent.id()));
        assert_eq!(child.granularity_level(), Some(GranularityLevel::Item));

        let detached = parent.delete_sub_section(&mut child).unwrap();
        assert!(detached.is_root());
        assert!(parent.sub_sections().is_empty());
        assert!(child.parent_id().is_none());
    }

    #[test]
    fn test_delete_sub_section_not_present() {
        let mut parent = section("Parent", None);
        let mut stranger = section("Stranger", None);
        let err = parent.delete_sub_section(&mut stranger).unwrap_err();
        assert!(matches!(err, ValidationError::SubSectionNotPresent { .. }));
    }

    #[test]
    fn test_publish_serializes_fields() {
        let mut s = section("Specs", Some(GranularityLevel::Model));
        s.add_data_field(field("Processor")).unwrap();
        let published = s.publish();
        assert_eq!(published.id(), s.id());
        assert_eq!(published.data_fields()[0].id(), s.data_fields()[0].id());
    }
}
