//! Leaf schema elements of a draft.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ids::DataFieldId;
use crate::layout::{Layout, LayoutPatch};
use crate::merge::{DataFieldOptions, merge_options};
use crate::template::DataField;
use crate::types::{DataFieldType, GranularityLevel};

/// Input for [`DataFieldDraft::create`].
#[derive(Debug, Clone)]
pub struct DataFieldDraftProps {
    pub name: String,
    pub field_type: DataFieldType,
    pub options: Option<DataFieldOptions>,
    pub layout: Layout,
    pub granularity_level: GranularityLevel,
}

/// Partial update applied by [`DataFieldDraft::modify`].
#[derive(Debug, Clone, Default)]
pub struct DataFieldModification {
    pub name: Option<String>,
    pub options: Option<DataFieldOptions>,
    pub layout: Option<LayoutPatch>,
}

/// A typed, named value slot within a section.
///
/// The `id` and `type` never change; the id survives every publication so
/// that data recorded against it stays valid across template versions.
///
/// # Examples
///
/// ```
/// use product_schema_core::*;
///
/// let mut field = DataFieldDraft::create(DataFieldDraftProps {
///     name: "Weight".into(),
///     field_type: DataFieldType::NumericField,
///     options: None,
///     layout: Layout::full_width(),
///     granularity_level: GranularityLevel::Model,
/// });
/// field.rename("Net weight");
///
/// let published = field.publish();
/// assert_eq!(published.id(), field.id());
/// assert_eq!(published.name(), "Net weight");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFieldDraft {
    id: DataFieldId,
    name: String,
    #[serde(rename = "type")]
    field_type: DataFieldType,
    #[serde(default)]
    options: DataFieldOptions,
    layout: Layout,
    granularity_level: GranularityLevel,
}

impl DataFieldDraft {
    /// Creates a field with a fresh identity. Options default to empty.
    pub fn create(props: DataFieldDraftProps) -> Self {
        Self {
            id: DataFieldId::generate(),
            name: props.name,
            field_type: props.field_type,
            options: props.options.unwrap_or_default(),
            layout: props.layout,
            granularity_level: props.granularity_level,
        }
    }

    pub fn id(&self) -> &DataFieldId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> DataFieldType {
        self.field_type
    }

    pub fn options(&self) -> &DataFieldOptions {
        &self.options
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn granularity_level(&self) -> GranularityLevel {
        self.granularity_level
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Deep-merges `options` into the current options. New keys win.
    pub fn merge_options(&mut self, options: DataFieldOptions) {
        merge_options(&mut self.options, options);
    }

    pub fn modify_layout(&mut self, patch: LayoutPatch) -> Result<(), ValidationError> {
        self.layout.modify(patch)
    }

    /// Applies the supplied parts of `modification`.
    ///
    /// The layout patch is the only fallible part and is applied first, so a
    /// rejected patch leaves the name and options unchanged as well.
    pub fn modify(&mut self, modification: DataFieldModification) -> Result<(), ValidationError> {
        if let Some(patch) = modification.layout {
            self.layout.modify(patch)?;
        }
        if let Some(name) = modification.name {
            self.rename(name);
        }
        if let Some(options) = modification.options {
            self.merge_options(options);
        }
        Ok(())
    }

    /// Snapshots the field for a published template, keeping its identity.
    pub fn publish(&self) -> DataField {
        DataField {
            id: self.id.clone(),
            name: self.name.clone(),
            field_type: self.field_type,
            options: self.options.clone(),
            layout: self.layout,
            granularity_level: self.granularity_level,
        }
    }
}
