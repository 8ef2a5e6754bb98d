//! Published, immutable template artifacts.
//!
//! A [`Template`] is produced by
//! [`TemplateDraft::publish`](crate::TemplateDraft::publish) and only exposes
//! read accessors. Section and field identities are the same as in the draft
//! at publish time, so data values keyed by those ids stay valid from one
//! template version to the next.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{DataFieldId, OrganizationId, SectionId, TemplateId, UserId};
use crate::layout::Layout;
use crate::merge::DataFieldOptions;
use crate::types::{DataFieldType, GranularityLevel, SectionType};
use crate::version::SchemaVersion;

/// Published data field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataField {
    pub(crate) id: DataFieldId,
    pub(crate) name: String,
    #[serde(rename = "type")]
    pub(crate) field_type: DataFieldType,
    #[serde(default)]
    pub(crate) options: DataFieldOptions,
    pub(crate) layout: Layout,
    pub(crate) granularity_level: GranularityLevel,
}

impl DataField {
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
}

/// Published section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSection {
    pub(crate) id: SectionId,
    pub(crate) name: String,
    #[serde(rename = "type")]
    pub(crate) section_type: SectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) parent_id: Option<SectionId>,
    #[serde(default)]
    pub(crate) sub_sections: Vec<SectionId>,
    pub(crate) layout: Layout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) granularity_level: Option<GranularityLevel>,
    #[serde(default)]
    pub(crate) data_fields: Vec<DataField>,
}

impl DataSection {
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

    pub fn sub_sections(&self) -> &[SectionId] {
        &self.sub_sections
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn granularity_level(&self) -> Option<GranularityLevel> {
        self.granularity_level
    }

    pub fn data_fields(&self) -> &[DataField] {
        &self.data_fields
    }
}

/// Immutable, versioned product data model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub(crate) id: TemplateId,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) sectors: Vec<String>,
    pub(crate) version: SchemaVersion,
    pub(crate) owned_by_organization_id: OrganizationId,
    pub(crate) created_by_user_id: UserId,
    pub(crate) created_at: DateTime<Utc>,
    #[serde(default)]
    pub(crate) sections: Vec<DataSection>,
}

impl Template {
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

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// All sections in the order they were added to the draft.
    pub fn sections(&self) -> &[DataSection] {
        &self.sections
    }

    pub fn find_section(&self, id: &SectionId) -> Option<&DataSection> {
        self.sections.iter().find(|s| &s.id == id)
    }

    /// Sections without a parent, in collection order.
    pub fn root_sections(&self) -> impl Iterator<Item = &DataSection> {
        self.sections.iter().filter(|s| s.parent_id.is_none())
    }

    /// Children of `id`, in the parent's `sub_sections` order.
    pub fn sub_sections_of(&self, id: &SectionId) -> Vec<&DataSection> {
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

    /// Locates a field anywhere in the template with its owning section.
    pub fn find_data_field(&self, id: &DataFieldId) -> Option<(&DataSection, &DataField)> {
        self.sections.iter().find_map(|section| {
            section
                .data_fields
                .iter()
                .find(|f| &f.id == id)
                .map(|field| (section, field))
        })
    }
}
