//! Conversion between drafts/templates and SQLite rows.
//!
//! Drafts and templates share the same section and field row layout; the
//! [`Owner`] selects which set of tables and which owner column is used.
//! Loading assembles the persisted JSON shape from the rows and hands it to
//! serde, so layouts, versions and enum values go through the same
//! validation as documents read from disk.
//!
//! # Round-trip guarantees
//!
//! - Section order, field order and sub-section order are kept via
//!   `position` / `sub_position` columns.
//! - Layout and options are stored as JSON text and decoded with validation.
//! - Section and field ids are stored verbatim.

use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use product_schema_core::{
    DataField, DataFieldDraft, DataFieldOptions, DataFieldType, DataSection, DataSectionDraft,
    GranularityLevel, Layout, SchemaVersion, SectionId, SectionType, Template, TemplateDraft,
};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::{Value, json};

use crate::error::{Result, SqliteError};

/// Which document family a set of section/field rows belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Owner {
    Draft,
    Template,
}

impl Owner {
    fn sections_table(self) -> &'static str {
        match self {
            Owner::Draft => "draft_sections",
            Owner::Template => "template_sections",
        }
    }

    fn fields_table(self) -> &'static str {
        match self {
            Owner::Draft => "draft_data_fields",
            Owner::Template => "template_data_fields",
        }
    }

    fn column(self) -> &'static str {
        match self {
            Owner::Draft => "draft_id",
            Owner::Template => "template_id",
        }
    }
}

/// Number of child rows written for one document.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertCounts {
    pub sections: usize,
    pub fields: usize,
    pub publications: usize,
}

/// Borrowed view of a section, shared by drafts and templates.
struct SectionRow<'a> {
    id: &'a SectionId,
    name: &'a str,
    section_type: SectionType,
    parent_id: Option<&'a SectionId>,
    sub_sections: &'a [SectionId],
    layout: &'a Layout,
    granularity_level: Option<GranularityLevel>,
    fields: Vec<FieldRow<'a>>,
}

struct FieldRow<'a> {
    id: &'a str,
    name: &'a str,
    field_type: DataFieldType,
    options: &'a DataFieldOptions,
    layout: &'a Layout,
    granularity_level: GranularityLevel,
}

impl<'a> From<&'a DataSectionDraft> for SectionRow<'a> {
    fn from(section: &'a DataSectionDraft) -> Self {
        Self {
            id: section.id(),
            name: section.name(),
            section_type: section.section_type(),
            parent_id: section.parent_id(),
            sub_sections: section.sub_sections(),
            layout: section.layout(),
            granularity_level: section.granularity_level(),
            fields: section.data_fields().iter().map(FieldRow::from).collect(),
        }
    }
}

impl<'a> From<&'a DataFieldDraft> for FieldRow<'a> {
    fn from(field: &'a DataFieldDraft) -> Self {
        Self {
            id: field.id().as_str(),
            name: field.name(),
            field_type: field.field_type(),
            options: field.options(),
            layout: field.layout(),
            granularity_level: field.granularity_level(),
        }
    }
}

impl<'a> From<&'a DataSection> for SectionRow<'a> {
    fn from(section: &'a DataSection) -> Self {
        Self {
            id: section.id(),
            name: section.name(),
            section_type: section.section_type(),
            parent_id: section.parent_id(),
            sub_sections: section.sub_sections(),
            layout: section.layout(),
            granularity_level: section.granularity_level(),
            fields: section.data_fields().iter().map(FieldRow::from).collect(),
        }
    }
}

impl<'a> From<&'a DataField> for FieldRow<'a> {
    fn from(field: &'a DataField) -> Self {
        Self {
            id: field.id().as_str(),
            name: field.name(),
            field_type: field.field_type(),
            options: field.options(),
            layout: field.layout(),
            granularity_level: field.granularity_level(),
        }
    }
}

/// Parses a stored string column with the type's `FromStr`.
fn parse<T>(column: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e| SqliteError::ConversionError(format!("{column}: {e}")))
}

// ---------------------------------------------------------------------------
// Shared section/field rows
// ---------------------------------------------------------------------------

fn insert_sections(
    conn: &Connection,
    prefix: &str,
    owner: Owner,
    owner_id: &str,
    sections: &[SectionRow<'_>],
) -> Result<InsertCounts> {
    let mut counts = InsertCounts::default();

    let mut sub_positions: HashMap<&SectionId, i64> = HashMap::new();
    for section in sections {
        for (index, child) in section.sub_sections.iter().enumerate() {
            sub_positions.insert(child, index as i64);
        }
    }

    for (position, section) in sections.iter().enumerate() {
        conn.execute(
            &format!(
                "INSERT INTO {prefix}{table} ({owner_col}, id, position, name, section_type, parent_id, sub_position, layout, granularity_level) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                table = owner.sections_table(),
                owner_col = owner.column(),
            ),
            params![
                owner_id,
                section.id.as_str(),
                position as i64,
                section.name,
                section.section_type.as_str(),
                section.parent_id.map(SectionId::as_str),
                sub_positions.get(section.id).copied(),
                serde_json::to_string(section.layout)?,
                section.granularity_level.map(|level| level.as_str()),
            ],
        )?;
        counts.sections += 1;

        for (field_position, field) in section.fields.iter().enumerate() {
            conn.execute(
                &format!(
                    "INSERT INTO {prefix}{table} ({owner_col}, section_id, id, position, name, field_type, options, layout, granularity_level) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    table = owner.fields_table(),
                    owner_col = owner.column(),
                ),
                params![
                    owner_id,
                    section.id.as_str(),
                    field.id,
                    field_position as i64,
                    field.name,
                    field.field_type.as_str(),
                    serde_json::to_string(field.options)?,
                    serde_json::to_string(field.layout)?,
                    field.granularity_level.as_str(),
                ],
            )?;
            counts.fields += 1;
        }
    }

    Ok(counts)
}

/// Loads the sections of one document in the persisted JSON shape.
fn load_sections(
    conn: &Connection,
    prefix: &str,
    owner: Owner,
    owner_id: &str,
) -> Result<Vec<Value>> {
    let mut fields_by_section: HashMap<String, Vec<Value>> = HashMap::new();
    {
        let mut stmt = conn.prepare(&format!(
            "SELECT section_id, id, name, field_type, options, layout, granularity_level \
             FROM {prefix}{table} WHERE {owner_col} = ?1 ORDER BY section_id, position",
            table = owner.fields_table(),
            owner_col = owner.column(),
        ))?;
        let rows = stmt
            .query_map(params![owner_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for (section_id, id, name, field_type, options, layout, level) in rows {
            let field_type: DataFieldType = parse("field_type", &field_type)?;
            let level: GranularityLevel = parse("granularity_level", &level)?;
            let options: DataFieldOptions = serde_json::from_str(&options)?;
            let layout: Layout = serde_json::from_str(&layout)?;
            fields_by_section.entry(section_id).or_default().push(json!({
                "id": id,
                "name": name,
                "type": field_type,
                "options": options,
                "layout": layout,
                "granularityLevel": level,
            }));
        }
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT id, name, section_type, parent_id, sub_position, layout, granularity_level \
         FROM {prefix}{table} WHERE {owner_col} = ?1 ORDER BY position",
        table = owner.sections_table(),
        owner_col = owner.column(),
    ))?;
    let rows = stmt
        .query_map(params![owner_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<i64>>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut children: HashMap<&str, Vec<(i64, &str)>> = HashMap::new();
    for (id, _, _, parent_id, sub_position, _, _) in &rows {
        if let Some(parent_id) = parent_id {
            children
                .entry(parent_id.as_str())
                .or_default()
                .push((sub_position.unwrap_or(i64::MAX), id.as_str()));
        }
    }
    for list in children.values_mut() {
        list.sort();
    }

    let mut sections = Vec::with_capacity(rows.len());
    for (id, name, section_type, parent_id, _, layout, level) in &rows {
        let section_type: SectionType = parse("section_type", section_type)?;
        let level: Option<GranularityLevel> = level
            .as_deref()
            .map(|l| parse("granularity_level", l))
            .transpose()?;
        let layout: Layout = serde_json::from_str(layout)?;
        let sub_sections: Vec<&str> = children
            .get(id.as_str())
            .map(|list| list.iter().map(|(_, child)| *child).collect())
            .unwrap_or_default();
        sections.push(json!({
            "id": id,
            "name": name,
            "type": section_type,
            "parentId": parent_id,
            "subSections": sub_sections,
            "layout": layout,
            "granularityLevel": level,
            "dataFields": fields_by_section.remove(id).unwrap_or_default(),
        }));
    }

    Ok(sections)
}

// ---------------------------------------------------------------------------
// Drafts
// ---------------------------------------------------------------------------

/// Inserts a draft with its publications, sections and fields.
pub(crate) fn insert_draft(
    conn: &Connection,
    prefix: &str,
    draft: &TemplateDraft,
) -> Result<InsertCounts> {
    let draft_id = draft.id().as_str();
    conn.execute(
        &format!(
            "INSERT INTO {prefix}drafts (id, name, description, sectors, version, owned_by_organization_id, created_by_user_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
        ),
        params![
            draft_id,
            draft.name(),
            draft.description(),
            serde_json::to_string(draft.sectors())?,
            draft.version().to_string(),
            draft.owned_by_organization_id().as_str(),
            draft.created_by_user_id().as_str(),
        ],
    )?;

    let mut publications = 0;
    for (position, publication) in draft.publications().iter().enumerate() {
        conn.execute(
            &format!(
                "INSERT INTO {prefix}draft_publications (draft_id, position, template_id, version) \
                 VALUES (?1, ?2, ?3, ?4)"
            ),
            params![
                draft_id,
                position as i64,
                publication.id.as_str(),
                publication.version.to_string(),
            ],
        )?;
        publications += 1;
    }

    let rows: Vec<SectionRow<'_>> = draft.sections().iter().map(SectionRow::from).collect();
    let mut counts = insert_sections(conn, prefix, Owner::Draft, draft_id, &rows)?;
    counts.publications = publications;
    Ok(counts)
}

/// Deletes a draft and, through the cascading keys, all of its rows.
/// Returns the number of drafts removed.
pub(crate) fn delete_draft(conn: &Connection, prefix: &str, id: &str) -> Result<usize> {
    Ok(conn.execute(
        &format!("DELETE FROM {prefix}drafts WHERE id = ?1"),
        params![id],
    )?)
}

/// Loads a draft by id. Returns `None` if it does not exist.
pub(crate) fn load_draft(
    conn: &Connection,
    prefix: &str,
    id: &str,
) -> Result<Option<TemplateDraft>> {
    let head = conn
        .query_row(
            &format!(
                "SELECT id, name, description, sectors, version, owned_by_organization_id, created_by_user_id \
                 FROM {prefix}drafts WHERE id = ?1"
            ),
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            },
        )
        .optional()?;
    let Some((id, name, description, sectors, version, organization, user)) = head else {
        return Ok(None);
    };

    let sectors: Vec<String> = serde_json::from_str(&sectors)?;
    let version: SchemaVersion = parse("version", &version)?;

    let mut stmt = conn.prepare(&format!(
        "SELECT template_id, version FROM {prefix}draft_publications \
         WHERE draft_id = ?1 ORDER BY position"
    ))?;
    let publications = stmt
        .query_map(params![id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?
        .into_iter()
        .map(|(template_id, version)| -> Result<Value> {
            let version: SchemaVersion = parse("version", &version)?;
            Ok(json!({ "id": template_id, "version": version }))
        })
        .collect::<Result<Vec<_>>>()?;

    let sections = load_sections(conn, prefix, Owner::Draft, &id)?;

    let document = json!({
        "id": id,
        "name": name,
        "description": description,
        "sectors": sectors,
        "version": version,
        "publications": publications,
        "ownedByOrganizationId": organization,
        "createdByUserId": user,
        "sections": sections,
    });
    Ok(Some(serde_json::from_value(document)?))
}

/// Ids of all stored drafts, sorted.
pub(crate) fn draft_ids(conn: &Connection, prefix: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("SELECT id FROM {prefix}drafts ORDER BY id"))?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ids)
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// Inserts a published template with its sections and fields.
pub(crate) fn insert_template(
    conn: &Connection,
    prefix: &str,
    template: &Template,
) -> Result<InsertCounts> {
    let template_id = template.id().as_str();
    conn.execute(
        &format!(
            "INSERT INTO {prefix}templates (id, name, description, sectors, version, owned_by_organization_id, created_by_user_id, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        ),
        params![
            template_id,
            template.name(),
            template.description(),
            serde_json::to_string(template.sectors())?,
            template.version().to_string(),
            template.owned_by_organization_id().as_str(),
            template.created_by_user_id().as_str(),
            template.created_at().to_rfc3339(),
        ],
    )?;

    let rows: Vec<SectionRow<'_>> = template.sections().iter().map(SectionRow::from).collect();
    insert_sections(conn, prefix, Owner::Template, template_id, &rows)
}

pub(crate) fn template_exists(conn: &Connection, prefix: &str, id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {prefix}templates WHERE id = ?1"),
        params![id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Loads a template by id. Returns `None` if it does not exist.
pub(crate) fn load_template(conn: &Connection, prefix: &str, id: &str) -> Result<Option<Template>> {
    let head = conn
        .query_row(
            &format!(
                "SELECT id, name, description, sectors, version, owned_by_organization_id, created_by_user_id, created_at \
                 FROM {prefix}templates WHERE id = ?1"
            ),
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                ))
            },
        )
        .optional()?;
    let Some((id, name, description, sectors, version, organization, user, created_at)) = head
    else {
        return Ok(None);
    };

    let sectors: Vec<String> = serde_json::from_str(&sectors)?;
    let version: SchemaVersion = parse("version", &version)?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| SqliteError::ConversionError(format!("created_at: {e}")))?
        .with_timezone(&Utc);
    let sections = load_sections(conn, prefix, Owner::Template, &id)?;

    let document = json!({
        "id": id,
        "name": name,
        "description": description,
        "sectors": sectors,
        "version": version,
        "ownedByOrganizationId": organization,
        "createdByUserId": user,
        "createdAt": created_at,
        "sections": sections,
    });
    Ok(Some(serde_json::from_value(document)?))
}

/// Ids of all stored templates, sorted.
pub(crate) fn template_ids(conn: &Connection, prefix: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("SELECT id FROM {prefix}templates ORDER BY id"))?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ids)
}
