//! SQL schema generation with customizable table prefixes.
//!
//! Generates normalized `CREATE TABLE` and `CREATE INDEX` statements for
//! storing template drafts and published templates in SQLite. All table
//! names are prefixed with a configurable string to allow multiple isolated
//! stores in the same database.
//!
//! # Table structure
//!
//! - `{prefix}drafts`: draft metadata
//! - `{prefix}draft_publications`: publication history, in order
//! - `{prefix}draft_sections`: flat section list with parent reference
//! - `{prefix}draft_data_fields`: fields with their owning section
//! - `{prefix}templates`: published template metadata
//! - `{prefix}template_sections`: sections of a published template
//! - `{prefix}template_data_fields`: fields of a published template
//!
//! `position` columns keep collection order. `sub_position` keeps a child's
//! place in its parent's sub-section list. Layouts and options are stored as
//! JSON text.

use crate::error::{Result, SqliteError};

/// Validates that a table prefix contains only alphanumeric characters and underscores.
pub(crate) fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(SqliteError::InvalidPrefix(prefix.to_string()));
    }
    if !prefix.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(SqliteError::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}

/// Generates the complete SQL schema for all tables with the given prefix.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidPrefix`] if the prefix contains characters
/// other than alphanumerics and underscores, or if it is empty.
pub fn generate_schema_sql(prefix: &str) -> Result<String> {
    validate_prefix(prefix)?;

    let sql = format!(
        r#"
CREATE TABLE IF NOT EXISTS {prefix}drafts (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    sectors TEXT NOT NULL DEFAULT '[]',
    version TEXT NOT NULL DEFAULT '1.0.0',
    owned_by_organization_id TEXT NOT NULL,
    created_by_user_id TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS {prefix}draft_publications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    draft_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    template_id TEXT NOT NULL,
    version TEXT NOT NULL,
    FOREIGN KEY (draft_id) REFERENCES {prefix}drafts(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS {prefix}draft_sections (
    draft_id TEXT NOT NULL,
    id TEXT NOT NULL,
    position INTEGER NOT NULL,
    name TEXT NOT NULL,
    section_type TEXT NOT NULL CHECK (section_type IN ('GROUP', 'REPEATABLE')),
    parent_id TEXT,
    sub_position INTEGER,
    layout TEXT NOT NULL,
    granularity_level TEXT CHECK (granularity_level IN ('MODEL', 'ITEM')),
    PRIMARY KEY (draft_id, id),
    FOREIGN KEY (draft_id) REFERENCES {prefix}drafts(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS {prefix}draft_data_fields (
    draft_id TEXT NOT NULL,
    section_id TEXT NOT NULL,
    id TEXT NOT NULL,
    position INTEGER NOT NULL,
    name TEXT NOT NULL,
    field_type TEXT NOT NULL,
    options TEXT NOT NULL DEFAULT '{{}}',
    layout TEXT NOT NULL,
    granularity_level TEXT NOT NULL CHECK (granularity_level IN ('MODEL', 'ITEM')),
    PRIMARY KEY (draft_id, id),
    FOREIGN KEY (draft_id) REFERENCES {prefix}drafts(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS {prefix}templates (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    sectors TEXT NOT NULL DEFAULT '[]',
    version TEXT NOT NULL,
    owned_by_organization_id TEXT NOT NULL,
    created_by_user_id TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS {prefix}template_sections (
    template_id TEXT NOT NULL,
    id TEXT NOT NULL,
    position INTEGER NOT NULL,
    name TEXT NOT NULL,
    section_type TEXT NOT NULL CHECK (section_type IN ('GROUP', 'REPEATABLE')),
    parent_id TEXT,
    sub_position INTEGER,
    layout TEXT NOT NULL,
    granularity_level TEXT CHECK (granularity_level IN ('MODEL', 'ITEM')),
    PRIMARY KEY (template_id, id),
    FOREIGN KEY (template_id) REFERENCES {prefix}templates(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS {prefix}template_data_fields (
    template_id TEXT NOT NULL,
    section_id TEXT NOT NULL,
    id TEXT NOT NULL,
    position INTEGER NOT NULL,
    name TEXT NOT NULL,
    field_type TEXT NOT NULL,
    options TEXT NOT NULL DEFAULT '{{}}',
    layout TEXT NOT NULL,
    granularity_level TEXT NOT NULL CHECK (granularity_level IN ('MODEL', 'ITEM')),
    PRIMARY KEY (template_id, id),
    FOREIGN KEY (template_id) REFERENCES {prefix}templates(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_{prefix}draft_publications_draft ON {prefix}draft_publications(draft_id);
CREATE INDEX IF NOT EXISTS idx_{prefix}draft_sections_parent ON {prefix}draft_sections(draft_id, parent_id);
CREATE INDEX IF NOT EXISTS idx_{prefix}draft_fields_section ON {prefix}draft_data_fields(draft_id, section_id);
CREATE INDEX IF NOT EXISTS idx_{prefix}template_sections_parent ON {prefix}template_sections(template_id, parent_id);
CREATE INDEX IF NOT EXISTS idx_{prefix}template_fields_section ON {prefix}template_data_fields(template_id, section_id);
"#,
        prefix = prefix
    );

    Ok(sql)
}

/// Generates SQL to drop all tables in reverse dependency order.
///
/// # Errors
///
/// Returns [`SqliteError::InvalidPrefix`] if the prefix is invalid.
pub fn generate_drop_sql(prefix: &str) -> Result<String> {
    validate_prefix(prefix)?;

    let sql = format!(
        r#"
DROP TABLE IF EXISTS {prefix}template_data_fields;
DROP TABLE IF EXISTS {prefix}template_sections;
DROP TABLE IF EXISTS {prefix}templates;
DROP TABLE IF EXISTS {prefix}draft_data_fields;
DROP TABLE IF EXISTS {prefix}draft_sections;
DROP TABLE IF EXISTS {prefix}draft_publications;
DROP TABLE IF EXISTS {prefix}drafts;
"#,
        prefix = prefix
    );

    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_prefix() {
        assert!(validate_prefix("ps_").is_ok());
        assert!(validate_prefix("test123").is_ok());
        assert!(validate_prefix("A_B_C").is_ok());
    }

    #[test]
    fn test_invalid_prefix() {
        assert!(validate_prefix("").is_err());
        assert!(validate_prefix("drop;--").is_err());
        assert!(validate_prefix("hello world").is_err());
        assert!(validate_prefix("test-prefix").is_err());
    }

    #[test]
    fn test_generate_schema_sql_contains_tables() {
        let sql = generate_schema_sql("ps_").unwrap();
        for table in [
            "ps_drafts",
            "ps_draft_publications",
            "ps_draft_sections",
            "ps_draft_data_fields",
            "ps_templates",
            "ps_template_sections",
            "ps_template_data_fields",
        ] {
            assert!(sql.contains(table), "missing {table}");
        }
        assert!(sql.contains("DEFAULT '{}'"));
    }

    #[test]
    fn test_generate_drop_sql_order() {
        let sql = generate_drop_sql("ps_").unwrap();
        let fields = sql.find("ps_draft_data_fields").unwrap();
        let drafts = sql.find("ps_drafts;").unwrap();
        assert!(fields < drafts);
    }

    #[test]
    fn test_schema_applies_in_memory() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(&generate_schema_sql("ps_").unwrap())
            .unwrap();
        conn.execute_batch(&generate_drop_sql("ps_").unwrap())
            .unwrap();
    }
}
