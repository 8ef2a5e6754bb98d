//! Migration lifecycle operations for the SQLite tables.
//!
//! Provides [`Migration`] for creating, dropping, seeding, and refreshing
//! the normalized table structure. All mutation operations use transactions
//! to ensure atomicity.
//!
//! # Example
//!
//! ```no_run
//! use product_schema_sqlite::Migration;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("schemas.db").unwrap();
//! let mut migration = Migration::new(conn, "ps_").unwrap();
//!
//! migration.up().unwrap();
//! let status = migration.status().unwrap();
//! assert!(status.tables_exist);
//!
//! // Import a JSON document store
//! migration.seed("schemas/").unwrap();
//!
//! // Drop, recreate and import again
//! migration.refresh("schemas/").unwrap();
//! ```

use std::path::Path;

use product_schema_db::SchemaStore;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::convert::{self, InsertCounts};
use crate::error::{Result, SqliteError};
use crate::schema::{generate_drop_sql, generate_schema_sql, validate_prefix};

/// Manages the lifecycle of the SQLite tables.
///
/// Provides operations to create tables ([`up`](Self::up)), drop them
/// ([`down`](Self::down)), import a JSON document store
/// ([`seed`](Self::seed)), and check the current state
/// ([`status`](Self::status)).
pub struct Migration {
    conn: Connection,
    prefix: String,
}

impl Migration {
    /// Creates a new migration manager for the given connection and table prefix.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvalidPrefix`] if the prefix contains invalid characters.
    pub fn new(conn: Connection, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn, prefix })
    }

    /// Creates all tables and indexes.
    ///
    /// Uses `CREATE TABLE IF NOT EXISTS` so it is safe to call multiple times.
    pub fn up(&mut self) -> Result<()> {
        let sql = generate_schema_sql(&self.prefix)?;
        let tx = self.conn.transaction()?;
        tx.execute_batch(&sql)
            .map_err(|e| SqliteError::MigrationError(format!("failed to create tables: {e}")))?;
        tx.commit()?;
        info!(prefix = %self.prefix, "created tables");
        Ok(())
    }

    /// Drops all tables in reverse dependency order.
    pub fn down(&mut self) -> Result<()> {
        let sql = generate_drop_sql(&self.prefix)?;
        let tx = self.conn.transaction()?;
        tx.execute_batch(&sql)
            .map_err(|e| SqliteError::MigrationError(format!("failed to drop tables: {e}")))?;
        tx.commit()?;
        info!(prefix = %self.prefix, "dropped tables");
        Ok(())
    }

    /// Returns whether the tables exist and how many rows each holds.
    pub fn status(&self) -> Result<MigrationStatus> {
        if !self.tables_exist()? {
            return Ok(MigrationStatus::default());
        }

        Ok(MigrationStatus {
            tables_exist: true,
            draft_count: self.count_rows("drafts")?,
            section_count: self.count_rows("draft_sections")?,
            field_count: self.count_rows("draft_data_fields")?,
            publication_count: self.count_rows("draft_publications")?,
            template_count: self.count_rows("templates")?,
        })
    }

    /// Imports every draft and template of a JSON document store.
    ///
    /// Drafts go through the store's integrity checks. Everything is inserted
    /// in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::MigrationError`] if `store_root` is not a
    /// directory, [`SqliteError::LoaderError`] if a document cannot be read,
    /// or [`SqliteError::DatabaseError`] if insertion fails.
    pub fn seed(&mut self, store_root: impl AsRef<Path>) -> Result<SeedReport> {
        let store_root = store_root.as_ref();
        if !store_root.is_dir() {
            return Err(SqliteError::MigrationError(format!(
                "store directory not found: {}",
                store_root.display()
            )));
        }
        let store = SchemaStore::open(store_root)?;

        let tx = self.conn.transaction()?;
        let mut report = SeedReport::default();

        for id in store.list_templates()? {
            let template = store.load_template(&id)?;
            let counts = convert::insert_template(&tx, &self.prefix, &template)?;
            report.templates_inserted += 1;
            report.merge_counts(&counts);
        }

        for id in store.list_drafts()? {
            let draft = store.load_draft(&id)?;
            let counts = convert::insert_draft(&tx, &self.prefix, &draft)?;
            report.drafts_inserted += 1;
            report.merge_counts(&counts);
        }

        tx.commit()?;
        debug!(
            drafts = report.drafts_inserted,
            templates = report.templates_inserted,
            "seeded from document store"
        );
        Ok(report)
    }

    /// Drops all tables, recreates them, and seeds from the given store.
    pub fn refresh(&mut self, store_root: impl AsRef<Path>) -> Result<SeedReport> {
        self.down()?;
        self.up()?;
        self.seed(store_root)
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Consumes the migration and returns the underlying connection.
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    fn tables_exist(&self) -> Result<bool> {
        let table_name = format!("{}drafts", self.prefix);
        let mut stmt = self.conn.prepare(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
        )?;
        let count: i64 = stmt.query_row([&table_name], |row| row.get(0))?;
        Ok(count > 0)
    }

    fn count_rows(&self, table: &str) -> Result<usize> {
        let full_table = format!("{}{}", self.prefix, table);
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT COUNT(*) FROM {full_table}"))?;
        let count: i64 = stmt.query_row([], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Snapshot returned by [`Migration::status`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Whether the tables exist in the database.
    pub tables_exist: bool,
    pub draft_count: usize,
    /// Sections across all drafts.
    pub section_count: usize,
    /// Data fields across all drafts.
    pub field_count: usize,
    pub publication_count: usize,
    pub template_count: usize,
}

/// Report of a seed operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub drafts_inserted: usize,
    pub templates_inserted: usize,
    /// Section rows written, drafts and templates combined.
    pub sections_inserted: usize,
    /// Field rows written, drafts and templates combined.
    pub fields_inserted: usize,
    pub publications_inserted: usize,
}

impl SeedReport {
    fn merge_counts(&mut self, counts: &InsertCounts) {
        self.sections_inserted += counts.sections;
        self.fields_inserted += counts.fields;
        self.publications_inserted += counts.publications;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_new_validates_prefix() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(Migration::new(conn, "valid_prefix_").is_ok());

        let conn = Connection::open_in_memory().unwrap();
        assert!(Migration::new(conn, "").is_err());

        let conn = Connection::open_in_memory().unwrap();
        assert!(Migration::new(conn, "drop;--").is_err());
    }

    #[test]
    fn test_status_on_empty_database() {
        let conn = Connection::open_in_memory().unwrap();
        let migration = Migration::new(conn, "ps_").unwrap();
        assert_eq!(migration.status().unwrap(), MigrationStatus::default());
    }

    #[test]
    fn test_up_is_idempotent_and_down_removes() {
        let conn = Connection::open_in_memory().unwrap();
        let mut migration = Migration::new(conn, "ps_").unwrap();
        migration.up().unwrap();
        migration.up().unwrap();
        let status = migration.status().unwrap();
        assert!(status.tables_exist);
        assert_eq!(status.draft_count, 0);

        migration.down().unwrap();
        assert!(!migration.status().unwrap().tables_exist);
        migration.down().unwrap();
    }

    #[test]
    fn test_seed_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let conn = Connection::open_in_memory().unwrap();
        let mut migration = Migration::new(conn, "ps_").unwrap();
        migration.up().unwrap();
        let err = migration.seed(dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, SqliteError::MigrationError(_)));
    }
}
