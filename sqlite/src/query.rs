//! Runtime access to drafts and templates stored in SQLite.
//!
//! Provides [`SchemaQuery`] for reading and writing documents in the
//! normalized tables. All multi-statement writes run in a transaction, and
//! the cascading foreign keys remove child rows when a draft is replaced or
//! deleted.
//!
//! # Example
//!
//! ```no_run
//! use product_schema_core::{OrganizationId, TemplateDraft, TemplateDraftProps, UserId};
//! use product_schema_sqlite::SchemaQuery;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("schemas.db").unwrap();
//! let query = SchemaQuery::new(&conn, "ps_").unwrap();
//!
//! let draft = TemplateDraft::create(TemplateDraftProps {
//!     name: "Laptop".into(),
//!     description: String::new(),
//!     sectors: vec![],
//!     organization_id: OrganizationId::from("acme"),
//!     user_id: UserId::from("alice"),
//! });
//! query.insert_draft(&draft).unwrap();
//!
//! let template = query.publish_draft(draft.id(), UserId::from("alice")).unwrap();
//! assert_eq!(template.version().to_string(), "1.0.0");
//! ```

use product_schema_core::{Template, TemplateDraft, TemplateId, UserId, validate_draft};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::convert;
use crate::error::{Result, SqliteError};
use crate::schema::validate_prefix;

/// Query interface for reading and writing drafts and templates.
pub struct SchemaQuery<'a> {
    conn: &'a Connection,
    prefix: String,
}

impl<'a> SchemaQuery<'a> {
    /// Creates a new query interface for the given connection and table prefix.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::InvalidPrefix`] if the prefix is invalid.
    pub fn new(conn: &'a Connection, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn, prefix })
    }

    // -----------------------------------------------------------------------
    // Drafts
    // -----------------------------------------------------------------------

    /// Inserts a new draft.
    ///
    /// # Errors
    ///
    /// Fails if a draft with the same id already exists.
    pub fn insert_draft(&self, draft: &TemplateDraft) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        convert::insert_draft(&tx, &self.prefix, draft)?;
        tx.commit()?;
        debug!(draft = %draft.id(), "inserted draft");
        Ok(())
    }

    /// Writes `draft`, replacing any stored version with the same id.
    pub fn save_draft(&self, draft: &TemplateDraft) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        convert::delete_draft(&tx, &self.prefix, draft.id().as_str())?;
        convert::insert_draft(&tx, &self.prefix, draft)?;
        tx.commit()?;
        debug!(draft = %draft.id(), "saved draft");
        Ok(())
    }

    /// Loads a draft and checks its structural integrity.
    ///
    /// Returns `None` if no draft with `id` exists.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::Integrity`] if the stored rows describe an
    /// inconsistent draft.
    pub fn get_draft(&self, id: &TemplateId) -> Result<Option<TemplateDraft>> {
        let Some(draft) = convert::load_draft(self.conn, &self.prefix, id.as_str())? else {
            return Ok(None);
        };
        let errors = validate_draft(&draft);
        if !errors.is_empty() {
            warn!(draft = %id, count = errors.len(), "stored draft failed integrity checks");
            return Err(SqliteError::Integrity {
                id: id.to_string(),
                errors,
            });
        }
        Ok(Some(draft))
    }

    /// Like [`get_draft`](Self::get_draft) but a missing draft is an error.
    pub fn require_draft(&self, id: &TemplateId) -> Result<TemplateDraft> {
        self.get_draft(id)?.ok_or_else(|| SqliteError::NotFound {
            kind: "draft",
            id: id.to_string(),
        })
    }

    pub fn list_draft_ids(&self) -> Result<Vec<TemplateId>> {
        Ok(convert::draft_ids(self.conn, &self.prefix)?
            .into_iter()
            .map(TemplateId::from)
            .collect())
    }

    /// Deletes a draft and all of its rows.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::NotFound`] if no draft with `id` exists.
    pub fn delete_draft(&self, id: &TemplateId) -> Result<()> {
        let rows = convert::delete_draft(self.conn, &self.prefix, id.as_str())?;
        if rows == 0 {
            return Err(SqliteError::NotFound {
                kind: "draft",
                id: id.to_string(),
            });
        }
        info!(draft = %id, "deleted draft");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Templates
    // -----------------------------------------------------------------------

    /// Inserts a published template.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::TemplateExists`] if the id is already stored.
    pub fn insert_template(&self, template: &Template) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        if convert::template_exists(&tx, &self.prefix, template.id().as_str())? {
            return Err(SqliteError::TemplateExists(template.id().to_string()));
        }
        convert::insert_template(&tx, &self.prefix, template)?;
        tx.commit()?;
        debug!(template = %template.id(), "inserted template");
        Ok(())
    }

    pub fn get_template(&self, id: &TemplateId) -> Result<Option<Template>> {
        convert::load_template(self.conn, &self.prefix, id.as_str())
    }

    pub fn list_template_ids(&self) -> Result<Vec<TemplateId>> {
        Ok(convert::template_ids(self.conn, &self.prefix)?
            .into_iter()
            .map(TemplateId::from)
            .collect())
    }

    // -----------------------------------------------------------------------
    // Publishing
    // -----------------------------------------------------------------------

    /// Stores a new template and the draft that produced it in one
    /// transaction. Either both are written or neither is.
    pub fn store_publication(&self, draft: &TemplateDraft, template: &Template) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        if convert::template_exists(&tx, &self.prefix, template.id().as_str())? {
            return Err(SqliteError::TemplateExists(template.id().to_string()));
        }
        convert::insert_template(&tx, &self.prefix, template)?;
        convert::delete_draft(&tx, &self.prefix, draft.id().as_str())?;
        convert::insert_draft(&tx, &self.prefix, draft)?;
        tx.commit()?;
        info!(
            draft = %draft.id(),
            template = %template.id(),
            version = %template.version(),
            "stored publication"
        );
        Ok(())
    }

    /// Loads a draft, publishes it and stores the result atomically.
    pub fn publish_draft(&self, draft_id: &TemplateId, user: UserId) -> Result<Template> {
        let mut draft = self.require_draft(draft_id)?;
        let template = draft.publish(user)?;
        self.store_publication(&draft, &template)?;
        Ok(template)
    }

    /// Returns a reference to the underlying connection.
    pub fn connection(&self) -> &Connection {
        self.conn
    }
}
