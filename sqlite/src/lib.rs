//! SQLite storage backend for template drafts and published templates.
//!
//! This crate stores [`TemplateDraft`](product_schema_core::TemplateDraft)
//! and [`Template`](product_schema_core::Template) documents in normalized
//! SQLite tables with full round-trip fidelity. It includes migration
//! lifecycle management, conversion between documents and rows, and a query
//! interface.
//!
//! # Architecture
//!
//! - **`schema`**: SQL generation with customizable table prefixes
//! - **`migration`**: Lifecycle operations (up/down/seed/refresh/status)
//! - **`convert`**: Document ↔ row transformations
//! - **`query`**: Runtime access, including atomic publication storage
//!
//! # Quick start
//!
//! ```no_run
//! use product_schema_sqlite::{Migration, SchemaQuery};
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("schemas.db").unwrap();
//! let mut migration = Migration::new(conn, "ps_").unwrap();
//! migration.up().unwrap();
//! migration.seed("schemas/").unwrap();
//!
//! let conn = migration.into_connection();
//! let query = SchemaQuery::new(&conn, "ps_").unwrap();
//! for id in query.list_template_ids().unwrap() {
//!     println!("{id}");
//! }
//! ```
//!
//! # Table prefix customization
//!
//! All table and index names are prefixed with a configurable string,
//! allowing multiple isolated stores within the same SQLite database.
//! Prefixes must contain only alphanumeric characters and underscores.

mod convert;
mod error;
mod migration;
mod query;
mod schema;

pub use error::{Result, SqliteError};
pub use migration::{Migration, MigrationStatus, SeedReport};
pub use query::SchemaQuery;
pub use schema::{generate_drop_sql, generate_schema_sql};
