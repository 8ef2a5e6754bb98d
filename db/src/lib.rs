//! JSON document storage and configuration for template drafts.
//!
//! This crate persists [`TemplateDraft`](product_schema_core::TemplateDraft)
//! and [`Template`](product_schema_core::Template) documents in a directory,
//! loads a read-only catalog of published templates, and reads the YAML
//! configuration shared by the authoring tools.
//!
//! # Quick start
//!
//! ```no_run
//! use product_schema_core::TemplateId;
//! use product_schema_db::{SchemaStore, StoreConfig, TemplateCatalog};
//!
//! let config = StoreConfig::load("product-schema.yml").unwrap();
//! let store = SchemaStore::open(&config.root).unwrap();
//! for id in store.list_drafts().unwrap() {
//!     let draft = store.load_draft(&id).unwrap();
//!     println!("{} ({} sections)", draft.name(), draft.sections().len());
//! }
//!
//! let catalog = TemplateCatalog::from_dir(store.templates_dir()).unwrap();
//! println!("{} published templates", catalog.len());
//! ```

mod config;
mod error;
mod loader;
mod store;

pub use config::{DEFAULT_CONFIG_FILE, Defaults, OutputConfig, StoreConfig};
pub use error::{DatabaseError, Result};
pub use loader::TemplateCatalog;
pub use store::SchemaStore;
