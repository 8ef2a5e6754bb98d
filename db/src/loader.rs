//! Read-only catalog of published templates.
//!
//! [`TemplateCatalog`] loads every template document from a directory into
//! memory for lookup by id. It is the read side used when rendering or
//! validating product data against a template.
//!
//! ```no_run
//! use product_schema_core::TemplateId;
//! use product_schema_db::TemplateCatalog;
//!
//! let catalog = TemplateCatalog::from_dir("schemas/templates").unwrap();
//! println!("{} templates", catalog.len());
//! if let Some(template) = catalog.get(&TemplateId::from("t-1")) {
//!     println!("{} v{}", template.name(), template.version());
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use product_schema_core::{Template, TemplateId};
use tracing::debug;

use crate::error::Result;
use crate::store::read_json;

/// In-memory collection of published templates with O(1) lookup by id.
#[derive(Debug)]
pub struct TemplateCatalog {
    templates: HashMap<TemplateId, Template>,
    source: PathBuf,
}

impl TemplateCatalog {
    /// Loads every `*.json` file in `path` as a [`Template`].
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::IoError`](crate::DatabaseError::IoError) if
    /// the directory or a file cannot be read, or
    /// [`DatabaseError::JsonError`](crate::DatabaseError::JsonError) if a file
    /// is not a valid template.
    pub fn from_dir(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut templates = HashMap::new();

        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if file_path.extension().and_then(|e| e.to_str()) == Some("json") {
                let template: Template = read_json(&file_path)?;
                templates.insert(template.id().clone(), template);
            }
        }

        debug!(path = %path.display(), count = templates.len(), "loaded template catalog");
        Ok(Self {
            templates,
            source: path.to_path_buf(),
        })
    }

    pub fn get(&self, id: &TemplateId) -> Option<&Template> {
        self.templates.get(id)
    }

    pub fn contains(&self, id: &TemplateId) -> bool {
        self.templates.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Template ids in sorted order.
    pub fn ids(&self) -> Vec<&TemplateId> {
        let mut ids: Vec<_> = self.templates.keys().collect();
        ids.sort();
        ids
    }

    /// Directory the catalog was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = TemplateCatalog::from_dir(dir.path()).unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.ids().is_empty());
        assert_eq!(catalog.source(), dir.path());
    }

    #[test]
    fn test_invalid_document_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{\"id\": 1}").unwrap();
        assert!(TemplateCatalog::from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = TemplateCatalog::from_dir(dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, crate::DatabaseError::IoError(_)));
    }
}
