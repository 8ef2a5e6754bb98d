//! Directory-backed document store for drafts and published templates.
//!
//! Layout on disk:
//!
//! ```text
//! <root>/
//!   drafts/<draft-id>.json
//!   templates/<template-id>.json
//! ```
//!
//! Drafts are replaced on every save. Templates are written once and never
//! overwritten.
//!
//! # Example
//!
//! ```no_run
//! use product_schema_core::{OrganizationId, TemplateDraft, TemplateDraftProps, UserId};
//! use product_schema_db::SchemaStore;
//!
//! let store = SchemaStore::open("schemas").unwrap();
//! let draft = TemplateDraft::create(TemplateDraftProps {
//!     name: "Laptop".into(),
//!     description: String::new(),
//!     sectors: vec![],
//!     organization_id: OrganizationId::from("acme"),
//!     user_id: UserId::from("alice"),
//! });
//! store.save_draft(&draft).unwrap();
//! let template = store.publish_draft(draft.id(), UserId::from("alice")).unwrap();
//! println!("published {} as {}", template.id(), template.version());
//! ```

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use product_schema_core::{Template, TemplateDraft, TemplateId, UserId, validate_draft};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{DatabaseError, Result};

const DRAFTS_DIR: &str = "drafts";
const TEMPLATES_DIR: &str = "templates";

/// JSON document store rooted at a directory.
#[derive(Debug, Clone)]
pub struct SchemaStore {
    root: PathBuf,
    pretty: bool,
}

impl SchemaStore {
    /// Opens the store at `root`, creating its sub-directories if needed.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::IoError`] if the directories cannot be
    /// created.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join(DRAFTS_DIR))?;
        std::fs::create_dir_all(root.join(TEMPLATES_DIR))?;
        debug!(root = %root.display(), "opened schema store");
        Ok(Self { root, pretty: true })
    }

    /// Controls whether documents are pretty-printed. Defaults to `true`.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn drafts_dir(&self) -> PathBuf {
        self.root.join(DRAFTS_DIR)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join(TEMPLATES_DIR)
    }

    fn draft_path(&self, id: &TemplateId) -> Result<PathBuf> {
        document_path(&self.drafts_dir(), id)
    }

    fn template_path(&self, id: &TemplateId) -> Result<PathBuf> {
        document_path(&self.templates_dir(), id)
    }

    // -----------------------------------------------------------------------
    // Drafts
    // -----------------------------------------------------------------------

    /// Writes `draft`, replacing any previous version.
    pub fn save_draft(&self, draft: &TemplateDraft) -> Result<()> {
        let path = self.draft_path(draft.id())?;
        self.write_json(File::create(&path)?, draft)?;
        debug!(draft = %draft.id(), path = %path.display(), "saved draft");
        Ok(())
    }

    /// Reads a draft and checks its structural integrity.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::NotFound`] if no such draft exists and
    /// [`DatabaseError::Integrity`] if the stored draft is inconsistent.
    pub fn load_draft(&self, id: &TemplateId) -> Result<TemplateDraft> {
        let path = self.draft_path(id)?;
        if !path.exists() {
            return Err(DatabaseError::NotFound {
                kind: "draft",
                id: id.to_string(),
            });
        }
        let draft: TemplateDraft = read_json(&path)?;
        let errors = validate_draft(&draft);
        if !errors.is_empty() {
            warn!(draft = %id, count = errors.len(), "stored draft failed integrity checks");
            return Err(DatabaseError::Integrity {
                id: id.to_string(),
                errors,
            });
        }
        debug!(draft = %id, sections = draft.sections().len(), "loaded draft");
        Ok(draft)
    }

    /// Ids of all stored drafts, sorted.
    pub fn list_drafts(&self) -> Result<Vec<TemplateId>> {
        list_ids(&self.drafts_dir())
    }

    pub fn delete_draft(&self, id: &TemplateId) -> Result<()> {
        let path = self.draft_path(id)?;
        if !path.exists() {
            return Err(DatabaseError::NotFound {
                kind: "draft",
                id: id.to_string(),
            });
        }
        std::fs::remove_file(&path)?;
        info!(draft = %id, "deleted draft");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Templates
    // -----------------------------------------------------------------------

    /// Writes a newly published template.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::TemplateExists`] if a template with the same
    /// id is already stored.
    pub fn save_template(&self, template: &Template) -> Result<()> {
        let path = self.template_path(template.id())?;
        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                return Err(DatabaseError::TemplateExists(template.id().to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        self.write_json(file, template)?;
        debug!(template = %template.id(), version = %template.version(), "saved template");
        Ok(())
    }

    pub fn load_template(&self, id: &TemplateId) -> Result<Template> {
        let path = self.template_path(id)?;
        if !path.exists() {
            return Err(DatabaseError::NotFound {
                kind: "template",
                id: id.to_string(),
            });
        }
        read_json(&path)
    }

    /// Ids of all stored templates, sorted.
    pub fn list_templates(&self) -> Result<Vec<TemplateId>> {
        list_ids(&self.templates_dir())
    }

    /// Publishes a stored draft and persists both results.
    ///
    /// The template is written before the updated draft. If the draft write
    /// fails the template stays on disk without a matching publication
    /// record; this is logged and the error is returned.
    pub fn publish_draft(&self, draft_id: &TemplateId, user: UserId) -> Result<Template> {
        let mut draft = self.load_draft(draft_id)?;
        let template = draft.publish(user)?;
        self.save_template(&template)?;
        if let Err(err) = self.save_draft(&draft) {
            warn!(
                draft = %draft_id,
                template = %template.id(),
                error = %err,
                "template stored but draft publication record was not saved"
            );
            return Err(err);
        }
        info!(
            draft = %draft_id,
            template = %template.id(),
            version = %template.version(),
            "published draft"
        );
        Ok(template)
    }

    fn write_json<T: Serialize>(&self, file: File, value: &T) -> Result<()> {
        let mut writer = BufWriter::new(file);
        if self.pretty {
            serde_json::to_writer_pretty(&mut writer, value)?;
        } else {
            serde_json::to_writer(&mut writer, value)?;
        }
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

/// Joins `id` onto `dir` as a `.json` file name.
///
/// Ids that are empty, start with a dot or contain a path separator are
/// rejected so a document can never resolve outside `dir`.
fn document_path(dir: &Path, id: &TemplateId) -> Result<PathBuf> {
    let id = id.as_str();
    if id.is_empty() || id.starts_with('.') || id.contains(['/', '\\']) {
        return Err(DatabaseError::InvalidId(id.to_string()));
    }
    Ok(dir.join(format!("{id}.json")))
}

fn list_ids(dir: &Path) -> Result<Vec<TemplateId>> {
    let mut ids = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            ids.push(TemplateId::from(stem));
        }
    }
    ids.sort();
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use product_schema_core::{OrganizationId, TemplateDraftProps};

    use super::*;

    fn draft(name: &str) -> TemplateDraft {
        TemplateDraft::create(TemplateDraftProps {
            name: name.into(),
            description: String::new(),
            sectors: vec![],
            organization_id: OrganizationId::from("acme"),
            user_id: UserId::from("alice"),
        })
    }

    #[test]
    fn test_open_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = SchemaStore::open(dir.path().join("store")).unwrap();
        assert!(store.drafts_dir().is_dir());
        assert!(store.templates_dir().is_dir());
    }

    #[test]
    fn test_missing_draft_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = SchemaStore::open(dir.path()).unwrap();
        let err = store.load_draft(&TemplateId::from("nope")).unwrap_err();
        assert!(err.is_not_found());
        let err = store.delete_draft(&TemplateId::from("nope")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_list_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = SchemaStore::open(dir.path()).unwrap();
        let d = draft("Laptop");
        store.save_draft(&d).unwrap();
        std::fs::write(store.drafts_dir().join("notes.txt"), "x").unwrap();
        assert_eq!(store.list_drafts().unwrap(), vec![d.id().clone()]);
    }

    #[test]
    fn test_compact_output() {
        let dir = tempfile::tempdir().unwrap();
        let store = SchemaStore::open(dir.path()).unwrap().with_pretty(false);
        let d = draft("Laptop");
        store.save_draft(&d).unwrap();
        let text = std::fs::read_to_string(store.draft_path(d.id()).unwrap()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_ids_cannot_escape_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = SchemaStore::open(dir.path().join("store")).unwrap();
        let outside = dir.path().join("x.json");
        std::fs::write(&outside, "{}").unwrap();

        for id in ["../../x", "../x", "..", ".hidden", "a/b", "a\\b", ""] {
            let id = TemplateId::from(id);
            let err = store.delete_draft(&id).unwrap_err();
            assert!(matches!(err, DatabaseError::InvalidId(_)), "{id}: {err}");
            assert!(matches!(
                store.load_template(&id).unwrap_err(),
                DatabaseError::InvalidId(_)
            ));
        }
        assert!(outside.exists());
    }

    #[test]
    fn test_templates_are_write_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = SchemaStore::open(dir.path()).unwrap();
        let mut d = draft("Laptop");
        let template = d.publish(UserId::from("bob")).unwrap();
        store.save_template(&template).unwrap();
        let before = std::fs::read_to_string(store.template_path(template.id()).unwrap()).unwrap();

        let err = store.save_template(&template).unwrap_err();
        assert!(matches!(err, DatabaseError::TemplateExists(_)));
        let after = std::fs::read_to_string(store.template_path(template.id()).unwrap()).unwrap();
        assert_eq!(before, after);
    }
}
