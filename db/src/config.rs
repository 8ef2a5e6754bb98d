//! Store configuration for authoring sessions.
//!
//! Defines the YAML-serializable configuration that tells the tooling where
//! the document store lives and which organization and user to record on new
//! drafts and publications.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! root: ./schemas
//! defaults:
//!   organization: acme
//!   user: alice
//! output:
//!   pretty: true
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "product-schema.yml";

/// Identities recorded when no explicit value is given.
///
/// # Examples
///
/// ```
/// # use product_schema_db::Defaults;
/// let d = Defaults::default();
/// assert_eq!(d.organization, "default");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    /// Organization that owns newly created drafts.
    pub organization: String,
    /// User recorded as creator of drafts and publications.
    pub user: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            organization: "default".into(),
            user: "anonymous".into(),
        }
    }
}

/// Settings for documents written to disk and stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print JSON documents.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Top-level store configuration.
///
/// # Examples
///
/// ```no_run
/// use product_schema_db::StoreConfig;
///
/// let config = StoreConfig::load("product-schema.yml").unwrap();
/// println!("store at {}", config.root.display());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// Directory holding the `drafts/` and `templates/` folders.
    pub root: PathBuf,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            version: "1.0".into(),
            root: PathBuf::from("schemas"),
            defaults: Defaults::default(),
            output: OutputConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::DatabaseError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::DatabaseError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}
