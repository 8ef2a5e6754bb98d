//! Semantic version of a published template.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// `major.minor.patch` version number.
///
/// Serialized as its dotted string form.
///
/// # Examples
///
/// ```
/// use product_schema_core::SchemaVersion;
///
/// let v: SchemaVersion = "2.3.1".parse().unwrap();
/// assert_eq!(v.increment_major().unwrap().to_string(), "3.0.0");
/// assert_eq!(SchemaVersion::INITIAL.to_string(), "1.0.0");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SchemaVersion {
    /// Version given to the first publication of a draft.
    pub const INITIAL: SchemaVersion = SchemaVersion::new(1, 0, 0);

    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Returns the next major version with minor and patch reset to zero.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::VersionOverflow`] if `major` is already at
    /// its maximum.
    pub fn increment_major(&self) -> Result<Self, ValidationError> {
        let major = self
            .major
            .checked_add(1)
            .ok_or_else(|| ValidationError::VersionOverflow(self.to_string()))?;
        Ok(Self::new(major, 0, 0))
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SchemaVersion {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidVersion(s.to_string());
        let mut parts = s.split('.');
        let mut next = || -> Result<u64, ValidationError> {
            let part = parts.next().ok_or_else(invalid)?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };
        let version = Self::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }
}

impl TryFrom<String> for SchemaVersion {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SchemaVersion> for String {
    fn from(version: SchemaVersion) -> Self {
        version.to_string()
    }
}
