//! Identifier newtypes.
//!
//! Every entity is referenced by a string identity. Sections reference their
//! parent and children only through [`SectionId`] values, never through
//! embedded objects, so the tree can be stored as a flat list.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an existing identifier string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

macro_rules! generated_id {
    ($name:ident) => {
        impl $name {
            /// Returns a fresh random identity.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }
        }
    };
}

string_id!(
    /// Identity of a template draft or a published template.
    TemplateId
);
string_id!(
    /// Identity of a section. Stable across publications.
    SectionId
);
string_id!(
    /// Identity of a data field. Stable across publications.
    DataFieldId
);
string_id!(
    /// User identity assigned by the authentication layer.
    UserId
);
string_id!(
    /// Organization identity assigned by the authentication layer.
    OrganizationId
);

generated_id!(TemplateId);
generated_id!(SectionId);
generated_id!(DataFieldId);
