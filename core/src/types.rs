//! Enumerations shared by drafts and published templates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether data is captured once per product model or once per item.
///
/// # Examples
///
/// ```
/// use product_schema_core::GranularityLevel;
///
/// assert_eq!("MODEL".parse::<GranularityLevel>(), Ok(GranularityLevel::Model));
/// assert_eq!(GranularityLevel::Item.to_string(), "ITEM");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GranularityLevel {
    /// One value per product model.
    Model,
    /// One value per physical item.
    Item,
}

/// Kind of section container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionType {
    /// A single logical row of data.
    Group,
    /// Zero or more repeated rows. Only allowed at the root.
    Repeatable,
}

/// Type of a data field. Fixed for the lifetime of the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataFieldType {
    /// Free text.
    TextField,
    /// Link to another product passport.
    ProductPassportLink,
    /// Numeric value.
    NumericField,
    /// Uploaded file reference.
    FileField,
}

/// Error returned when parsing one of the enums in this module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

macro_rules! string_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// Returns the persisted spelling.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum!(GranularityLevel, "granularity level", {
    Model => "MODEL",
    Item => "ITEM",
});

string_enum!(SectionType, "section type", {
    Group => "GROUP",
    Repeatable => "REPEATABLE",
});

string_enum!(DataFieldType, "data field type", {
    TextField => "TEXT_FIELD",
    ProductPassportLink => "PRODUCT_PASSPORT_LINK",
    NumericField => "NUMERIC_FIELD",
    FileField => "FILE_FIELD",
});

/// Direction used when reordering sections or fields among their siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_spelling_matches_as_str() {
        let json = serde_json::to_string(&DataFieldType::ProductPassportLink).unwrap();
        assert_eq!(json, "\"PRODUCT_PASSPORT_LINK\"");
        assert_eq!(
            DataFieldType::ProductPassportLink.as_str(),
            "PRODUCT_PASSPORT_LINK"
        );

        let json = serde_json::to_string(&SectionType::Repeatable).unwrap();
        assert_eq!(json, "\"REPEATABLE\"");
    }

    #[test]
    fn test_parse_unknown_value() {
        let err = "ROW".parse::<SectionType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown section type: ROW");
    }
}
