//! Recursive merging of free-form field options.
//!
//! Data fields carry an open key/value map whose contents are only
//! interpreted downstream. Updates arrive as partial maps and are merged into
//! the existing options: keys from the update win, nested objects merge
//! recursively, and every other value (arrays included) is replaced whole.
//!
//! # Example
//!
//! ```
//! use product_schema_core::{DataFieldOptions, merge_options};
//! use serde_json::json;
//!
//! let mut options: DataFieldOptions = json!({
//!     "unit": "kg",
//!     "limits": {"min": 0, "max": 10},
//!     "tags": ["a", "b"]
//! })
//! .as_object()
//! .cloned()
//! .unwrap();
//!
//! let patch = json!({"limits": {"max": 20}, "tags": ["c"]})
//!     .as_object()
//!     .cloned()
//!     .unwrap();
//!
//! merge_options(&mut options, patch);
//! assert_eq!(options["limits"], json!({"min": 0, "max": 20}));
//! assert_eq!(options["tags"], json!(["c"]));
//! assert_eq!(options["unit"], json!("kg"));
//! ```

use serde_json::{Map, Value};

/// Insertion-ordered, string-keyed map of loosely typed option values.
pub type DataFieldOptions = Map<String, Value>;

/// Merges `patch` into `target`.
pub fn merge_options(target: &mut DataFieldOptions, patch: DataFieldOptions) {
    for (key, incoming) in patch {
        match incoming {
            Value::Object(nested) => {
                if let Some(Value::Object(existing)) = target.get_mut(&key) {
                    merge_options(existing, nested);
                    continue;
                }
                target.insert(key, Value::Object(nested));
            }
            other => {
                target.insert(key, other);
            }
        }
    }
}
