//! Attribute maps and the merge/override resolver.
//!
//! Every declaration layer (global defaults, resource-level attributes,
//! operation-level attributes) is an [`AttributeMap`]: an insertion-ordered map
//! from canonical snake_case keys to JSON values. Layers are combined with
//! [`merge`], where the more specific layer overrides the more general one.
//!
//! # Merge rules
//!
//! - A key absent from the override keeps the base value.
//! - A key explicitly set to `null` in the override removes the base value.
//! - Two objects are merged one level deep with the same absent/null rule.
//! - Anything else (scalars, arrays) is replaced wholesale, unless the key is
//!   listed in [`MergeOptions::additive_keys`].
//! - Format maps (`formats`, `input_formats`, `output_formats`) are always
//!   replaced wholesale, never merged.
//!
//! # Example
//!
//! ```
//! use daedalus_core::attributes::{merge, AttributeMap};
//! use serde_json::json;
//!
//! let base: AttributeMap = [
//!     ("security".to_string(), json!("is_granted('ROLE_USER')")),
//!     ("normalization_context".to_string(), json!({"groups": ["a"], "skip_null_values": true})),
//! ].into_iter().collect();
//! let overrides: AttributeMap = [
//!     ("security".to_string(), json!(null)),
//!     ("normalization_context".to_string(), json!({"groups": ["b"]})),
//! ].into_iter().collect();
//!
//! let merged = merge(&base, &overrides);
//! assert!(!merged.contains_key("security"));
//! assert_eq!(merged["normalization_context"], json!({"groups": ["b"], "skip_null_values": true}));
//! ```

use std::collections::HashSet;
use std::fmt;

use convert_case::{Case, Casing};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Ordered map of canonical attribute names to values.
pub type AttributeMap = IndexMap<String, Value>;

/// Deprecated attribute keys and their replacements.
pub const DEPRECATED_KEYS: &[(&str, &str)] = &[
    ("access_control", "security"),
    ("access_control_message", "security_message"),
    ("swagger_context", "openapi_context"),
];

/// Returns the canonical (snake_case) form of an attribute key.
///
/// Keys that are already lower case are returned unchanged, so digits and
/// leading underscores survive untouched.
///
/// ```
/// use daedalus_core::attributes::canonical_key;
///
/// assert_eq!(canonical_key("normalizationContext"), "normalization_context");
/// assert_eq!(canonical_key("accessControlMessage"), "access_control_message");
/// assert_eq!(canonical_key("pagination_items_per_page"), "pagination_items_per_page");
/// ```
pub fn canonical_key(key: &str) -> String {
    if key.chars().any(|c| c.is_ascii_uppercase()) {
        key.to_case(Case::Snake)
    } else {
        key.to_string()
    }
}

/// Canonicalises the top-level keys of a map, keeping order.
///
/// When two spellings of the same key are present, the later one wins.
pub fn canonicalize(map: &Map<String, Value>) -> AttributeMap {
    map.iter()
        .map(|(key, value)| (canonical_key(key), value.clone()))
        .collect()
}

/// Keys replaced wholesale even when both layers hold an object.
pub const REPLACE_KEYS: &[&str] = &["formats", "input_formats", "output_formats"];

/// Options controlling [`merge_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    /// Keys whose array values are concatenated instead of replaced.
    pub additive_keys: HashSet<String>,
    /// Keys whose object values replace the base instead of merging into it.
    /// Defaults to [`REPLACE_KEYS`].
    pub replace_keys: HashSet<String>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            additive_keys: HashSet::new(),
            replace_keys: REPLACE_KEYS.iter().map(|key| (*key).to_string()).collect(),
        }
    }
}

impl MergeOptions {
    /// Creates options with the given additive keys.
    pub fn additive<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            additive_keys: keys.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    fn is_additive(&self, key: &str) -> bool {
        self.additive_keys.contains(key)
    }

    fn is_replaced(&self, key: &str) -> bool {
        self.replace_keys.contains(key)
    }
}

/// Merges `overrides` over `base` using the default (wholesale replace) rules.
pub fn merge(base: &AttributeMap, overrides: &AttributeMap) -> AttributeMap {
    merge_with(base, overrides, &MergeOptions::default())
}

/// Merges `overrides` over `base`.
///
/// See the module documentation for the exact rules.
pub fn merge_with(base: &AttributeMap, overrides: &AttributeMap, options: &MergeOptions) -> AttributeMap {
    let mut merged = base.clone();

    for (key, value) in overrides {
        match value {
            Value::Null => {
                merged.shift_remove(key);
            }
            Value::Object(nested) => match merged.get_mut(key) {
                Some(Value::Object(existing)) if !options.is_replaced(key) => merge_nested(existing, nested, options),
                _ => {
                    merged.insert(key.clone(), Value::Object(without_nulls(nested)));
                }
            },
            Value::Array(items) if options.is_additive(key) => {
                if let Some(Value::Array(existing)) = merged.get_mut(key) {
                    append_unique(existing, items);
                } else {
                    merged.insert(key.clone(), value.clone());
                }
            }
            _ => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }

    merged
}

// One level deep only: nested values below this level are replaced as a whole.
fn merge_nested(existing: &mut Map<String, Value>, overrides: &Map<String, Value>, options: &MergeOptions) {
    for (key, value) in overrides {
        match value {
            Value::Null => {
                existing.remove(key);
            }
            Value::Array(items) if options.is_additive(key) => {
                if let Some(Value::Array(current)) = existing.get_mut(key) {
                    append_unique(current, items);
                } else {
                    existing.insert(key.clone(), value.clone());
                }
            }
            _ => {
                existing.insert(key.clone(), value.clone());
            }
        }
    }
}

fn without_nulls(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn append_unique(target: &mut Vec<Value>, items: &[Value]) {
    for item in items {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

/// A deprecated key that was rewritten during remapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deprecation {
    /// The deprecated key found in the declaration.
    pub deprecated: &'static str,
    /// The key it was moved to.
    pub replacement: &'static str,
}

impl fmt::Display for Deprecation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attribute \"{}\" is deprecated, use \"{}\" instead",
            self.deprecated, self.replacement
        )
    }
}

/// Rewrites deprecated keys to their replacements in place.
///
/// The deprecated key is always removed. Its value is moved to the
/// replacement key unless the replacement is already declared, in which case
/// the replacement wins. Returns the deprecations that were applied so callers
/// can emit a signal for each of them.
///
/// ```
/// use daedalus_core::attributes::{remap_deprecated, AttributeMap};
/// use serde_json::json;
///
/// let mut attributes: AttributeMap =
///     [("access_control".to_string(), json!("is_granted('ROLE_ADMIN')"))].into_iter().collect();
/// let applied = remap_deprecated(&mut attributes);
///
/// assert_eq!(applied.len(), 1);
/// assert_eq!(attributes["security"], json!("is_granted('ROLE_ADMIN')"));
/// assert!(!attributes.contains_key("access_control"));
/// ```
pub fn remap_deprecated(attributes: &mut AttributeMap) -> Vec<Deprecation> {
    let mut applied = Vec::new();

    for &(deprecated, replacement) in DEPRECATED_KEYS {
        if let Some(value) = attributes.shift_remove(deprecated) {
            if !attributes.contains_key(replacement) {
                attributes.insert(replacement.to_string(), value);
            }
            applied.push(Deprecation {
                deprecated,
                replacement,
            });
        }
    }

    applied
}

/// Returns the value of a string attribute, if present and a string.
pub fn string_attribute<'a>(attributes: &'a AttributeMap, key: &str) -> Option<&'a str> {
    attributes.get(key).and_then(Value::as_str)
}
