//! Property-level metadata value objects.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::attributes::AttributeMap;
use crate::error::{MetadataError, MetadataResult};
use crate::types::Type;

/// Ordered set of names; the first occurrence of a name wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameCollection {
    names: IndexSet<String>,
}

/// Property names exposed by a resource class.
pub type PropertyNameCollection = NameCollection;

/// Classes declared as resources.
pub type ResourceNameCollection = NameCollection;

impl NameCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a name unless already present. Returns true when added.
    pub fn push(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    /// Appends every name of `other` not already present.
    pub fn extend_from(&mut self, other: &NameCollection) {
        for name in other {
            self.push(name.clone());
        }
    }

    /// Returns true when the name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Iterates over the names in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.names.iter()
    }

    /// Returns the number of names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true when empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the names as a vector of string slices.
    pub fn to_vec(&self) -> Vec<&str> {
        self.names.iter().map(String::as_str).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for NameCollection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut collection = Self::new();
        for name in iter {
            collection.push(name);
        }
        collection
    }
}

impl<'a> IntoIterator for &'a NameCollection {
    type Item = &'a String;
    type IntoIter = indexmap::set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

impl IntoIterator for NameCollection {
    type Item = String;
    type IntoIter = indexmap::set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}

/// Context passed to property factories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyOptions {
    /// Serializer groups of the operation being resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serializer_groups: Option<Vec<String>>,
    /// Validation groups of the operation being resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_groups: Option<Vec<String>>,
    /// Operation name the property is resolved for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl PropertyOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the validation groups.
    pub fn with_validation_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.validation_groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the serializer groups.
    pub fn with_serializer_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.serializer_groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the operation name.
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Returns a stable textual form, used for cache keys.
    pub fn cache_discriminator(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Metadata of one property of a resource class.
///
/// Every field is optional: `None` means "not decided by any layer yet".
/// Layers combine with [`PropertyMetadata::merge_over`].
///
/// # Example
///
/// ```
/// use daedalus_core::property::PropertyMetadata;
///
/// let base = PropertyMetadata::new().with_readable(true).with_description("Base");
/// let layer = PropertyMetadata::new().with_description("Title of the book");
/// let merged = layer.merge_over(&base);
///
/// assert_eq!(merged.description(), Some("Title of the book"));
/// assert_eq!(merged.readable(), Some(true));
/// assert!(!merged.is_required());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PropertyMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    readable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    writable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    readable_link: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    writable_link: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    identifier: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    iri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    builtin_types: Option<Vec<Type>>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "present_value")]
    default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "present_value")]
    example: Option<Value>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    schema: IndexMap<String, Value>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    extra_properties: AttributeMap,
}

// A present `null` is a declared null default, not an undecided one.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Declaration keys mapped onto [`PropertyMetadata`] fields.
const FIELDS: &[&str] = &[
    "description",
    "readable",
    "writable",
    "readable_link",
    "writable_link",
    "identifier",
    "required",
    "iri",
    "types",
    "builtin_types",
    "default",
    "example",
    "schema",
];

impl PropertyMetadata {
    /// Creates metadata with every field undecided.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds metadata from a property declaration.
    ///
    /// Keys with a dedicated field are parsed into it; every other key,
    /// including the contents of an `extra_properties` map, lands in the extra
    /// properties. `null` values leave the field undecided.
    pub fn from_declaration(declaration: &AttributeMap) -> MetadataResult<Self> {
        let mut known = Map::new();
        let mut extra = AttributeMap::new();

        for (key, value) in declaration {
            if value.is_null() {
                continue;
            }
            if FIELDS.contains(&key.as_str()) {
                known.insert(key.clone(), value.clone());
            } else if key == "extra_properties" {
                match value {
                    Value::Object(map) => {
                        extra.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
                    }
                    other => {
                        return Err(MetadataError::invalid_declaration(format!(
                            "\"extra_properties\" must be a map, got {other}"
                        )))
                    }
                }
            } else {
                extra.insert(key.clone(), value.clone());
            }
        }

        let mut metadata: Self = serde_json::from_value(Value::Object(known))
            .map_err(|e| MetadataError::invalid_declaration(format!("property declaration: {e}")))?;
        metadata.extra_properties.extend(extra);
        Ok(metadata)
    }

    /// Combines `self` (the more specific layer) over `inner`.
    ///
    /// Decided fields of `self` win, undecided ones keep the inner value. The
    /// schema restrictions and extra properties are merged key by key.
    pub fn merge_over(&self, inner: &PropertyMetadata) -> PropertyMetadata {
        let mut schema = inner.schema.clone();
        schema.extend(self.schema.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut extra_properties = inner.extra_properties.clone();
        extra_properties.extend(
            self.extra_properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        PropertyMetadata {
            description: self.description.clone().or_else(|| inner.description.clone()),
            readable: self.readable.or(inner.readable),
            writable: self.writable.or(inner.writable),
            readable_link: self.readable_link.or(inner.readable_link),
            writable_link: self.writable_link.or(inner.writable_link),
            identifier: self.identifier.or(inner.identifier),
            required: self.required.or(inner.required),
            iri: self.iri.clone().or_else(|| inner.iri.clone()),
            types: self.types.clone().or_else(|| inner.types.clone()),
            builtin_types: self
                .builtin_types
                .clone()
                .or_else(|| inner.builtin_types.clone()),
            default: self.default.clone().or_else(|| inner.default.clone()),
            example: self.example.clone().or_else(|| inner.example.clone()),
            schema,
            extra_properties,
        }
    }

    /// Returns the description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the readable flag, if decided.
    pub fn readable(&self) -> Option<bool> {
        self.readable
    }

    /// Returns the writable flag, if decided.
    pub fn writable(&self) -> Option<bool> {
        self.writable
    }

    /// Returns the readable link flag, if decided.
    pub fn readable_link(&self) -> Option<bool> {
        self.readable_link
    }

    /// Returns the writable link flag, if decided.
    pub fn writable_link(&self) -> Option<bool> {
        self.writable_link
    }

    /// Returns the identifier flag, if decided.
    pub fn identifier(&self) -> Option<bool> {
        self.identifier
    }

    /// Returns true for identifier properties.
    pub fn is_identifier(&self) -> bool {
        self.identifier.unwrap_or(false)
    }

    /// Returns the required flag, if decided.
    pub fn required(&self) -> Option<bool> {
        self.required
    }

    /// Returns true when the property is required. Undecided means not required.
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }

    /// Returns the IRI.
    pub fn iri(&self) -> Option<&str> {
        self.iri.as_deref()
    }

    /// Returns the RDF types.
    pub fn types(&self) -> Option<&[String]> {
        self.types.as_deref()
    }

    /// Returns the builtin types.
    pub fn builtin_types(&self) -> Option<&[Type]> {
        self.builtin_types.as_deref()
    }

    /// Returns the default value.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns the example value.
    pub fn example(&self) -> Option<&Value> {
        self.example.as_ref()
    }

    /// Returns the schema restrictions.
    pub fn schema(&self) -> &IndexMap<String, Value> {
        &self.schema
    }

    /// Returns the extra properties.
    pub fn extra_properties(&self) -> &AttributeMap {
        &self.extra_properties
    }

    /// Returns a copy with the description set.
    pub fn with_description(&self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self.clone()
        }
    }

    /// Returns a copy with the readable flag set.
    pub fn with_readable(&self, readable: bool) -> Self {
        Self {
            readable: Some(readable),
            ..self.clone()
        }
    }

    /// Returns a copy with the writable flag set.
    pub fn with_writable(&self, writable: bool) -> Self {
        Self {
            writable: Some(writable),
            ..self.clone()
        }
    }

    /// Returns a copy with the readable link flag set.
    pub fn with_readable_link(&self, readable_link: bool) -> Self {
        Self {
            readable_link: Some(readable_link),
            ..self.clone()
        }
    }

    /// Returns a copy with the writable link flag set.
    pub fn with_writable_link(&self, writable_link: bool) -> Self {
        Self {
            writable_link: Some(writable_link),
            ..self.clone()
        }
    }

    /// Returns a copy with the identifier flag set.
    pub fn with_identifier(&self, identifier: bool) -> Self {
        Self {
            identifier: Some(identifier),
            ..self.clone()
        }
    }

    /// Returns a copy with the required flag set.
    pub fn with_required(&self, required: bool) -> Self {
        Self {
            required: Some(required),
            ..self.clone()
        }
    }

    /// Returns a copy with the IRI set.
    pub fn with_iri(&self, iri: impl Into<String>) -> Self {
        Self {
            iri: Some(iri.into()),
            ..self.clone()
        }
    }

    /// Returns a copy with the RDF types set.
    pub fn with_types(&self, types: Vec<String>) -> Self {
        Self {
            types: Some(types),
            ..self.clone()
        }
    }

    /// Returns a copy with the builtin types set.
    pub fn with_builtin_types(&self, builtin_types: Vec<Type>) -> Self {
        Self {
            builtin_types: Some(builtin_types),
            ..self.clone()
        }
    }

    /// Returns a copy with the default value set.
    pub fn with_default(&self, default: Value) -> Self {
        Self {
            default: Some(default),
            ..self.clone()
        }
    }

    /// Returns a copy with the example value set.
    pub fn with_example(&self, example: Value) -> Self {
        Self {
            example: Some(example),
            ..self.clone()
        }
    }

    /// Returns a copy with one schema restriction added or replaced.
    pub fn with_schema_entry(&self, key: impl Into<String>, value: Value) -> Self {
        let mut copy = self.clone();
        copy.schema.insert(key.into(), value);
        copy
    }

    /// Returns a copy with the schema restrictions merged in key by key.
    pub fn with_schema(&self, schema: IndexMap<String, Value>) -> Self {
        let mut copy = self.clone();
        copy.schema.extend(schema);
        copy
    }

    /// Returns a copy with one extra property added or replaced.
    pub fn with_extra_property(&self, key: impl Into<String>, value: Value) -> Self {
        let mut copy = self.clone();
        copy.extra_properties.insert(key.into(), value);
        copy
    }
}
