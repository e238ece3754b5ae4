//! Operations: one addressable action on a resource.
//!
//! An [`Operation`] is the fully merged, immutable result of combining the
//! configuration defaults, the resource-level attributes and the operation's
//! own declaration. It is deserialized from the merged attribute map, so
//! every recognised key has a typed field and anything else is preserved in
//! [`Operation::extra_properties`].
//!
//! # Example
//!
//! ```
//! use daedalus_core::operation::{Operation, OperationKind};
//! use daedalus_core::attributes::AttributeMap;
//! use serde_json::json;
//!
//! let mut attributes = AttributeMap::new();
//! attributes.insert("name".into(), json!("_api_/books/{id}{._format}_get"));
//! attributes.insert("method".into(), json!("GET"));
//! attributes.insert("class".into(), json!("App\\Entity\\Book"));
//! attributes.insert("short_name".into(), json!("Book"));
//! attributes.insert("normalization_context".into(), json!({"groups": ["book:read"]}));
//! attributes.insert("mercure_topic".into(), json!("books"));
//!
//! let operation = Operation::from_attributes(&attributes).unwrap();
//! assert_eq!(operation.kind(), OperationKind::Get);
//! assert_eq!(operation.normalization_groups(), Some(vec!["book:read".to_string()]));
//! assert_eq!(operation.extra_properties()["mercure_topic"], json!("books"));
//! ```

use std::fmt;

use http::Method;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::attributes::AttributeMap;
use crate::class::short_name;
use crate::error::{MetadataError, MetadataResult};

/// Format name to mime types, e.g. `{"jsonld": ["application/ld+json"]}`.
pub type Formats = IndexMap<String, Vec<String>>;

/// The built-in operation kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Read one item.
    Get,
    /// Read a collection.
    GetCollection,
    /// Create an item in a collection.
    Post,
    /// Replace an item.
    Put,
    /// Partially update an item.
    Patch,
    /// Delete an item.
    Delete,
    /// Any other method.
    Custom(Method),
}

impl OperationKind {
    /// The operations generated for a resource that declares none, in order.
    pub fn defaults() -> [Self; 6] {
        [
            Self::Get,
            Self::GetCollection,
            Self::Post,
            Self::Put,
            Self::Patch,
            Self::Delete,
        ]
    }

    /// Parses a kind name such as `GetCollection`, `get_collection` or a
    /// namespaced class name ending in one of those.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = short_name(name)
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        let kind = match normalized.as_str() {
            "get" => Self::Get,
            "getcollection" => Self::GetCollection,
            "post" => Self::Post,
            "put" => Self::Put,
            "patch" => Self::Patch,
            "delete" => Self::Delete,
            _ => return None,
        };
        Some(kind)
    }

    /// Returns the kind for an HTTP method and scope.
    pub fn from_method(method: &Method, collection: bool) -> Self {
        match *method {
            Method::GET if collection => Self::GetCollection,
            Method::GET => Self::Get,
            Method::POST => Self::Post,
            Method::PUT => Self::Put,
            Method::PATCH => Self::Patch,
            Method::DELETE => Self::Delete,
            _ => Self::Custom(method.clone()),
        }
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> Method {
        match self {
            Self::Get | Self::GetCollection => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Patch => Method::PATCH,
            Self::Delete => Method::DELETE,
            Self::Custom(method) => method.clone(),
        }
    }

    /// Returns true for collection-scoped kinds.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::GetCollection | Self::Post)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("Get"),
            Self::GetCollection => f.write_str("GetCollection"),
            Self::Post => f.write_str("Post"),
            Self::Put => f.write_str("Put"),
            Self::Patch => f.write_str("Patch"),
            Self::Delete => f.write_str("Delete"),
            Self::Custom(method) => write!(f, "Custom({method})"),
        }
    }
}

/// Pagination policy of an operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationSettings {
    /// Whether pagination is enabled.
    pub enabled: Option<bool>,
    /// Whether clients may toggle pagination.
    pub client_enabled: Option<bool>,
    /// Items per page.
    pub items_per_page: Option<u64>,
    /// Whether clients may change the page size.
    pub client_items_per_page: Option<bool>,
    /// Upper bound for the page size.
    pub maximum_items_per_page: Option<u64>,
    /// Whether partial pagination is used.
    pub partial: Option<bool>,
}

/// A fully resolved operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    name: String,
    #[serde(with = "http_method_serde")]
    method: Method,
    #[serde(default)]
    collection: bool,
    #[serde(default)]
    priority: i64,
    class: String,
    short_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uri_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    route_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    normalization_context: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    denormalization_context: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    validation_context: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    security: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    security_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    security_post_denormalize: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    security_post_denormalize_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "formats_serde::deserialize"
    )]
    formats: Option<Formats>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "formats_serde::deserialize"
    )]
    input_formats: Option<Formats>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "formats_serde::deserialize"
    )]
    output_formats: Option<Formats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pagination_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pagination_client_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pagination_items_per_page: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pagination_client_items_per_page: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pagination_maximum_items_per_page: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pagination_partial: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cache_headers: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filters: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    processor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    deprecation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    openapi_context: Option<Map<String, Value>>,
    #[serde(flatten)]
    extra_properties: AttributeMap,
}

impl Operation {
    /// Builds an operation from a merged attribute map.
    ///
    /// The map must carry `name`, `method`, `class` and `short_name`.
    pub fn from_attributes(attributes: &AttributeMap) -> MetadataResult<Self> {
        let object: Map<String, Value> = attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let name = attributes
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("<unnamed>")
            .to_string();

        serde_json::from_value(Value::Object(object)).map_err(|e| {
            MetadataError::invalid_declaration(format!("operation \"{name}\": {e}"))
        })
    }

    /// Returns the operation as a flat attribute map.
    pub fn to_attributes(&self) -> AttributeMap {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map.into_iter().collect(),
            _ => AttributeMap::new(),
        }
    }

    /// Returns the operation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the operation kind.
    pub fn kind(&self) -> OperationKind {
        OperationKind::from_method(&self.method, self.collection)
    }

    /// Returns true for collection-scoped operations.
    pub fn is_collection(&self) -> bool {
        self.collection
    }

    /// Returns the priority; lower sorts first.
    pub fn priority(&self) -> i64 {
        self.priority
    }

    /// Returns the resource class.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Returns the resource short name.
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Returns the URI template.
    pub fn uri_template(&self) -> Option<&str> {
        self.uri_template.as_deref()
    }

    /// Returns the route prefix.
    pub fn route_prefix(&self) -> Option<&str> {
        self.route_prefix.as_deref()
    }

    /// Returns the description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the RDF types.
    pub fn types(&self) -> Option<&[String]> {
        self.types.as_deref()
    }

    /// Returns the input class override.
    pub fn input(&self) -> Option<&Value> {
        self.input.as_ref()
    }

    /// Returns the output class override.
    pub fn output(&self) -> Option<&Value> {
        self.output.as_ref()
    }

    /// Returns the normalization context.
    pub fn normalization_context(&self) -> Option<&Map<String, Value>> {
        self.normalization_context.as_ref()
    }

    /// Returns the denormalization context.
    pub fn denormalization_context(&self) -> Option<&Map<String, Value>> {
        self.denormalization_context.as_ref()
    }

    /// Returns the validation context.
    pub fn validation_context(&self) -> Option<&Map<String, Value>> {
        self.validation_context.as_ref()
    }

    /// Returns the serializer groups of the normalization context.
    pub fn normalization_groups(&self) -> Option<Vec<String>> {
        self.normalization_context.as_ref().and_then(groups_of)
    }

    /// Returns the serializer groups of the denormalization context.
    pub fn denormalization_groups(&self) -> Option<Vec<String>> {
        self.denormalization_context.as_ref().and_then(groups_of)
    }

    /// Returns the security expression.
    pub fn security(&self) -> Option<&str> {
        self.security.as_deref()
    }

    /// Returns the security message.
    pub fn security_message(&self) -> Option<&str> {
        self.security_message.as_deref()
    }

    /// Returns the post-denormalize security expression.
    pub fn security_post_denormalize(&self) -> Option<&str> {
        self.security_post_denormalize.as_deref()
    }

    /// Returns the post-denormalize security message.
    pub fn security_post_denormalize_message(&self) -> Option<&str> {
        self.security_post_denormalize_message.as_deref()
    }

    /// Returns the response status code.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns the formats.
    pub fn formats(&self) -> Option<&Formats> {
        self.formats.as_ref()
    }

    /// Returns the input formats.
    pub fn input_formats(&self) -> Option<&Formats> {
        self.input_formats.as_ref()
    }

    /// Returns the output formats.
    pub fn output_formats(&self) -> Option<&Formats> {
        self.output_formats.as_ref()
    }

    /// Returns the pagination settings.
    pub fn pagination(&self) -> PaginationSettings {
        PaginationSettings {
            enabled: self.pagination_enabled,
            client_enabled: self.pagination_client_enabled,
            items_per_page: self.pagination_items_per_page,
            client_items_per_page: self.pagination_client_items_per_page,
            maximum_items_per_page: self.pagination_maximum_items_per_page,
            partial: self.pagination_partial,
        }
    }

    /// Returns the cache headers.
    pub fn cache_headers(&self) -> Option<&Map<String, Value>> {
        self.cache_headers.as_ref()
    }

    /// Returns the filter service identifiers.
    pub fn filters(&self) -> &[String] {
        self.filters.as_deref().unwrap_or_default()
    }

    /// Returns the state provider identifier.
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Returns the state processor identifier.
    pub fn processor(&self) -> Option<&str> {
        self.processor.as_deref()
    }

    /// Returns the deprecation reason.
    pub fn deprecation_reason(&self) -> Option<&str> {
        self.deprecation_reason.as_deref()
    }

    /// Returns the OpenAPI context.
    pub fn openapi_context(&self) -> Option<&Map<String, Value>> {
        self.openapi_context.as_ref()
    }

    /// Returns the unrecognised attributes, preserved verbatim.
    pub fn extra_properties(&self) -> &AttributeMap {
        &self.extra_properties
    }

    /// Returns a copy with the name set.
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Returns a copy with the priority set.
    pub fn with_priority(&self, priority: i64) -> Self {
        Self {
            priority,
            ..self.clone()
        }
    }

    /// Returns a copy with the URI template set.
    pub fn with_uri_template(&self, uri_template: impl Into<String>) -> Self {
        Self {
            uri_template: Some(uri_template.into()),
            ..self.clone()
        }
    }

    /// Returns a copy with the formats set.
    pub fn with_formats(&self, formats: Formats) -> Self {
        Self {
            formats: Some(formats),
            ..self.clone()
        }
    }

    /// Returns a copy with the input formats set.
    pub fn with_input_formats(&self, formats: Formats) -> Self {
        Self {
            input_formats: Some(formats),
            ..self.clone()
        }
    }

    /// Returns a copy with the output formats set.
    pub fn with_output_formats(&self, formats: Formats) -> Self {
        Self {
            output_formats: Some(formats),
            ..self.clone()
        }
    }

    /// Returns a copy with the security expression set.
    pub fn with_security(&self, security: impl Into<String>) -> Self {
        Self {
            security: Some(security.into()),
            ..self.clone()
        }
    }

    /// Returns a copy with an extra property added or replaced.
    pub fn with_extra_property(&self, key: impl Into<String>, value: Value) -> Self {
        let mut copy = self.clone();
        copy.extra_properties.insert(key.into(), value);
        copy
    }
}

fn groups_of(context: &Map<String, Value>) -> Option<Vec<String>> {
    match context.get("groups")? {
        Value::String(group) => Some(vec![group.clone()]),
        Value::Array(groups) => Some(
            groups
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    }
}

mod http_method_serde {
    use http::Method;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(method: &Method, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(method.as_str())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Method, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.to_ascii_uppercase()
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

/// Accepts `["jsonld", "json"]`, `{"jsonld": "application/ld+json"}` or
/// `{"jsonld": ["application/ld+json"]}`.
mod formats_serde {
    use indexmap::IndexMap;
    use serde::{Deserialize, Deserializer};

    use super::Formats;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MimeTypes {
        One(String),
        Many(Vec<String>),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Names(Vec<String>),
        Map(IndexMap<String, MimeTypes>),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Formats>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = Option::<Repr>::deserialize(deserializer)?;
        Ok(repr.map(|repr| match repr {
            Repr::Names(names) => names.into_iter().map(|n| (n, Vec::new())).collect(),
            Repr::Map(map) => map
                .into_iter()
                .map(|(name, mime)| {
                    let mime_types = match mime {
                        MimeTypes::One(m) => vec![m],
                        MimeTypes::Many(m) => m,
                    };
                    (name, mime_types)
                })
                .collect(),
        }))
    }
}
