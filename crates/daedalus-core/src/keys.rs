//! Recognised declaration keys.
//!
//! Resource-level and property-level declarations are validated against these
//! lists. Operation declarations are not: unknown operation keys end up in the
//! operation's extra properties, spelled as declared.

use crate::attributes::{AttributeMap, DEPRECATED_KEYS};

/// Keys accepted on a resource declaration (canonical snake_case form).
pub const RESOURCE_KEYS: &[&str] = &[
    "short_name",
    "description",
    "iri",
    "types",
    "uri_template",
    "route_prefix",
    "operations",
    "item_operations",
    "collection_operations",
    "normalization_context",
    "denormalization_context",
    "validation_context",
    "security",
    "security_message",
    "security_post_denormalize",
    "security_post_denormalize_message",
    "security_post_validation",
    "security_post_validation_message",
    "input",
    "output",
    "status",
    "formats",
    "input_formats",
    "output_formats",
    "pagination_enabled",
    "pagination_client_enabled",
    "pagination_items_per_page",
    "pagination_client_items_per_page",
    "pagination_maximum_items_per_page",
    "pagination_partial",
    "pagination_client_partial",
    "pagination_fetch_join_collection",
    "pagination_via_cursor",
    "cache_headers",
    "filters",
    "provider",
    "processor",
    "order",
    "deprecation_reason",
    "requirements",
    "defaults",
    "options",
    "host",
    "schemes",
    "condition",
    "stateless",
    "sunset",
    "hydra_context",
    "openapi_context",
    "mercure",
    "messenger",
    "elasticsearch",
    "fetch_partial",
    "force_eager",
    "extra_properties",
];

/// Keys only meaningful on an operation declaration (canonical form).
pub const OPERATION_ONLY_KEYS: &[&str] = &[
    "name",
    "kind",
    "class",
    "method",
    "collection",
    "priority",
    "uri_variables",
    "controller",
    "read",
    "write",
    "validate",
    "deserialize",
    "serialize",
    "query_parameter_validation_enabled",
];

/// Keys accepted on a property declaration (canonical snake_case form).
pub const PROPERTY_KEYS: &[&str] = &[
    "description",
    "readable",
    "writable",
    "readable_link",
    "writable_link",
    "required",
    "identifier",
    "iri",
    "default",
    "example",
    "schema",
    "types",
    "builtin_types",
    "deprecation_reason",
    "fetchable",
    "fetch_eager",
    "push",
    "security",
    "security_post_denormalize",
    "initializable",
    "genid",
    "json_schema_context",
    "openapi_context",
    "jsonld_context",
    "extra_properties",
];

/// Returns true when `key` may appear on a resource declaration.
pub fn is_resource_key(key: &str) -> bool {
    RESOURCE_KEYS.contains(&key) || DEPRECATED_KEYS.iter().any(|(old, _)| *old == key)
}

/// Returns true when `key` has a meaning on an operation declaration.
pub fn is_operation_key(key: &str) -> bool {
    is_resource_key(key) || OPERATION_ONLY_KEYS.contains(&key)
}

/// Returns true when `key` may appear on a property declaration.
pub fn is_property_key(key: &str) -> bool {
    PROPERTY_KEYS.contains(&key)
}

/// Returns the first key of `attributes` not accepted on a resource declaration.
pub fn first_unknown_resource_key(attributes: &AttributeMap) -> Option<&str> {
    attributes
        .keys()
        .map(String::as_str)
        .find(|key| !is_resource_key(key))
}

/// Returns the first key of `attributes` not accepted on a property declaration.
pub fn first_unknown_property_key(attributes: &AttributeMap) -> Option<&str> {
    attributes
        .keys()
        .map(String::as_str)
        .find(|key| !is_property_key(key))
}
