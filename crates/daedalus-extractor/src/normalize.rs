//! Shared normalisation of raw declarations.
//!
//! Every extractor funnels its parsed maps through here so that keys are
//! canonical and resource/property keys are checked against the recognised
//! schema, whatever the source format.

use daedalus_core::attributes::{canonical_key, canonicalize, AttributeMap};
use daedalus_core::keys::{first_unknown_property_key, first_unknown_resource_key, is_operation_key};
use serde_json::{Map, Value};

use crate::error::{ExtractError, ExtractResult};

/// Keys holding nested operation declarations.
pub const OPERATION_KEYS: &[&str] = &["operations", "item_operations", "collection_operations"];

/// Canonicalises and validates a resource declaration.
///
/// `null` or a missing map declares the resource with defaults only.
pub fn resource(raw: &Value, origin: &str) -> ExtractResult<AttributeMap> {
    let map = match raw {
        Value::Null => return Ok(AttributeMap::new()),
        Value::Object(map) => map,
        other => {
            return Err(ExtractError::malformed(
                origin,
                format!("a resource declaration must be a map, got {}", kind_of(other)),
            ))
        }
    };

    let mut attributes = canonicalize(map);
    if let Some(key) = first_unknown_resource_key(&attributes) {
        return Err(ExtractError::unknown_property(key, "resource", origin));
    }

    for key in OPERATION_KEYS {
        if let Some(value) = attributes.get_mut(*key) {
            *value = operations(key, value, origin)?;
        }
    }

    Ok(attributes)
}

/// Canonicalises and validates a property declaration.
pub fn property(raw: &Value, origin: &str) -> ExtractResult<AttributeMap> {
    let map = match raw {
        Value::Null => return Ok(AttributeMap::new()),
        Value::Object(map) => map,
        other => {
            return Err(ExtractError::malformed(
                origin,
                format!("a property declaration must be a map, got {}", kind_of(other)),
            ))
        }
    };

    let attributes = canonicalize(map);
    if let Some(key) = first_unknown_property_key(&attributes) {
        return Err(ExtractError::unknown_property(key, "property", origin));
    }
    Ok(attributes)
}

// `operations` accepts a list or a map; the legacy keys only a map. Entries
// are maps (or null); their keys are canonicalised but never rejected.
fn operations(key: &str, value: &Value, origin: &str) -> ExtractResult<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Array(items) if key == "operations" => items
            .iter()
            .map(|item| operation(key, item, origin))
            .collect::<ExtractResult<Vec<_>>>()
            .map(Value::Array),
        Value::Object(entries) => entries
            .iter()
            .map(|(name, item)| Ok((name.clone(), operation(key, item, origin)?)))
            .collect::<ExtractResult<Map<_, _>>>()
            .map(Value::Object),
        other => Err(ExtractError::invalid_value(
            key,
            origin,
            format!("expected a list or map of operations, got {}", kind_of(other)),
        )),
    }
}

fn operation(key: &str, value: &Value, origin: &str) -> ExtractResult<Value> {
    match value {
        Value::Null => Ok(Value::Object(Map::new())),
        Value::Object(map) => Ok(Value::Object(
            map.iter()
                .map(|(k, v)| (operation_key(k), v.clone()))
                .collect(),
        )),
        // `operations: [Get, GetCollection]`
        Value::String(kind) if key == "operations" => {
            let mut map = Map::new();
            map.insert("kind".to_string(), Value::String(kind.clone()));
            Ok(Value::Object(map))
        }
        other => Err(ExtractError::invalid_value(
            key,
            origin,
            format!("an operation declaration must be a map, got {}", kind_of(other)),
        )),
    }
}

// Recognised keys are canonicalised; anything else is kept as declared.
fn operation_key(key: &str) -> String {
    let canonical = canonical_key(key);
    if is_operation_key(&canonical) {
        canonical
    } else {
        key.to_string()
    }
}

/// Returns a human name for the JSON value kind.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_keys_are_canonicalised() {
        let attributes = resource(
            &json!({
                "shortName": "Book",
                "itemOperations": {"get": null, "publish": {"method": "PUT", "uriTemplate": "/publish"}},
            }),
            "test",
        )
        .unwrap();

        assert_eq!(attributes["short_name"], json!("Book"));
        assert_eq!(attributes["item_operations"]["get"], json!({}));
        assert_eq!(
            attributes["item_operations"]["publish"],
            json!({"method": "PUT", "uri_template": "/publish"})
        );
    }

    #[test]
    fn test_unknown_resource_key() {
        let err = resource(&json!({"colour": "blue"}), "books.yaml").unwrap_err();
        assert_eq!(err, ExtractError::unknown_property("colour", "resource", "books.yaml"));
    }

    #[test]
    fn test_unknown_operation_keys_are_kept() {
        let attributes = resource(
            &json!({"operations": [{"kind": "Get", "myFlag": true, "paginationItemsPerPage": 5}]}),
            "t",
        )
        .unwrap();
        let operation = &attributes["operations"][0];
        assert_eq!(operation["myFlag"], json!(true));
        assert!(operation.get("my_flag").is_none());
        assert_eq!(operation["pagination_items_per_page"], json!(5));
    }

    #[test]
    fn test_operation_shorthand() {
        let attributes = resource(&json!({"operations": ["Get", "GetCollection"]}), "t").unwrap();
        assert_eq!(attributes["operations"][1], json!({"kind": "GetCollection"}));
    }

    #[test]
    fn test_legacy_operations_must_be_a_map() {
        let err = resource(&json!({"item_operations": ["get"]}), "t").unwrap_err();
        assert!(matches!(err, ExtractError::InvalidValue { .. }));
    }

    #[test]
    fn test_property_validation() {
        assert!(property(&json!({"readableLink": false}), "t").is_ok());
        assert!(matches!(
            property(&json!({"shortName": "x"}), "t").unwrap_err(),
            ExtractError::UnknownProperty { scope: "property", .. }
        ));
    }
}
