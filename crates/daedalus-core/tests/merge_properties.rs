//! Property tests for the attribute merge resolver with nested maps.

use daedalus_core::attributes::{merge, remap_deprecated, AttributeMap};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (0i64..1000).prop_map(Value::from),
        "[a-z]{1,5}".prop_map(Value::String),
        proptest::collection::vec("[a-z]{1,3}", 0..3).prop_map(|v| json!(v)),
    ]
}

fn nested() -> impl Strategy<Value = Value> {
    proptest::collection::vec(("[x-z]", scalar()), 0..4)
        .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>()))
}

fn layer() -> impl Strategy<Value = AttributeMap> {
    proptest::collection::vec(("[a-d]", prop_oneof![scalar(), nested()]), 0..6)
        .prop_map(|entries| entries.into_iter().collect())
}

proptest! {
    #[test]
    fn merged_values_come_from_a_layer(base in layer(), overrides in layer()) {
        let merged = merge(&base, &overrides);
        for (key, value) in &merged {
            match (base.get(key), overrides.get(key)) {
                (Some(Value::Object(b)), Some(Value::Object(o))) => {
                    let merged_map = value.as_object().unwrap();
                    for (nested_key, nested_value) in merged_map {
                        prop_assert!(
                            o.get(nested_key) == Some(nested_value) || b.get(nested_key) == Some(nested_value)
                        );
                    }
                    for (nested_key, nested_value) in o {
                        if nested_value.is_null() {
                            prop_assert!(!merged_map.contains_key(nested_key));
                        }
                    }
                }
                (_, Some(Value::Object(_))) => prop_assert!(value.is_object()),
                (_, Some(o)) => prop_assert_eq!(value, o),
                (Some(b), None) => prop_assert_eq!(value, b),
                (None, None) => prop_assert!(false, "key {} from nowhere", key),
            }
        }
    }

    #[test]
    fn merge_with_empty_override_is_identity(base in layer()) {
        prop_assert_eq!(merge(&base, &AttributeMap::new()), base);
    }

    #[test]
    fn merge_is_deterministic(base in layer(), overrides in layer()) {
        prop_assert_eq!(merge(&base, &overrides), merge(&base, &overrides));
    }
}

#[test]
fn operation_override_replaces_groups_wholesale() {
    let resource: AttributeMap = [("normalization_context".to_string(), json!({"groups": ["a"]}))]
        .into_iter()
        .collect();
    let operation: AttributeMap = [("normalization_context".to_string(), json!({"groups": ["b"]}))]
        .into_iter()
        .collect();

    let merged = merge(&resource, &operation);
    assert_eq!(merged["normalization_context"]["groups"], json!(["b"]));
}

#[test]
fn deprecated_keys_are_gone_after_remap() {
    let mut attributes: AttributeMap = [
        ("access_control".to_string(), json!("is_granted('ROLE_USER')")),
        ("access_control_message".to_string(), json!("Nope")),
        ("swagger_context".to_string(), json!({"tags": ["Book"]})),
    ]
    .into_iter()
    .collect();

    remap_deprecated(&mut attributes);

    assert_eq!(
        attributes.keys().collect::<Vec<_>>(),
        vec!["security", "security_message", "openapi_context"]
    );
}
