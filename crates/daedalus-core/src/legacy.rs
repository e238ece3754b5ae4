//! Flat, legacy-shaped resource metadata.
//!
//! [`ResourceMetadata`] is a pure projection of a [`ResourceMetadataCollection`]
//! for consumers that still expect item and collection operation maps and a
//! single flattened attribute map.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attributes::AttributeMap;
use crate::error::{MetadataError, MetadataResult};
use crate::resource::ResourceMetadataCollection;

/// Resource-level keys not repeated in the flattened attributes.
const PROJECTED_KEYS: &[&str] = &[
    "short_name",
    "description",
    "iri",
    "types",
    "operations",
    "item_operations",
    "collection_operations",
];

/// Operation keys that only identify the operation.
const IDENTITY_KEYS: &[&str] = &["class", "short_name", "collection"];

/// Flat resource metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    short_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iri: Option<String>,
    #[serde(default)]
    item_operations: IndexMap<String, AttributeMap>,
    #[serde(default)]
    collection_operations: IndexMap<String, AttributeMap>,
    #[serde(default)]
    attributes: AttributeMap,
}

impl ResourceMetadata {
    /// Projects a collection onto the flat shape.
    ///
    /// Operations are keyed by lowercase method, or by operation name when two
    /// operations of the same scope share a method. Post operations and
    /// collection-scoped operations land in the collection map.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::ResourceClassNotFound`] when the collection is
    /// empty.
    pub fn from_collection(collection: &ResourceMetadataCollection) -> MetadataResult<Self> {
        let first = collection
            .resources()
            .first()
            .ok_or_else(|| MetadataError::resource_class_not_found(collection.class()))?;

        let iri = first
            .attributes()
            .get("iri")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| first.types().and_then(|t| t.first().cloned()));

        let mut item_operations = IndexMap::new();
        let mut collection_operations = IndexMap::new();

        for operation in collection.operations() {
            let mut attributes = operation.to_attributes();
            for key in IDENTITY_KEYS {
                attributes.shift_remove(*key);
            }

            let bucket = if operation.is_collection() || *operation.method() == http::Method::POST {
                &mut collection_operations
            } else {
                &mut item_operations
            };

            let key = operation.method().as_str().to_ascii_lowercase();
            let key = if bucket.contains_key(&key) {
                operation.name().to_string()
            } else {
                key
            };
            bucket.insert(key, attributes);
        }

        let attributes = first
            .attributes()
            .iter()
            .filter(|(key, _)| !PROJECTED_KEYS.contains(&key.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            short_name: first.short_name().to_string(),
            description: first.description().map(str::to_string),
            iri,
            item_operations,
            collection_operations,
            attributes,
        })
    }

    /// Returns the short name.
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Returns the description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the IRI.
    pub fn iri(&self) -> Option<&str> {
        self.iri.as_deref()
    }

    /// Returns the item operations.
    pub fn item_operations(&self) -> &IndexMap<String, AttributeMap> {
        &self.item_operations
    }

    /// Returns the collection operations.
    pub fn collection_operations(&self) -> &IndexMap<String, AttributeMap> {
        &self.collection_operations
    }

    /// Returns the flattened resource attributes.
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Returns a resource attribute.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Returns an attribute of an item operation, optionally falling back to
    /// the resource attributes.
    pub fn item_operation_attribute(&self, operation: &str, key: &str, resource_fallback: bool) -> Option<&Value> {
        Self::operation_attribute(&self.item_operations, &self.attributes, operation, key, resource_fallback)
    }

    /// Returns an attribute of a collection operation, optionally falling back
    /// to the resource attributes.
    pub fn collection_operation_attribute(
        &self,
        operation: &str,
        key: &str,
        resource_fallback: bool,
    ) -> Option<&Value> {
        Self::operation_attribute(
            &self.collection_operations,
            &self.attributes,
            operation,
            key,
            resource_fallback,
        )
    }

    fn operation_attribute<'a>(
        operations: &'a IndexMap<String, AttributeMap>,
        resource: &'a AttributeMap,
        operation: &str,
        key: &str,
        resource_fallback: bool,
    ) -> Option<&'a Value> {
        operations
            .get(operation)
            .and_then(|attributes| attributes.get(key))
            .or_else(|| resource_fallback.then(|| resource.get(key)).flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Operation;
    use crate::resource::ApiResource;
    use serde_json::json;

    fn map(value: Value) -> AttributeMap {
        match value {
            Value::Object(map) => map.into_iter().collect(),
            _ => unreachable!(),
        }
    }

    fn operation(name: &str, method: &str, collection: bool) -> (String, Operation) {
        let operation = Operation::from_attributes(&map(json!({
            "name": name,
            "method": method,
            "collection": collection,
            "class": "App\\Entity\\Book",
            "short_name": "Book",
            "pagination_items_per_page": 30,
        })))
        .unwrap();
        (name.to_string(), operation)
    }

    #[test]
    fn test_empty_collection_is_not_found() {
        let collection = ResourceMetadataCollection::new("App\\Entity\\Book", Vec::new());
        let err = ResourceMetadata::from_collection(&collection).unwrap_err();
        assert!(err.is_resource_class_not_found());
    }

    #[test]
    fn test_projection_buckets_operations() {
        let resource = ApiResource::new(
            "App\\Entity\\Book",
            "Book",
            map(json!({
                "description": "A book",
                "types": ["https://schema.org/Book"],
                "pagination_items_per_page": 30,
            })),
        )
        .with_operations(
            [
                operation("_api_/books/{id}_get", "GET", false),
                operation("_api_/books_get_collection", "GET", true),
                operation("_api_/books_post", "POST", false),
                operation("book_by_isbn", "GET", false),
            ]
            .into_iter()
            .collect(),
        );
        let collection = ResourceMetadataCollection::new("App\\Entity\\Book", vec![resource]);
        let metadata = ResourceMetadata::from_collection(&collection).unwrap();

        assert_eq!(metadata.short_name(), "Book");
        assert_eq!(metadata.iri(), Some("https://schema.org/Book"));
        assert_eq!(
            metadata.item_operations().keys().collect::<Vec<_>>(),
            vec!["get", "book_by_isbn"]
        );
        assert_eq!(
            metadata.collection_operations().keys().collect::<Vec<_>>(),
            vec!["get", "post"]
        );
        assert_eq!(metadata.attribute("pagination_items_per_page"), Some(&json!(30)));
        assert!(metadata.attribute("description").is_none());
        assert_eq!(
            metadata.item_operation_attribute("get", "pagination_items_per_page", false),
            Some(&json!(30))
        );
        assert_eq!(metadata.item_operation_attribute("missing", "pagination_items_per_page", true), Some(&json!(30)));
        assert_eq!(metadata.collection_operation_attribute("missing", "pagination_items_per_page", false), None);
    }
}
