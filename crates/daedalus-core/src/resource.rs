//! Resources and the per-class resource metadata collection.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::attributes::AttributeMap;
use crate::error::{MetadataError, MetadataResult};
use crate::operation::Operation;

/// One resource declared on a class, with its resolved operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResource {
    class: String,
    short_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uri_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    types: Option<Vec<String>>,
    #[serde(default)]
    attributes: AttributeMap,
    #[serde(default)]
    operations: IndexMap<String, Operation>,
}

impl ApiResource {
    /// Creates a resource without operations.
    ///
    /// `attributes` are the merged resource-level attributes (defaults
    /// included) that operations inherited.
    pub fn new(class: impl Into<String>, short_name: impl Into<String>, attributes: AttributeMap) -> Self {
        let description = attributes
            .get("description")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let uri_template = attributes
            .get("uri_template")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let types = attributes.get("types").and_then(|v| {
            v.as_array()
                .map(|types| types.iter().filter_map(|t| t.as_str().map(str::to_string)).collect())
        });

        Self {
            class: class.into(),
            short_name: short_name.into(),
            description,
            uri_template,
            types,
            attributes,
            operations: IndexMap::new(),
        }
    }

    /// Returns a copy with the operations replaced.
    pub fn with_operations(&self, operations: IndexMap<String, Operation>) -> Self {
        Self {
            operations,
            ..self.clone()
        }
    }

    /// Returns the resource class.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Returns the short name.
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Returns the description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the resource-level URI template.
    pub fn uri_template(&self) -> Option<&str> {
        self.uri_template.as_deref()
    }

    /// Returns the RDF types.
    pub fn types(&self) -> Option<&[String]> {
        self.types.as_deref()
    }

    /// Returns the merged resource-level attributes.
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Returns the operations keyed by name.
    pub fn operations(&self) -> &IndexMap<String, Operation> {
        &self.operations
    }

    /// Returns an operation by name.
    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.get(name)
    }
}

/// Every resource declared on one class, in declaration order.
///
/// # Example
///
/// ```
/// use daedalus_core::resource::ResourceMetadataCollection;
///
/// let collection = ResourceMetadataCollection::new("App\\Entity\\Book", Vec::new());
/// assert!(collection.is_empty());
/// assert!(collection.get_operation("_api_/books_get").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetadataCollection {
    class: String,
    resources: Vec<ApiResource>,
}

impl ResourceMetadataCollection {
    /// Creates a collection.
    pub fn new(class: impl Into<String>, resources: Vec<ApiResource>) -> Self {
        Self {
            class: class.into(),
            resources,
        }
    }

    /// Returns the class.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Returns the resources.
    pub fn resources(&self) -> &[ApiResource] {
        &self.resources
    }

    /// Returns a copy with the resources replaced.
    pub fn with_resources(&self, resources: Vec<ApiResource>) -> Self {
        Self {
            class: self.class.clone(),
            resources,
        }
    }

    /// Iterates over the resources.
    pub fn iter(&self) -> std::slice::Iter<'_, ApiResource> {
        self.resources.iter()
    }

    /// Returns the number of resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns true when the class declares no resource.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Iterates over every operation of every resource.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.resources.iter().flat_map(|r| r.operations.values())
    }

    /// Looks up an operation by name across all resources.
    pub fn get_operation(&self, name: &str) -> MetadataResult<&Operation> {
        self.resources
            .iter()
            .find_map(|resource| resource.operation(name))
            .ok_or_else(|| MetadataError::operation_not_found(&self.class, name))
    }

    /// Returns the default GET operation of the requested scope: the one with
    /// the lowest priority.
    pub fn default_operation(&self, collection: bool) -> Option<&Operation> {
        self.operations()
            .filter(|op| *op.method() == http::Method::GET && op.is_collection() == collection)
            .min_by_key(|op| op.priority())
    }
}

impl<'a> IntoIterator for &'a ResourceMetadataCollection {
    type Item = &'a ApiResource;
    type IntoIter = std::slice::Iter<'a, ApiResource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.iter()
    }
}

impl IntoIterator for ResourceMetadataCollection {
    type Item = ApiResource;
    type IntoIter = std::vec::IntoIter<ApiResource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn operation(name: &str, method: &str, collection: bool, priority: i64) -> Operation {
        let attributes: AttributeMap = match json!({
            "name": name,
            "method": method,
            "collection": collection,
            "priority": priority,
            "class": "Book",
            "short_name": "Book",
        }) {
            Value::Object(map) => map.into_iter().collect(),
            _ => unreachable!(),
        };
        Operation::from_attributes(&attributes).unwrap()
    }

    fn collection() -> ResourceMetadataCollection {
        let first = ApiResource::new("Book", "Book", AttributeMap::new()).with_operations(
            [
                operation("book_post", "POST", true, 0),
                operation("book_list", "GET", true, 1),
                operation("book_get", "GET", false, 2),
            ]
            .into_iter()
            .map(|op| (op.name().to_string(), op))
            .collect(),
        );
        let second = ApiResource::new("Book", "Book", AttributeMap::new()).with_operations(
            [operation("book_get_by_isbn", "GET", false, 0)]
                .into_iter()
                .map(|op| (op.name().to_string(), op))
                .collect(),
        );
        ResourceMetadataCollection::new("Book", vec![first, second])
    }

    #[test]
    fn test_get_operation_across_resources() {
        let collection = collection();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.get_operation("book_get_by_isbn").unwrap().priority(), 0);
        let err = collection.get_operation("missing").unwrap_err();
        assert!(matches!(err, MetadataError::OperationNotFound { .. }));
    }

    #[test]
    fn test_default_operation_by_priority() {
        let collection = collection();
        assert_eq!(collection.default_operation(false).unwrap().name(), "book_get_by_isbn");
        assert_eq!(collection.default_operation(true).unwrap().name(), "book_list");
    }

    #[test]
    fn test_resource_reads_attributes() {
        let attributes: AttributeMap = [
            ("description".to_string(), json!("A book")),
            ("types".to_string(), json!(["https://schema.org/Book"])),
        ]
        .into_iter()
        .collect();
        let resource = ApiResource::new("Book", "Book", attributes);
        assert_eq!(resource.description(), Some("A book"));
        assert_eq!(resource.types(), Some(&["https://schema.org/Book".to_string()][..]));
        assert_eq!(resource.uri_template(), None);
    }
}
