//! Extraction of source-level attributes from a class registry.

use std::sync::Arc;

use daedalus_core::class::AccessorKind;
use daedalus_core::{AttributeMap, ClassRegistry, DeclarationSite, ResourceDeclaration};
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::ExtractResult;
use crate::normalize;
use crate::ResourceExtractor;

/// Reads resource and property attributes attached to class descriptors.
///
/// Resource attributes are not inherited: only the class's own declarations
/// count. Property attributes are collected from the class and its ancestors,
/// then from getters for properties without a declared attribute.
#[derive(Debug, Clone)]
pub struct AttributeExtractor {
    registry: Arc<ClassRegistry>,
}

impl AttributeExtractor {
    /// Creates an extractor over `registry`.
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        Self { registry }
    }

    fn origin(class: &str) -> String {
        format!("attributes({class})")
    }
}

impl ResourceExtractor for AttributeExtractor {
    fn name(&self) -> &str {
        "attributes"
    }

    fn resource_classes(&self) -> ExtractResult<Vec<String>> {
        Ok(self
            .registry
            .classes()
            .filter(|class| class.is_resource())
            .map(|class| class.name().to_string())
            .collect())
    }

    fn resources(&self, class: &str) -> ExtractResult<Vec<ResourceDeclaration>> {
        let Some(descriptor) = self.registry.get(class) else {
            return Ok(Vec::new());
        };
        let origin = Self::origin(class);

        descriptor
            .resources()
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                let raw = Value::Object(raw.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
                let attributes = normalize::resource(&raw, &origin)?;
                Ok(ResourceDeclaration::new(
                    class,
                    DeclarationSite::new(origin.clone(), index),
                    attributes,
                ))
            })
            .collect()
    }

    fn properties(&self, class: &str) -> ExtractResult<IndexMap<String, AttributeMap>> {
        let origin = Self::origin(class);
        let mut declared = IndexMap::new();

        for property in self.registry.all_properties(class) {
            if let Some(raw) = property.attributes() {
                declared.insert(property.name().to_string(), to_property(raw, &origin)?);
            }
        }

        for method in self.registry.all_methods(class) {
            let (Some(raw), Some((name, kind))) = (method.attributes(), method.accessor()) else {
                continue;
            };
            if kind == AccessorKind::Getter && !declared.contains_key(&name) {
                declared.insert(name, to_property(raw, &origin)?);
            }
        }

        Ok(declared)
    }
}

fn to_property(raw: &AttributeMap, origin: &str) -> ExtractResult<AttributeMap> {
    let raw = Value::Object(raw.iter().map(|(k, v)| (k.clone(), v.clone())).collect());
    normalize::property(&raw, origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use daedalus_core::class::{ClassDescriptor, MethodDescriptor};
    use daedalus_core::fixtures::{self, attributes, AUTHOR, BOOK, REVIEW};
    use daedalus_core::types::{BuiltinType, Type};
    use serde_json::json;

    fn extractor() -> AttributeExtractor {
        AttributeExtractor::new(Arc::new(fixtures::bookstore_registry()))
    }

    #[test]
    fn test_resource_classes_in_registration_order() {
        let classes = extractor().resource_classes().unwrap();
        assert_eq!(classes, vec![BOOK, AUTHOR, REVIEW, fixtures::DUMMY]);
    }

    #[test]
    fn test_resources_are_canonicalised() {
        let declarations = extractor().resources(AUTHOR).unwrap();
        assert_eq!(declarations.len(), 1);
        let attributes = declarations[0].attributes();
        assert!(attributes.contains_key("access_control_message"));
        assert_eq!(declarations[0].site().to_string(), format!("attributes({AUTHOR})#0"));
    }

    #[test]
    fn test_unknown_class_has_no_declarations() {
        assert!(extractor().resources("App\\Entity\\Missing").unwrap().is_empty());
        assert!(extractor().properties("App\\Entity\\Missing").unwrap().is_empty());
    }

    #[test]
    fn test_property_attributes() {
        let properties = extractor().properties(BOOK).unwrap();
        assert_eq!(properties.len(), 1);
        assert_eq!(properties["isbn"]["iri"], json!("https://schema.org/isbn"));
    }

    #[test]
    fn test_getter_attributes() {
        let mut registry = ClassRegistry::new();
        registry.register(
            ClassDescriptor::builder("Thing")
                .method(
                    MethodDescriptor::getter("getLabel", Type::new(BuiltinType::String))
                        .with_attributes(attributes(json!({"readableLink": false}))),
                )
                .build(),
        );
        let properties = AttributeExtractor::new(Arc::new(registry)).properties("Thing").unwrap();
        assert_eq!(properties["label"]["readable_link"], json!(false));
    }

    #[test]
    fn test_unknown_resource_key_is_rejected() {
        let mut registry = ClassRegistry::new();
        registry.register(
            ClassDescriptor::builder("Thing")
                .resource(attributes(json!({"colour": "blue"})))
                .build(),
        );
        let err = AttributeExtractor::new(Arc::new(registry))
            .resources("Thing")
            .unwrap_err();
        assert!(err.to_string().starts_with("Unknown property colour on resource declaration"));
    }
}
