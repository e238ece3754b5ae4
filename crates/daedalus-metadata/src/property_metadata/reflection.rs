//! Base layer: structure and types read from the class registry.

use std::sync::Arc;

use daedalus_core::class::AccessorKind;
use daedalus_core::{ClassRegistry, MetadataError, MetadataResult, PropertyMetadata, PropertyOptions, Type};

use crate::factory::PropertyMetadataFactory;

/// Derives readability, writability, types and default values.
///
/// A public property is readable and writable. Otherwise a getter makes it
/// readable and a setter makes it writable. Types come from the property
/// itself, then from the getter's return type, then from the setter's
/// parameter.
#[derive(Debug, Clone)]
pub struct ReflectionPropertyMetadataFactory {
    registry: Arc<ClassRegistry>,
}

impl ReflectionPropertyMetadataFactory {
    /// Creates a factory reading `registry`.
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        Self { registry }
    }
}

impl PropertyMetadataFactory for ReflectionPropertyMetadataFactory {
    fn name(&self) -> &'static str {
        "reflection"
    }

    fn create(&self, class: &str, property: &str, _options: &PropertyOptions) -> MetadataResult<PropertyMetadata> {
        if !self.registry.contains(class) {
            return Err(MetadataError::resource_class_not_found(class));
        }

        let descriptor = self.registry.find_property(class, property);
        let accessors = self.registry.accessors(class, property);
        if descriptor.is_none() && accessors.is_empty() {
            return Err(MetadataError::property_not_found(class, property));
        }

        let getter = accessors
            .iter()
            .find(|(_, kind)| *kind == AccessorKind::Getter)
            .map(|(method, _)| *method);
        let setter = accessors
            .iter()
            .find(|(_, kind)| *kind == AccessorKind::Setter)
            .map(|(method, _)| *method);
        let public = descriptor.is_some_and(|p| p.is_public());

        let mut metadata = PropertyMetadata::new()
            .with_readable(public || getter.is_some())
            .with_writable(public || setter.is_some());

        let types: Vec<Type> = match descriptor {
            Some(p) if !p.types().is_empty() => p.types().to_vec(),
            _ => getter
                .and_then(|m| m.return_type().cloned())
                .or_else(|| setter.and_then(|m| m.parameters().first().cloned()))
                .into_iter()
                .collect(),
        };
        if !types.is_empty() {
            metadata = metadata.with_builtin_types(types);
        }

        if let Some(default) = descriptor.and_then(|p| p.default_value()) {
            metadata = metadata.with_default(default.clone());
        }

        Ok(metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daedalus_core::fixtures::{self, bookstore_registry};
    use daedalus_core::BuiltinType;
    use serde_json::json;

    fn factory() -> ReflectionPropertyMetadataFactory {
        ReflectionPropertyMetadataFactory::new(Arc::new(bookstore_registry()))
    }

    #[test]
    fn test_setter_only_property_is_write_only() {
        let pen_name = factory().create(fixtures::AUTHOR, "penName", &PropertyOptions::new()).unwrap();
        assert_eq!(pen_name.readable(), Some(false));
        assert_eq!(pen_name.writable(), Some(true));
        assert_eq!(pen_name.builtin_types().unwrap()[0].builtin(), BuiltinType::String);
    }

    #[test]
    fn test_public_property() {
        let metadata = factory().create(fixtures::BOOK, "title", &PropertyOptions::new()).unwrap();
        assert_eq!(metadata.readable(), Some(true));
        assert_eq!(metadata.writable(), Some(true));
        assert_eq!(metadata.builtin_types().unwrap()[0].builtin(), BuiltinType::String);
        assert!(!metadata.is_required());
    }

    #[test]
    fn test_private_property_with_accessors() {
        let author = factory().create(fixtures::BOOK, "author", &PropertyOptions::new()).unwrap();
        assert_eq!(author.readable(), Some(true));
        assert_eq!(author.writable(), Some(true));

        let reviews = factory().create(fixtures::BOOK, "reviews", &PropertyOptions::new()).unwrap();
        assert_eq!(reviews.readable(), Some(true));
        assert_eq!(reviews.writable(), Some(false));
        assert!(reviews.builtin_types().unwrap()[0].is_collection());
    }

    #[test]
    fn test_virtual_property_types_from_getter() {
        let available = factory().create(fixtures::BOOK, "available", &PropertyOptions::new()).unwrap();
        assert_eq!(available.builtin_types().unwrap()[0].builtin(), BuiltinType::Bool);
        assert_eq!(available.writable(), Some(false));
    }

    #[test]
    fn test_inherited_property_and_default() {
        let id = factory().create(fixtures::REVIEW, "id", &PropertyOptions::new()).unwrap();
        assert_eq!(id.builtin_types().unwrap()[0].builtin(), BuiltinType::Int);

        let rating = factory().create(fixtures::REVIEW, "rating", &PropertyOptions::new()).unwrap();
        assert_eq!(rating.default_value(), Some(&json!(5)));
    }

    #[test]
    fn test_not_found() {
        let err = factory().create(fixtures::BOOK, "price", &PropertyOptions::new()).unwrap_err();
        assert!(matches!(err, MetadataError::PropertyNotFound { .. }));

        let err = factory().create("App\\Nope", "id", &PropertyOptions::new()).unwrap_err();
        assert!(err.is_resource_class_not_found());
    }
}
