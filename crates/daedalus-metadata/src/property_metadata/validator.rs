//! Validation layer: required flags, IRIs and schema restrictions.

use std::fmt;
use std::sync::Arc;

use daedalus_core::{ClassRegistry, Constraint, MetadataResult, PropertyMetadata, PropertyOptions};
use serde_json::Value;

use super::restriction::{default_resolvers, resolve_all, SchemaFragment, SharedRestrictionResolver};
use crate::factory::{PropertyMetadataFactory, SharedPropertyMetadataFactory};

/// Reads the validation constraints declared on a property.
pub trait ConstraintIntrospector: Send + Sync + fmt::Debug {
    /// Returns the constraints of `property` on `class`, in declaration order.
    ///
    /// An unknown class or property has no constraints.
    fn constraints(&self, class: &str, property: &str) -> MetadataResult<Vec<Constraint>>;
}

/// Reads constraints from property descriptors, including inherited ones.
#[derive(Debug, Clone)]
pub struct RegistryConstraintIntrospector {
    registry: Arc<ClassRegistry>,
}

impl RegistryConstraintIntrospector {
    /// Creates an introspector reading `registry`.
    pub fn new(registry: Arc<ClassRegistry>) -> Self {
        Self { registry }
    }
}

impl ConstraintIntrospector for RegistryConstraintIntrospector {
    fn constraints(&self, class: &str, property: &str) -> MetadataResult<Vec<Constraint>> {
        Ok(self
            .registry
            .find_property(class, property)
            .map(|p| p.constraints().to_vec())
            .unwrap_or_default())
    }
}

const SCHEMA_IRIS: &[(&str, &str)] = &[
    ("Email", "https://schema.org/email"),
    ("Url", "https://schema.org/url"),
    ("Uuid", "https://schema.org/identifier"),
    ("Iban", "https://schema.org/identifier"),
    ("Bic", "https://schema.org/identifier"),
    ("Isbn", "https://schema.org/isbn"),
    ("Issn", "https://schema.org/issn"),
    ("Date", "https://schema.org/Date"),
    ("DateTime", "https://schema.org/DateTime"),
    ("Time", "https://schema.org/Time"),
    ("Image", "https://schema.org/image"),
    ("File", "https://schema.org/MediaObject"),
    ("Currency", "https://schema.org/priceCurrency"),
];

fn is_required_constraint(constraint: &Constraint) -> bool {
    match constraint.name() {
        "NotNull" => true,
        "NotBlank" => !["allow_null", "allowNull"]
            .iter()
            .any(|key| constraint.option(key).and_then(Value::as_bool) == Some(true)),
        _ => false,
    }
}

fn schema_iri(constraint: &Constraint) -> Option<&'static str> {
    SCHEMA_IRIS
        .iter()
        .find(|(name, _)| *name == constraint.name())
        .map(|(_, iri)| *iri)
}

/// Derives metadata from the validation constraints active for the
/// requested validation groups.
///
/// - `required` is set from `NotBlank`/`NotNull` unless a lower layer decided it
/// - `iri` is set from well-known constraints (`Email` → `https://schema.org/email`) unless already set
/// - schema restrictions come from the restriction resolvers and are merged over the inner schema
#[derive(Debug, Clone)]
pub struct ValidatorPropertyMetadataFactory {
    introspector: Arc<dyn ConstraintIntrospector>,
    resolvers: Vec<SharedRestrictionResolver>,
    inner: SharedPropertyMetadataFactory,
}

impl ValidatorPropertyMetadataFactory {
    /// Creates a factory using the built-in restriction resolvers.
    pub fn new(introspector: Arc<dyn ConstraintIntrospector>, inner: SharedPropertyMetadataFactory) -> Self {
        Self::with_resolvers(introspector, default_resolvers(), inner)
    }

    /// Creates a factory using `resolvers`.
    pub fn with_resolvers(
        introspector: Arc<dyn ConstraintIntrospector>,
        resolvers: Vec<SharedRestrictionResolver>,
        inner: SharedPropertyMetadataFactory,
    ) -> Self {
        Self {
            introspector,
            resolvers,
            inner,
        }
    }
}

impl PropertyMetadataFactory for ValidatorPropertyMetadataFactory {
    fn name(&self) -> &'static str {
        "validator"
    }

    fn create(&self, class: &str, property: &str, options: &PropertyOptions) -> MetadataResult<PropertyMetadata> {
        let metadata = self.inner.create(class, property, options)?;
        let groups = options.validation_groups.as_deref();
        let constraints: Vec<Constraint> = self
            .introspector
            .constraints(class, property)?
            .into_iter()
            .filter(|c| c.applies_to(groups))
            .collect();

        let mut layer = PropertyMetadata::new();
        if metadata.required().is_none() {
            layer = layer.with_required(constraints.iter().any(is_required_constraint));
        }
        if metadata.iri().is_none() {
            if let Some(iri) = constraints.iter().find_map(schema_iri) {
                layer = layer.with_iri(iri);
            }
        }

        let mut schema = SchemaFragment::new();
        for constraint in &constraints {
            schema.extend(resolve_all(&self.resolvers, constraint, &metadata));
        }
        if !schema.is_empty() {
            layer = layer.with_schema(schema);
        }

        Ok(layer.merge_over(&metadata))
    }
}
