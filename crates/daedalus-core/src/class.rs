//! Class descriptors and the class registry.
//!
//! Resource classes are described explicitly: a [`ClassDescriptor`] lists the
//! properties, accessor methods, source-level resource attributes and
//! validation constraints of a class, and a [`ClassRegistry`] holds every
//! known descriptor by fully qualified name. Factories that would otherwise
//! reflect on live classes read this registry instead.
//!
//! # Example
//!
//! ```
//! use daedalus_core::class::{ClassDescriptor, ClassRegistry, MethodDescriptor, PropertyDescriptor};
//! use daedalus_core::types::{BuiltinType, Type};
//!
//! let mut registry = ClassRegistry::new();
//! registry.register(
//!     ClassDescriptor::builder("App\\Entity\\Tag")
//!         .property(PropertyDescriptor::new("label").with_type(Type::new(BuiltinType::String)))
//!         .method(MethodDescriptor::getter("getLabel", Type::new(BuiltinType::String)))
//!         .build(),
//! );
//!
//! let tag = registry.get("App\\Entity\\Tag").unwrap();
//! assert_eq!(tag.short_name(), "Tag");
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::attributes::AttributeMap;
use crate::types::Type;

/// Validation group applied to constraints declaring no groups.
pub const DEFAULT_GROUP: &str = "Default";

/// Member visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible to everyone.
    #[default]
    Public,
    /// Visible to subclasses.
    Protected,
    /// Visible to the declaring class only.
    Private,
}

/// A validation constraint declared on a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    name: String,
    #[serde(default)]
    options: Map<String, Value>,
    #[serde(default)]
    groups: Vec<String>,
}

impl Constraint {
    /// Creates a constraint without options in the default group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Map::new(),
            groups: Vec::new(),
        }
    }

    /// Adds an option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Sets the validation groups.
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the constraint name (short class name, e.g. `NotBlank`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the constraint options.
    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    /// Returns a single option.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Returns the declared groups.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Returns true when this constraint is active for the requested groups.
    ///
    /// Without requested groups only the default group is considered.
    pub fn applies_to(&self, requested: Option<&[String]>) -> bool {
        let declared: Vec<&str> = if self.groups.is_empty() {
            vec![DEFAULT_GROUP]
        } else {
            self.groups.iter().map(String::as_str).collect()
        };

        match requested {
            None => declared.contains(&DEFAULT_GROUP),
            Some(requested) => requested.iter().any(|g| declared.contains(&g.as_str())),
        }
    }
}

/// A declared property of a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    name: String,
    #[serde(default)]
    visibility: Visibility,
    #[serde(default)]
    types: Vec<Type>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attributes: Option<AttributeMap>,
    #[serde(default)]
    constraints: Vec<Constraint>,
}

impl PropertyDescriptor {
    /// Creates a public untyped property.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            types: Vec::new(),
            default: None,
            attributes: None,
            constraints: Vec::new(),
        }
    }

    /// Sets the visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Adds a type.
    pub fn with_type(mut self, ty: Type) -> Self {
        self.types.push(ty);
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Attaches a source-level property attribute.
    pub fn with_attributes(mut self, attributes: AttributeMap) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Adds a validation constraint.
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Returns the property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the visibility.
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Returns the declared types.
    pub fn types(&self) -> &[Type] {
        &self.types
    }

    /// Returns the default value.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns the source-level property attribute, if any.
    pub fn attributes(&self) -> Option<&AttributeMap> {
        self.attributes.as_ref()
    }

    /// Returns the validation constraints.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Returns true for public properties.
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

/// The role of an accessor method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    /// `getFoo()`, `isFoo()`, `hasFoo()`, `canFoo()`.
    Getter,
    /// `setFoo($value)`.
    Setter,
}

const GETTER_PREFIXES: &[&str] = &["get", "is", "has", "can"];
const SETTER_PREFIX: &str = "set";

/// A declared method of a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    name: String,
    #[serde(default)]
    visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    return_type: Option<Type>,
    #[serde(default)]
    parameters: Vec<Type>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attributes: Option<AttributeMap>,
}

impl MethodDescriptor {
    /// Creates a public method without parameters or return type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            return_type: None,
            parameters: Vec::new(),
            attributes: None,
        }
    }

    /// Creates a public getter returning `return_type`.
    pub fn getter(name: impl Into<String>, return_type: Type) -> Self {
        Self::new(name).with_return_type(return_type)
    }

    /// Creates a public setter taking one parameter.
    pub fn setter(name: impl Into<String>, parameter: Type) -> Self {
        Self::new(name).with_parameter(parameter)
    }

    /// Sets the visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Sets the return type.
    pub fn with_return_type(mut self, ty: Type) -> Self {
        self.return_type = Some(ty);
        self
    }

    /// Adds a parameter.
    pub fn with_parameter(mut self, ty: Type) -> Self {
        self.parameters.push(ty);
        self
    }

    /// Attaches a source-level property attribute to the accessor.
    pub fn with_attributes(mut self, attributes: AttributeMap) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Returns the method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the visibility.
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Returns the return type.
    pub fn return_type(&self) -> Option<&Type> {
        self.return_type.as_ref()
    }

    /// Returns the parameter types.
    pub fn parameters(&self) -> &[Type] {
        &self.parameters
    }

    /// Returns the source-level property attribute, if any.
    pub fn attributes(&self) -> Option<&AttributeMap> {
        self.attributes.as_ref()
    }

    /// Returns the property this method is an accessor for.
    ///
    /// ```
    /// use daedalus_core::class::{AccessorKind, MethodDescriptor};
    /// use daedalus_core::types::{BuiltinType, Type};
    ///
    /// let method = MethodDescriptor::getter("isActive", Type::new(BuiltinType::Bool));
    /// assert_eq!(method.accessor(), Some(("active".to_string(), AccessorKind::Getter)));
    /// assert_eq!(MethodDescriptor::new("getaway").accessor(), None);
    /// ```
    pub fn accessor(&self) -> Option<(String, AccessorKind)> {
        if self.visibility != Visibility::Public {
            return None;
        }

        if self.parameters.is_empty() {
            for prefix in GETTER_PREFIXES {
                if let Some(property) = accessor_suffix(&self.name, prefix) {
                    return Some((property, AccessorKind::Getter));
                }
            }
        }

        if self.parameters.len() == 1 {
            if let Some(property) = accessor_suffix(&self.name, SETTER_PREFIX) {
                return Some((property, AccessorKind::Setter));
            }
        }

        None
    }
}

fn accessor_suffix(name: &str, prefix: &str) -> Option<String> {
    let rest = name.strip_prefix(prefix)?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    if !first.is_uppercase() {
        return None;
    }
    Some(first.to_lowercase().chain(chars).collect())
}

/// Returns the last segment of a `\`- or `::`-separated class name.
pub fn short_name(class: &str) -> &str {
    class.rsplit(['\\', ':']).next().unwrap_or(class)
}

/// Everything known about one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    #[serde(default)]
    is_abstract: bool,
    #[serde(default)]
    properties: Vec<PropertyDescriptor>,
    #[serde(default)]
    methods: Vec<MethodDescriptor>,
    #[serde(default)]
    resources: Vec<AttributeMap>,
}

impl ClassDescriptor {
    /// Creates a new class descriptor builder.
    pub fn builder(name: impl Into<String>) -> ClassDescriptorBuilder {
        ClassDescriptorBuilder {
            descriptor: Self {
                name: name.into(),
                parent: None,
                is_abstract: false,
                properties: Vec::new(),
                methods: Vec::new(),
                resources: Vec::new(),
            },
        }
    }

    /// Returns the fully qualified class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the short class name.
    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }

    /// Returns the parent class name.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Returns true for abstract classes.
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Returns the properties declared on this class (not inherited ones).
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Returns a declared property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Returns the methods declared on this class.
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// Returns the source-level resource attributes, in declaration order.
    pub fn resources(&self) -> &[AttributeMap] {
        &self.resources
    }

    /// Returns true when at least one resource attribute is declared.
    pub fn is_resource(&self) -> bool {
        !self.resources.is_empty()
    }
}

/// Builder for [`ClassDescriptor`].
#[derive(Debug, Clone)]
pub struct ClassDescriptorBuilder {
    descriptor: ClassDescriptor,
}

impl ClassDescriptorBuilder {
    /// Sets the parent class.
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.descriptor.parent = Some(parent.into());
        self
    }

    /// Marks the class abstract.
    pub fn abstract_class(mut self) -> Self {
        self.descriptor.is_abstract = true;
        self
    }

    /// Adds a property.
    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.descriptor.properties.push(property);
        self
    }

    /// Adds a method.
    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.descriptor.methods.push(method);
        self
    }

    /// Adds a resource attribute.
    pub fn resource(mut self, attributes: AttributeMap) -> Self {
        self.descriptor.resources.push(attributes);
        self
    }

    /// Builds the descriptor.
    pub fn build(self) -> ClassDescriptor {
        self.descriptor
    }
}

/// Registry of class descriptors, in registration order.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: IndexMap<String, Arc<ClassDescriptor>>,
}

impl ClassRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class, replacing any previous descriptor with the same name.
    pub fn register(&mut self, class: ClassDescriptor) -> &mut Self {
        self.classes.insert(class.name.clone(), Arc::new(class));
        self
    }

    /// Returns a class descriptor.
    pub fn get(&self, name: &str) -> Option<&Arc<ClassDescriptor>> {
        self.classes.get(name)
    }

    /// Returns true when the class is known.
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Iterates over all classes in registration order.
    pub fn classes(&self) -> impl Iterator<Item = &Arc<ClassDescriptor>> {
        self.classes.values()
    }

    /// Returns the number of registered classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns true when no class is registered.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Returns the class followed by its known ancestors, nearest first.
    ///
    /// Unknown parents end the chain; inheritance cycles are cut.
    pub fn ancestors(&self, name: &str) -> Vec<&Arc<ClassDescriptor>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.classes.get(name);

        while let Some(class) = current {
            if !seen.insert(class.name.as_str()) {
                break;
            }
            chain.push(class);
            current = class.parent.as_deref().and_then(|p| self.classes.get(p));
        }

        chain
    }

    /// Returns own then inherited properties, the nearest declaration winning.
    pub fn all_properties(&self, name: &str) -> Vec<&PropertyDescriptor> {
        let mut seen = HashSet::new();
        self.ancestors(name)
            .into_iter()
            .flat_map(|class| class.properties.iter())
            .filter(|p| seen.insert(p.name.as_str()))
            .collect()
    }

    /// Returns own then inherited methods, the nearest declaration winning.
    pub fn all_methods(&self, name: &str) -> Vec<&MethodDescriptor> {
        let mut seen = HashSet::new();
        self.ancestors(name)
            .into_iter()
            .flat_map(|class| class.methods.iter())
            .filter(|m| seen.insert(m.name.as_str()))
            .collect()
    }

    /// Returns a property by name, searching ancestors.
    pub fn find_property(&self, class: &str, property: &str) -> Option<&PropertyDescriptor> {
        self.ancestors(class)
            .into_iter()
            .find_map(|c| c.property(property))
    }

    /// Returns the accessor methods backing `property`, searching ancestors.
    pub fn accessors(&self, class: &str, property: &str) -> Vec<(&MethodDescriptor, AccessorKind)> {
        self.all_methods(class)
            .into_iter()
            .filter_map(|method| match method.accessor() {
                Some((name, kind)) if name == property => Some((method, kind)),
                _ => None,
            })
            .collect()
    }
}

impl FromIterator<ClassDescriptor> for ClassRegistry {
    fn from_iter<I: IntoIterator<Item = ClassDescriptor>>(iter: I) -> Self {
        let mut registry = Self::new();
        for class in iter {
            registry.register(class);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BuiltinType;

    fn string() -> Type {
        Type::new(BuiltinType::String)
    }

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("App\\Entity\\Book"), "Book");
        assert_eq!(short_name("bookstore::Book"), "Book");
        assert_eq!(short_name("Book"), "Book");
    }

    #[test]
    fn test_accessor_detection() {
        assert_eq!(
            MethodDescriptor::getter("getName", string()).accessor(),
            Some(("name".to_string(), AccessorKind::Getter))
        );
        assert_eq!(
            MethodDescriptor::setter("setAlias", string()).accessor(),
            Some(("alias".to_string(), AccessorKind::Setter))
        );
        assert_eq!(
            MethodDescriptor::getter("hasCover", Type::new(BuiltinType::Bool)).accessor(),
            Some(("cover".to_string(), AccessorKind::Getter))
        );
        // getters take no parameters, setters exactly one
        assert_eq!(MethodDescriptor::new("setAlias").accessor(), None);
        assert_eq!(
            MethodDescriptor::getter("getName", string())
                .with_parameter(string())
                .accessor(),
            None
        );
        assert_eq!(
            MethodDescriptor::getter("getName", string())
                .with_visibility(Visibility::Private)
                .accessor(),
            None
        );
        assert_eq!(MethodDescriptor::new("isbn").accessor(), None);
    }

    #[test]
    fn test_constraint_groups() {
        let default = Constraint::new("NotBlank");
        assert!(default.applies_to(None));
        assert!(default.applies_to(Some(&["Default".to_string()])));
        assert!(!default.applies_to(Some(&["create".to_string()])));

        let grouped = Constraint::new("NotNull").with_groups(["create"]);
        assert!(!grouped.applies_to(None));
        assert!(grouped.applies_to(Some(&["create".to_string(), "update".to_string()])));
    }

    #[test]
    fn test_ancestors_and_inherited_properties() {
        let registry: ClassRegistry = [
            ClassDescriptor::builder("Base")
                .property(PropertyDescriptor::new("id"))
                .property(PropertyDescriptor::new("name").with_type(string()))
                .build(),
            ClassDescriptor::builder("Child")
                .parent("Base")
                .property(PropertyDescriptor::new("name"))
                .property(PropertyDescriptor::new("extra"))
                .build(),
        ]
        .into_iter()
        .collect();

        let names: Vec<_> = registry
            .all_properties("Child")
            .into_iter()
            .map(PropertyDescriptor::name)
            .collect();
        assert_eq!(names, vec!["name", "extra", "id"]);

        // nearest declaration wins
        assert!(registry.find_property("Child", "name").unwrap().types().is_empty());
        assert_eq!(registry.ancestors("Child").len(), 2);
        assert!(registry.ancestors("Missing").is_empty());
    }

    #[test]
    fn test_ancestors_cycle_is_cut() {
        let registry: ClassRegistry = [
            ClassDescriptor::builder("A").parent("B").build(),
            ClassDescriptor::builder("B").parent("A").build(),
        ]
        .into_iter()
        .collect();
        assert_eq!(registry.ancestors("A").len(), 2);
    }
}
