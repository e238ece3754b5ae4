//! Test fixtures for Daedalus development and testing.
//!
//! This module provides a small bookstore domain, described as a
//! [`ClassRegistry`], that can be used in tests across the Daedalus codebase.
//!
//! # Example
//!
//! ```
//! use daedalus_core::fixtures;
//!
//! let registry = fixtures::bookstore_registry();
//! assert!(registry.get(fixtures::BOOK).unwrap().is_resource());
//! assert!(!registry.get(fixtures::ADDRESS).unwrap().is_resource());
//! ```

use serde_json::{json, Value};

use crate::attributes::AttributeMap;
use crate::class::{ClassDescriptor, ClassRegistry, Constraint, MethodDescriptor, PropertyDescriptor, Visibility};
use crate::types::{BuiltinType, Type};

/// A book: custom operations, validation constraints, an explicit ISBN IRI.
pub const BOOK: &str = "App\\Entity\\Book";
/// An author: declared with the deprecated `access_control` key.
pub const AUTHOR: &str = "App\\Entity\\Author";
/// A review: inherits its identifier from [`ABSTRACT_ENTITY`].
pub const REVIEW: &str = "App\\Entity\\Review";
/// Abstract parent of [`REVIEW`].
pub const ABSTRACT_ENTITY: &str = "App\\Entity\\AbstractEntity";
/// A resource exposing only the getters `getName()` and `getAlias()`.
pub const DUMMY: &str = "App\\Entity\\Dummy";
/// A plain class that is not a resource.
pub const ADDRESS: &str = "App\\Model\\Address";

/// Converts a JSON object into an attribute map; anything else yields an empty map.
pub fn attributes(value: Value) -> AttributeMap {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => AttributeMap::new(),
    }
}

fn string() -> Type {
    Type::new(BuiltinType::String)
}

fn int() -> Type {
    Type::new(BuiltinType::Int)
}

/// Returns the `Book` class.
///
/// Declares `Get`, `GetCollection`, `Post` with write groups, and a named
/// ISBN lookup.
pub fn book() -> ClassDescriptor {
    ClassDescriptor::builder(BOOK)
        .resource(attributes(json!({
            "description": "A book in the catalogue.",
            "normalization_context": {"groups": ["book:read"]},
            "operations": [
                {"kind": "Get"},
                {"kind": "GetCollection"},
                {"kind": "Post", "denormalization_context": {"groups": ["book:write"]}, "status": 201},
                {"kind": "Get", "name": "book_by_isbn", "uri_template": "/books/by-isbn/{isbn}"},
            ],
        })))
        .property(PropertyDescriptor::new("id").with_type(int()))
        .property(
            PropertyDescriptor::new("isbn")
                .with_type(string().nullable())
                .with_attributes(attributes(json!({
                    "iri": "https://schema.org/isbn",
                    "description": "The ISBN of the book",
                })))
                .with_constraint(Constraint::new("Isbn")),
        )
        .property(
            PropertyDescriptor::new("title")
                .with_type(string())
                .with_constraint(Constraint::new("NotBlank"))
                .with_constraint(
                    Constraint::new("Length")
                        .with_option("min", 3)
                        .with_option("max", 255),
                ),
        )
        .property(
            PropertyDescriptor::new("author")
                .with_visibility(Visibility::Private)
                .with_type(Type::object(AUTHOR)),
        )
        .property(
            PropertyDescriptor::new("reviews")
                .with_visibility(Visibility::Private)
                .with_type(Type::collection_of(Type::object(REVIEW))),
        )
        .property(
            PropertyDescriptor::new("internalNotes")
                .with_visibility(Visibility::Private)
                .with_type(string()),
        )
        .method(MethodDescriptor::getter("getAuthor", Type::object(AUTHOR)))
        .method(MethodDescriptor::setter("setAuthor", Type::object(AUTHOR)))
        .method(MethodDescriptor::getter(
            "getReviews",
            Type::collection_of(Type::object(REVIEW)),
        ))
        .method(MethodDescriptor::getter("isAvailable", Type::new(BuiltinType::Bool)))
        .build()
}

/// Returns the `Author` class.
pub fn author() -> ClassDescriptor {
    ClassDescriptor::builder(AUTHOR)
        .resource(attributes(json!({
            "access_control": "is_granted('ROLE_USER')",
            "accessControlMessage": "Only signed in users may browse authors.",
        })))
        .property(PropertyDescriptor::new("id").with_type(int()))
        .property(PropertyDescriptor::new("name").with_type(string()).with_constraint(Constraint::new("NotBlank")))
        .property(
            PropertyDescriptor::new("email")
                .with_type(string())
                .with_constraint(Constraint::new("Email"))
                .with_constraint(Constraint::new("NotNull").with_groups(["create"])),
        )
        .property(PropertyDescriptor::new("address").with_type(Type::object(ADDRESS).nullable()))
        .method(MethodDescriptor::setter("setPenName", string()))
        .build()
}

/// Returns the abstract parent of `Review`.
pub fn abstract_entity() -> ClassDescriptor {
    ClassDescriptor::builder(ABSTRACT_ENTITY)
        .abstract_class()
        .property(PropertyDescriptor::new("id").with_type(int()))
        .property(PropertyDescriptor::new("createdAt").with_type(Type::object("DateTimeImmutable")))
        .build()
}

/// Returns the `Review` class.
pub fn review() -> ClassDescriptor {
    ClassDescriptor::builder(REVIEW)
        .parent(ABSTRACT_ENTITY)
        .resource(attributes(json!({
            "item_operations": {"get": {}, "delete": {"security": "is_granted('ROLE_ADMIN')"}},
            "collection_operations": {"get": {}, "post": {}},
        })))
        .property(
            PropertyDescriptor::new("rating")
                .with_type(int())
                .with_default(5)
                .with_constraint(Constraint::new("Range").with_option("min", 0).with_option("max", 5)),
        )
        .property(PropertyDescriptor::new("body").with_type(string()))
        .build()
}

/// Returns the `Dummy` class.
pub fn dummy() -> ClassDescriptor {
    ClassDescriptor::builder(DUMMY)
        .resource(AttributeMap::new())
        .method(MethodDescriptor::getter("getName", string()))
        .method(MethodDescriptor::getter("getAlias", string()))
        .build()
}

/// Returns the `Address` class.
pub fn address() -> ClassDescriptor {
    ClassDescriptor::builder(ADDRESS)
        .property(PropertyDescriptor::new("street").with_type(string()))
        .property(PropertyDescriptor::new("city").with_type(string()))
        .build()
}

/// Creates the bookstore registry.
///
/// # Example
///
/// ```
/// use daedalus_core::fixtures::{bookstore_registry, BOOK};
///
/// let registry = bookstore_registry();
/// assert_eq!(registry.len(), 6);
/// assert_eq!(registry.get(BOOK).unwrap().short_name(), "Book");
/// ```
pub fn bookstore_registry() -> ClassRegistry {
    [book(), author(), abstract_entity(), review(), dummy(), address()]
        .into_iter()
        .collect()
}
