//! Type descriptors for properties.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Builtin type kinds a property value can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinType {
    /// Integer number.
    Int,
    /// Floating point number.
    Float,
    /// String.
    String,
    /// Boolean.
    Bool,
    /// Array or list.
    Array,
    /// Object of a named class.
    Object,
    /// Null.
    Null,
    /// Any iterable.
    Iterable,
    /// Unknown or mixed.
    Mixed,
}

impl BuiltinType {
    /// Parses a builtin type name, accepting the usual aliases.
    pub fn parse(name: &str) -> Option<Self> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "int" | "integer" => Self::Int,
            "float" | "double" | "number" => Self::Float,
            "string" => Self::String,
            "bool" | "boolean" => Self::Bool,
            "array" | "list" => Self::Array,
            "object" => Self::Object,
            "null" => Self::Null,
            "iterable" => Self::Iterable,
            "mixed" => Self::Mixed,
            _ => return None,
        };
        Some(kind)
    }

    /// Returns the canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Array => "array",
            Self::Object => "object",
            Self::Null => "null",
            Self::Iterable => "iterable",
            Self::Mixed => "mixed",
        }
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property type: kind, nullability, class and collection element types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Type {
    builtin: BuiltinType,
    #[serde(default)]
    nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    class_name: Option<String>,
    #[serde(default)]
    collection: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    collection_key_type: Option<Box<Type>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    collection_value_type: Option<Box<Type>>,
}

impl Type {
    /// Creates a non-nullable scalar type.
    pub fn new(builtin: BuiltinType) -> Self {
        Self {
            builtin,
            nullable: false,
            class_name: None,
            collection: false,
            collection_key_type: None,
            collection_value_type: None,
        }
    }

    /// Creates an object type of the given class.
    pub fn object(class_name: impl Into<String>) -> Self {
        Self {
            class_name: Some(class_name.into()),
            ..Self::new(BuiltinType::Object)
        }
    }

    /// Creates a list type with integer keys and the given element type.
    pub fn collection_of(value_type: Type) -> Self {
        Self {
            collection: true,
            collection_key_type: Some(Box::new(Self::new(BuiltinType::Int))),
            collection_value_type: Some(Box::new(value_type)),
            ..Self::new(BuiltinType::Array)
        }
    }

    /// Returns a nullable copy of this type.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Returns the builtin kind.
    pub fn builtin(&self) -> BuiltinType {
        self.builtin
    }

    /// Returns true when null is accepted.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Returns the class name for object types.
    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    /// Returns true for collection types.
    pub fn is_collection(&self) -> bool {
        self.collection
    }

    /// Returns the collection key type.
    pub fn collection_key_type(&self) -> Option<&Type> {
        self.collection_key_type.as_deref()
    }

    /// Returns the collection element type.
    pub fn collection_value_type(&self) -> Option<&Type> {
        self.collection_value_type.as_deref()
    }
}
