//! YAML mapping files.
//!
//! ```yaml
//! resources:
//!   App\Entity\Book:
//!     - shortName: Book
//!       normalizationContext: { groups: [book:read] }
//!       operations:
//!         - kind: Get
//!         - kind: GetCollection
//!     - uriTemplate: /authors/{authorId}/books
//!       operations: [GetCollection]
//!   App\Entity\Author: ~
//!   App\Entity\Review:
//!     description: A review
//!     properties:
//!       rating: { description: Between 0 and 5 }
//! properties:
//!   App\Entity\Book:
//!     isbn: { iri: https://schema.org/isbn }
//! ```
//!
//! A class maps to a list of resources, a single resource map, or `~` for a
//! resource declared with defaults only. A document without a `resources` or
//! `properties` root is read as a `resources` map.

use std::path::Path;

use daedalus_core::{AttributeMap, DeclarationSite, ResourceDeclaration};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::error::{ExtractError, ExtractResult};
use crate::normalize::{self, kind_of};
use crate::ResourceExtractor;

/// Declarations parsed from YAML files.
///
/// Files are parsed eagerly, so lookups never fail after construction.
#[derive(Debug, Clone, Default)]
pub struct YamlExtractor {
    name: String,
    resources: IndexMap<String, Vec<ResourceDeclaration>>,
    properties: IndexMap<String, IndexMap<String, AttributeMap>>,
}

impl YamlExtractor {
    /// Parses every file in `paths`, in order.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> ExtractResult<Self> {
        let mut extractor = Self {
            name: "yaml".to_string(),
            ..Self::default()
        };
        for path in paths {
            let path = path.as_ref();
            let content = read(path)?;
            extractor.load(&path.display().to_string(), &content)?;
        }
        Ok(extractor)
    }

    /// Parses a single in-memory document named `origin`.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(origin: &str, content: &str) -> ExtractResult<Self> {
        let mut extractor = Self {
            name: origin.to_string(),
            ..Self::default()
        };
        extractor.load(origin, content)?;
        Ok(extractor)
    }

    fn load(&mut self, origin: &str, content: &str) -> ExtractResult<()> {
        if content.trim().is_empty() {
            return Ok(());
        }
        let document: Value =
            serde_yaml::from_str(content).map_err(|e| ExtractError::malformed(origin, e.to_string()))?;

        let root = match document {
            Value::Null => return Ok(()),
            Value::Object(root) => root,
            other => {
                return Err(ExtractError::malformed(
                    origin,
                    format!("expected a map at the document root, got {}", kind_of(&other)),
                ))
            }
        };

        let structured = root.contains_key("resources") || root.contains_key("properties");
        let (resources, properties) = if structured {
            for key in root.keys() {
                if key != "resources" && key != "properties" {
                    return Err(ExtractError::malformed(origin, format!("unexpected root key \"{key}\"")));
                }
            }
            (
                root.get("resources").cloned().unwrap_or(Value::Null),
                root.get("properties").cloned().unwrap_or(Value::Null),
            )
        } else {
            (Value::Object(root), Value::Null)
        };

        self.load_resources(origin, &resources)?;
        self.load_properties(origin, &properties)?;
        debug!(source = %origin, classes = self.resources.len(), "yaml mapping loaded");
        Ok(())
    }

    fn load_resources(&mut self, origin: &str, resources: &Value) -> ExtractResult<()> {
        let classes = match resources {
            Value::Null => return Ok(()),
            Value::Object(classes) => classes,
            other => {
                return Err(ExtractError::malformed(
                    origin,
                    format!("\"resources\" must map classes to declarations, got {}", kind_of(other)),
                ))
            }
        };

        for (class, declared) in classes {
            let entries: Vec<Value> = match declared {
                Value::Array(list) => list.clone(),
                single => vec![single.clone()],
            };

            let existing = self.resources.entry(class.clone()).or_default().len();
            for (offset, entry) in entries.into_iter().enumerate() {
                let entry = self.take_nested_properties(origin, class, entry)?;
                let attributes = normalize::resource(&entry, origin)?;
                let site = DeclarationSite::new(origin, existing + offset);
                self.resources
                    .entry(class.clone())
                    .or_default()
                    .push(ResourceDeclaration::new(class.as_str(), site, attributes));
            }
        }
        Ok(())
    }

    // A `properties` map inside a resource declares properties of that class.
    fn take_nested_properties(&mut self, origin: &str, class: &str, entry: Value) -> ExtractResult<Value> {
        let Value::Object(mut map) = entry else {
            return Ok(entry);
        };
        if let Some(properties) = map.remove("properties") {
            self.load_class_properties(origin, class, &properties)?;
        }
        Ok(Value::Object(map))
    }

    fn load_properties(&mut self, origin: &str, properties: &Value) -> ExtractResult<()> {
        match properties {
            Value::Null => Ok(()),
            Value::Object(classes) => {
                for (class, declared) in classes {
                    self.load_class_properties(origin, class, declared)?;
                }
                Ok(())
            }
            other => Err(ExtractError::malformed(
                origin,
                format!("\"properties\" must map classes to properties, got {}", kind_of(other)),
            )),
        }
    }

    fn load_class_properties(&mut self, origin: &str, class: &str, declared: &Value) -> ExtractResult<()> {
        let properties = match declared {
            Value::Null => return Ok(()),
            Value::Object(properties) => properties,
            other => {
                return Err(ExtractError::malformed(
                    origin,
                    format!("properties of {class} must be a map, got {}", kind_of(other)),
                ))
            }
        };

        let target = self.properties.entry(class.to_string()).or_default();
        for (property, raw) in properties {
            let attributes = normalize::property(raw, origin)?;
            target
                .entry(property.clone())
                .and_modify(|existing| existing.extend(attributes.clone()))
                .or_insert(attributes);
        }
        Ok(())
    }
}

pub(crate) fn read(path: &Path) -> ExtractResult<String> {
    if !path.exists() {
        return Err(ExtractError::file_not_found(path));
    }
    std::fs::read_to_string(path).map_err(|e| ExtractError::read(path, &e))
}

impl ResourceExtractor for YamlExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn resource_classes(&self) -> ExtractResult<Vec<String>> {
        Ok(self
            .resources
            .iter()
            .filter(|(_, declarations)| !declarations.is_empty())
            .map(|(class, _)| class.clone())
            .collect())
    }

    fn resources(&self, class: &str) -> ExtractResult<Vec<ResourceDeclaration>> {
        Ok(self.resources.get(class).cloned().unwrap_or_default())
    }

    fn properties(&self, class: &str) -> ExtractResult<IndexMap<String, AttributeMap>> {
        Ok(self.properties.get(class).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BOOKS: &str = r"
resources:
  App\Entity\Book:
    - shortName: Book
      accessControl: is_granted('ROLE_USER')
      operations:
        - kind: Get
        - kind: GetCollection
    - uriTemplate: /authors/{authorId}/books
      operations: [GetCollection]
  App\Entity\Author: ~
  App\Entity\Review:
    description: A review
    properties:
      rating:
        description: Between 0 and 5
properties:
  App\Entity\Book:
    isbn:
      iri: https://schema.org/isbn
";

    #[test]
    fn test_multiple_resources_keep_order() {
        let extractor = YamlExtractor::from_str("books.yaml", BOOKS).unwrap();
        let books = extractor.resources("App\\Entity\\Book").unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].attributes()["short_name"], json!("Book"));
        assert_eq!(books[0].attributes()["access_control"], json!("is_granted('ROLE_USER')"));
        assert_eq!(books[1].site().resource_index(), 1);
        assert_eq!(books[1].attributes()["operations"], json!([{"kind": "GetCollection"}]));
    }

    #[test]
    fn test_null_declares_defaults_only() {
        let extractor = YamlExtractor::from_str("books.yaml", BOOKS).unwrap();
        let authors = extractor.resources("App\\Entity\\Author").unwrap();
        assert_eq!(authors.len(), 1);
        assert!(authors[0].attributes().is_empty());
    }

    #[test]
    fn test_properties() {
        let extractor = YamlExtractor::from_str("books.yaml", BOOKS).unwrap();
        assert_eq!(
            extractor.properties("App\\Entity\\Book").unwrap()["isbn"]["iri"],
            json!("https://schema.org/isbn")
        );
        assert_eq!(
            extractor.properties("App\\Entity\\Review").unwrap()["rating"]["description"],
            json!("Between 0 and 5")
        );
        assert!(!extractor.resources("App\\Entity\\Review").unwrap()[0]
            .attributes()
            .contains_key("properties"));
    }

    #[test]
    fn test_resource_classes() {
        let extractor = YamlExtractor::from_str("books.yaml", BOOKS).unwrap();
        assert_eq!(
            extractor.resource_classes().unwrap(),
            vec!["App\\Entity\\Book", "App\\Entity\\Author", "App\\Entity\\Review"]
        );
    }

    #[test]
    fn test_bare_resources_root() {
        let extractor = YamlExtractor::from_str("bare.yaml", "App\\Entity\\Tag:\n  shortName: Label\n").unwrap();
        assert_eq!(
            extractor.resources("App\\Entity\\Tag").unwrap()[0].attributes()["short_name"],
            json!("Label")
        );
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = YamlExtractor::from_str("bad.yaml", "resources:\n  Foo:\n    colour: blue\n").unwrap_err();
        assert_eq!(err, ExtractError::unknown_property("colour", "resource", "bad.yaml"));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = YamlExtractor::from_str("bad.yaml", "resources: [").unwrap_err();
        assert!(matches!(err, ExtractError::Malformed { .. }));
    }

    #[test]
    fn test_empty_document() {
        let extractor = YamlExtractor::from_str("empty.yaml", "").unwrap();
        assert!(extractor.resource_classes().unwrap().is_empty());
    }
}
