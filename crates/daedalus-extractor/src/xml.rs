//! XML mapping files.
//!
//! ```xml
//! <resources>
//!   <resource class="App\Entity\Book" shortName="Book">
//!     <attribute name="normalization_context">
//!       <attribute name="groups">
//!         <attribute>book:read</attribute>
//!       </attribute>
//!     </attribute>
//!     <operations>
//!       <operation class="ApiPlatform\Metadata\Get"/>
//!       <operation kind="GetCollection" paginationItemsPerPage="10"/>
//!     </operations>
//!     <itemOperations>
//!       <itemOperation name="publish" method="PUT" uriTemplate="/books/{id}/publish"/>
//!     </itemOperations>
//!     <property name="isbn" iri="https://schema.org/isbn"/>
//!   </resource>
//! </resources>
//! ```
//!
//! `<attribute>` elements nest: children carrying a `name` build a map,
//! children without one build a list, a childless element holds a scalar.
//! Attribute values and text are coerced: `true`/`false` become booleans and
//! integers become numbers.

use std::path::Path;

use daedalus_core::{AttributeMap, DeclarationSite, ResourceDeclaration};
use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ExtractError, ExtractResult};
use crate::normalize;
use crate::yaml::read;
use crate::ResourceExtractor;

const RESOURCE_CHILDREN: &[&str] = &[
    "attribute",
    "operations",
    "itemOperations",
    "collectionOperations",
    "property",
];

#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: IndexMap<String, String>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn open(start: &BytesStart<'_>, origin: &str) -> ExtractResult<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = IndexMap::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| ExtractError::malformed(origin, e.to_string()))?;
            let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| ExtractError::malformed(origin, e.to_string()))?
                .into_owned();
            attributes.insert(key, value);
        }
        Ok(Self {
            name,
            attributes,
            ..Self::default()
        })
    }

    // Fails on the first child element not listed in `allowed`.
    fn expect_children(&self, allowed: &[&str], scope: &'static str, origin: &str) -> ExtractResult<()> {
        match self.children.iter().find(|child| !allowed.contains(&child.name.as_str())) {
            Some(child) => Err(ExtractError::unknown_property(child.name.clone(), scope, origin)),
            None => Ok(()),
        }
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    // Element attributes as a map, minus the listed keys.
    fn attribute_map(&self, skip: &[&str]) -> Map<String, Value> {
        self.attributes
            .iter()
            .filter(|(key, _)| !skip.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), coerce(value)))
            .collect()
    }

    // Value of an `<attribute>` element.
    fn value(&self) -> Value {
        let nested: Vec<&Element> = self.children_named("attribute").collect();
        if nested.is_empty() {
            return if self.text.is_empty() {
                Value::Null
            } else {
                coerce(&self.text)
            };
        }

        if nested.iter().all(|child| child.attributes.contains_key("name")) {
            Value::Object(
                nested
                    .iter()
                    .map(|child| (child.attributes["name"].clone(), child.value()))
                    .collect(),
            )
        } else {
            Value::Array(nested.iter().map(|child| child.value()).collect())
        }
    }

    // Element attributes plus nested `<attribute>` children, as one map.
    fn declaration(&self, skip: &[&str]) -> Map<String, Value> {
        let mut map = self.attribute_map(skip);
        for child in self.children_named("attribute") {
            if let Some(name) = child.attributes.get("name") {
                map.insert(name.clone(), child.value());
            }
        }
        map
    }
}

fn coerce(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
    }
}

fn parse(origin: &str, content: &str) -> ExtractResult<Option<Element>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            ExtractError::malformed(origin, format!("at byte {}: {e}", reader.error_position()))
        })?;

        match event {
            Event::Start(start) => stack.push(Element::open(&start, origin)?),
            Event::Empty(start) => {
                let element = Element::open(&start, origin)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| ExtractError::malformed(origin, e.to_string()))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(ExtractError::malformed(origin, "unexpected end of document"));
    }
    Ok(root)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

/// Declarations parsed from XML files.
///
/// Files are parsed eagerly, so lookups never fail after construction.
#[derive(Debug, Clone, Default)]
pub struct XmlExtractor {
    name: String,
    resources: IndexMap<String, Vec<ResourceDeclaration>>,
    properties: IndexMap<String, IndexMap<String, AttributeMap>>,
}

impl XmlExtractor {
    /// Parses every file in `paths`, in order.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> ExtractResult<Self> {
        let mut extractor = Self {
            name: "xml".to_string(),
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
        let Some(root) = parse(origin, content)? else {
            debug!(source = %origin, "empty mapping document");
            return Ok(());
        };
        if root.name != "resources" {
            return Err(ExtractError::malformed(
                origin,
                format!("expected a <resources> root element, got <{}>", root.name),
            ));
        }

        for resource in &root.children {
            if resource.name != "resource" {
                return Err(ExtractError::malformed(
                    origin,
                    format!("unexpected <{}> in <resources>", resource.name),
                ));
            }
            self.load_resource(origin, resource)?;
        }
        debug!(source = %origin, resources = root.children.len(), "xml mapping loaded");
        Ok(())
    }

    fn load_resource(&mut self, origin: &str, element: &Element) -> ExtractResult<()> {
        let class = element
            .attributes
            .get("class")
            .cloned()
            .ok_or_else(|| ExtractError::malformed(origin, "<resource> without a class attribute"))?;

        element.expect_children(RESOURCE_CHILDREN, "resource", origin)?;
        let mut raw = element.declaration(&["class"]);

        if let Some(operations) = element.children_named("operations").next() {
            operations.expect_children(&["operation"], "operations", origin)?;
            let list = operations
                .children_named("operation")
                .map(|operation| Value::Object(operation.declaration(&[])))
                .collect();
            raw.insert("operations".to_string(), Value::Array(list));
        }

        for (container, entry, key) in [
            ("itemOperations", "itemOperation", "item_operations"),
            ("collectionOperations", "collectionOperation", "collection_operations"),
        ] {
            if let Some(operations) = element.children_named(container).next() {
                operations.expect_children(&[entry], container, origin)?;
                let mut map = Map::new();
                for operation in operations.children_named(entry) {
                    let name = operation.attributes.get("name").cloned().ok_or_else(|| {
                        ExtractError::malformed(origin, format!("<{entry}> without a name attribute"))
                    })?;
                    map.insert(name, Value::Object(operation.declaration(&["name"])));
                }
                raw.insert(key.to_string(), Value::Object(map));
            }
        }

        for property in element.children_named("property") {
            let name = property
                .attributes
                .get("name")
                .cloned()
                .ok_or_else(|| ExtractError::malformed(origin, "<property> without a name attribute"))?;
            let attributes = normalize::property(&Value::Object(property.declaration(&["name"])), origin)?;
            self.properties
                .entry(class.clone())
                .or_default()
                .insert(name, attributes);
        }

        let attributes = normalize::resource(&Value::Object(raw), origin)?;
        let declarations = self.resources.entry(class.clone()).or_default();
        let site = DeclarationSite::new(origin, declarations.len());
        declarations.push(ResourceDeclaration::new(class, site, attributes));
        Ok(())
    }
}

impl ResourceExtractor for XmlExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn resource_classes(&self) -> ExtractResult<Vec<String>> {
        Ok(self.resources.keys().cloned().collect())
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

    const BOOKS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<resources>
  <!-- the catalogue -->
  <resource class="App\Entity\Book" shortName="Book" accessControl="is_granted('ROLE_USER')">
    <attribute name="normalization_context">
      <attribute name="groups">
        <attribute>book:read</attribute>
      </attribute>
      <attribute name="skip_null_values">true</attribute>
    </attribute>
    <operations>
      <operation class="ApiPlatform\Metadata\Get"/>
      <operation kind="GetCollection" paginationItemsPerPage="10"/>
    </operations>
    <property name="isbn" iri="https://schema.org/isbn" readable="true"/>
  </resource>
  <resource class="App\Entity\Book" uriTemplate="/authors/{authorId}/books">
    <itemOperations>
      <itemOperation name="publish" method="PUT" uriTemplate="/books/{id}/publish">
        <attribute name="status">202</attribute>
      </itemOperation>
    </itemOperations>
    <collectionOperations/>
  </resource>
  <resource class="App\Entity\Author"/>
</resources>
"#;

    #[test]
    fn test_resources_and_attributes() {
        let extractor = XmlExtractor::from_str("books.xml", BOOKS).unwrap();
        let books = extractor.resources("App\\Entity\\Book").unwrap();
        assert_eq!(books.len(), 2);

        let first = books[0].attributes();
        assert_eq!(first["short_name"], json!("Book"));
        assert_eq!(first["access_control"], json!("is_granted('ROLE_USER')"));
        assert_eq!(
            first["normalization_context"],
            json!({"groups": ["book:read"], "skip_null_values": true})
        );
        assert_eq!(
            first["operations"],
            json!([
                {"class": "ApiPlatform\\Metadata\\Get"},
                {"kind": "GetCollection", "pagination_items_per_page": 10},
            ])
        );
    }

    #[test]
    fn test_legacy_operations() {
        let extractor = XmlExtractor::from_str("books.xml", BOOKS).unwrap();
        let second = &extractor.resources("App\\Entity\\Book").unwrap()[1];
        assert_eq!(second.site().resource_index(), 1);
        assert_eq!(
            second.attributes()["item_operations"]["publish"],
            json!({"method": "PUT", "uri_template": "/books/{id}/publish", "status": 202})
        );
        assert_eq!(second.attributes()["collection_operations"], json!({}));
    }

    #[test]
    fn test_properties_and_classes() {
        let extractor = XmlExtractor::from_str("books.xml", BOOKS).unwrap();
        let properties = extractor.properties("App\\Entity\\Book").unwrap();
        assert_eq!(properties["isbn"]["readable"], json!(true));
        assert_eq!(
            extractor.resource_classes().unwrap(),
            vec!["App\\Entity\\Book", "App\\Entity\\Author"]
        );
        assert!(extractor.resources("App\\Entity\\Author").unwrap()[0].attributes().is_empty());
    }

    #[test]
    fn test_unknown_attribute_is_rejected() {
        let err = XmlExtractor::from_str(
            "bad.xml",
            r#"<resources><resource class="Foo" colour="blue"/></resources>"#,
        )
        .unwrap_err();
        assert_eq!(err, ExtractError::unknown_property("colour", "resource", "bad.xml"));
    }

    #[test]
    fn test_unknown_child_element_is_rejected() {
        let err = XmlExtractor::from_str(
            "bad.xml",
            r#"<resources><resource class="Foo"><colour>blue</colour></resource></resources>"#,
        )
        .unwrap_err();
        assert_eq!(err, ExtractError::unknown_property("colour", "resource", "bad.xml"));

        let err = XmlExtractor::from_str(
            "bad.xml",
            r#"<resources><resource class="Foo"><operatons><operation kind="Get"/></operatons></resource></resources>"#,
        )
        .unwrap_err();
        assert_eq!(err, ExtractError::unknown_property("operatons", "resource", "bad.xml"));
    }

    #[test]
    fn test_unknown_operation_element_is_rejected() {
        let err = XmlExtractor::from_str(
            "bad.xml",
            r#"<resources><resource class="Foo"><operations><operaton kind="Get"/></operations></resource></resources>"#,
        )
        .unwrap_err();
        assert_eq!(err, ExtractError::unknown_property("operaton", "operations", "bad.xml"));

        let err = XmlExtractor::from_str(
            "bad.xml",
            r#"<resources><resource class="Foo"><itemOperations><operation name="get"/></itemOperations></resource></resources>"#,
        )
        .unwrap_err();
        assert_eq!(err, ExtractError::unknown_property("operation", "itemOperations", "bad.xml"));
    }

    #[test]
    fn test_malformed_xml() {
        let err = XmlExtractor::from_str("bad.xml", "<resources><resource class=\"Foo\">").unwrap_err();
        assert!(matches!(err, ExtractError::Malformed { .. }));

        let err = XmlExtractor::from_str("bad.xml", "<mapping/>").unwrap_err();
        assert!(err.to_string().contains("<resources>"));
    }
}
