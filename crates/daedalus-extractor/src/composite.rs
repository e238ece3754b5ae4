//! Several extractors behind one.

use std::sync::Arc;

use daedalus_core::{AttributeMap, ResourceDeclaration};
use indexmap::IndexMap;
use tracing::debug;

use crate::error::ExtractResult;
use crate::ResourceExtractor;

/// Queries its extractors in order and concatenates their answers.
///
/// Resources keep the order of the extractors, then declaration order.
/// Property declarations of later extractors are merged key by key over
/// earlier ones.
#[derive(Debug, Clone, Default)]
pub struct CompositeExtractor {
    extractors: Vec<Arc<dyn ResourceExtractor>>,
}

impl CompositeExtractor {
    /// Creates a composite over `extractors`.
    pub fn new(extractors: Vec<Arc<dyn ResourceExtractor>>) -> Self {
        Self { extractors }
    }

    /// Appends an extractor.
    pub fn push(&mut self, extractor: Arc<dyn ResourceExtractor>) {
        self.extractors.push(extractor);
    }

    /// Returns the number of extractors.
    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    /// Returns true when there is no extractor.
    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl ResourceExtractor for CompositeExtractor {
    fn name(&self) -> &str {
        "composite"
    }

    fn resource_classes(&self) -> ExtractResult<Vec<String>> {
        let mut classes: Vec<String> = Vec::new();
        for extractor in &self.extractors {
            for class in extractor.resource_classes()? {
                if !classes.contains(&class) {
                    classes.push(class);
                }
            }
        }
        Ok(classes)
    }

    fn resources(&self, class: &str) -> ExtractResult<Vec<ResourceDeclaration>> {
        let mut declarations = Vec::new();
        for extractor in &self.extractors {
            let found = extractor.resources(class)?;
            if !found.is_empty() {
                debug!(class = %class, source = extractor.name(), count = found.len(), "resource declarations found");
            }
            declarations.extend(found);
        }
        Ok(declarations)
    }

    fn properties(&self, class: &str) -> ExtractResult<IndexMap<String, AttributeMap>> {
        let mut properties: IndexMap<String, AttributeMap> = IndexMap::new();
        for extractor in &self.extractors {
            for (name, attributes) in extractor.properties(class)? {
                properties.entry(name).or_default().extend(attributes);
            }
        }
        Ok(properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{XmlExtractor, YamlExtractor};
    use serde_json::json;

    #[test]
    fn test_sources_are_concatenated_in_order() {
        let yaml = YamlExtractor::from_str(
            "a.yaml",
            "resources:\n  Book:\n    shortName: Book\nproperties:\n  Book:\n    isbn: { description: from yaml, readable: true }\n",
        )
        .unwrap();
        let xml = XmlExtractor::from_str(
            "b.xml",
            r#"<resources><resource class="Book" shortName="Novel"><property name="isbn" description="from xml"/></resource><resource class="Tag"/></resources>"#,
        )
        .unwrap();

        let composite = CompositeExtractor::new(vec![Arc::new(yaml), Arc::new(xml)]);
        assert_eq!(composite.len(), 2);
        assert_eq!(composite.resource_classes().unwrap(), vec!["Book", "Tag"]);

        let books = composite.resources("Book").unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[1].site().source(), "b.xml");

        let isbn = &composite.properties("Book").unwrap()["isbn"];
        assert_eq!(isbn["description"], json!("from xml"));
        assert_eq!(isbn["readable"], json!(true));
    }
}
