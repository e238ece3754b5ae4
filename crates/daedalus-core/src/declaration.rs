//! Raw resource declarations, as produced by extractors.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attributes::AttributeMap;

/// Where a declaration came from.
///
/// Displayed as `source#resource` or `source#resource/operation`, e.g.
/// `config/resources.yaml#0/get`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeclarationSite {
    source: String,
    resource: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operation: Option<String>,
}

impl DeclarationSite {
    /// Creates the site of the `resource`-th declaration in `source`.
    pub fn new(source: impl Into<String>, resource: usize) -> Self {
        Self {
            source: source.into(),
            resource,
            operation: None,
        }
    }

    /// Returns the site of an operation nested in this declaration.
    pub fn operation(&self, operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..self.clone()
        }
    }

    /// Returns the source (file path or `attributes`).
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the resource index within the source.
    pub fn resource_index(&self) -> usize {
        self.resource
    }

    /// Returns the operation key or index, for operation sites.
    pub fn operation_key(&self) -> Option<&str> {
        self.operation.as_deref()
    }
}

impl fmt::Display for DeclarationSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.source, self.resource)?;
        if let Some(operation) = &self.operation {
            write!(f, "/{operation}")?;
        }
        Ok(())
    }
}

/// One resource declared on a class by one source.
///
/// The attributes hold the resource-level keys as well as the raw
/// `operations`, `item_operations` and `collection_operations` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDeclaration {
    class: String,
    site: DeclarationSite,
    attributes: AttributeMap,
}

impl ResourceDeclaration {
    /// Creates a declaration.
    pub fn new(class: impl Into<String>, site: DeclarationSite, attributes: AttributeMap) -> Self {
        Self {
            class: class.into(),
            site,
            attributes,
        }
    }

    /// Returns the declared class.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Returns the declaration site.
    pub fn site(&self) -> &DeclarationSite {
        &self.site
    }

    /// Returns the raw attributes.
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Consumes the declaration, returning its attributes.
    pub fn into_attributes(self) -> AttributeMap {
        self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_display() {
        let site = DeclarationSite::new("config/resources.yaml", 1);
        assert_eq!(site.to_string(), "config/resources.yaml#1");
        assert_eq!(site.operation("get").to_string(), "config/resources.yaml#1/get");
        assert_eq!(site.operation_key(), None);
    }
}
