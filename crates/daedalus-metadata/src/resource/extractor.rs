//! Resource metadata collections built from declarations.

use std::fmt;
use std::sync::Arc;

use daedalus_config::MetadataConfig;
use daedalus_core::attributes::{merge_with, remap_deprecated, string_attribute, MergeOptions};
use daedalus_core::class::short_name as class_short_name;
use daedalus_core::{
    ApiResource, AttributeMap, DeclarationSite, MetadataError, MetadataResult, Operation, OperationKind,
    ResourceMetadataCollection,
};
use daedalus_extractor::ResourceExtractor;
use daedalus_telemetry::{metrics, DEPRECATION_TARGET};
use http::Method;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use super::naming;
use crate::factory::{ResourceMetadataCollectionFactory, SharedResourceMetadataCollectionFactory};

/// Methods a legacy operation key may name directly.
const METHOD_KEYS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD", "OPTIONS"];

/// Resource keys that are not inherited by operations.
const RESOURCE_ONLY_KEYS: &[&str] = &["short_name", "iri"];

/// One operation as declared, before merging.
#[derive(Debug, Clone)]
struct OperationDeclaration {
    kind: OperationKind,
    collection: bool,
    suffix: Option<String>,
    attributes: AttributeMap,
    site: DeclarationSite,
}

/// A resolved operation and the attributes it was built from.
struct Resolved {
    name: String,
    operation: Operation,
    fingerprint: AttributeMap,
    site: DeclarationSite,
}

/// Builds resource metadata collections from extracted declarations.
///
/// Each declaration becomes one [`ApiResource`]. Attributes are layered
/// lowest first: configuration defaults, resource attributes, operation
/// attributes. Deprecated keys are remapped on every layer. Operations get
/// their kind, scope, name, URI template and priority here; formats are
/// resolved by an outer layer.
///
/// Resources from the decorated factory, if any, come first. A class with no
/// resource anywhere fails with
/// [`MetadataError::ResourceClassNotFound`].
#[derive(Debug, Clone)]
pub struct ExtractorResourceMetadataCollectionFactory {
    extractor: Arc<dyn ResourceExtractor>,
    config: Arc<MetadataConfig>,
    merge_options: MergeOptions,
    inner: Option<SharedResourceMetadataCollectionFactory>,
}

impl ExtractorResourceMetadataCollectionFactory {
    /// Creates a factory decorating `inner`, if any.
    pub fn new(
        extractor: Arc<dyn ResourceExtractor>,
        config: Arc<MetadataConfig>,
        inner: Option<SharedResourceMetadataCollectionFactory>,
    ) -> Self {
        Self {
            extractor,
            config,
            merge_options: MergeOptions::default(),
            inner,
        }
    }

    /// Sets the merge options used for every layer.
    pub fn with_merge_options(mut self, merge_options: MergeOptions) -> Self {
        self.merge_options = merge_options;
        self
    }

    fn remap(&self, attributes: &mut AttributeMap, class: &str, site: &dyn fmt::Display) {
        for deprecation in remap_deprecated(attributes) {
            warn!(
                target: DEPRECATION_TARGET,
                class = %class,
                source = %site,
                deprecated_key = deprecation.deprecated,
                replacement = deprecation.replacement,
                "{deprecation}"
            );
            metrics::record_deprecation(deprecation.deprecated);
        }
    }

    fn resolve_operation(
        &self,
        class: &str,
        short_name: &str,
        resource_attributes: &AttributeMap,
        declaration: OperationDeclaration,
        priority: i64,
    ) -> MetadataResult<Resolved> {
        let OperationDeclaration {
            kind,
            collection,
            suffix,
            attributes: mut declared,
            site,
        } = declaration;
        self.remap(&mut declared, class, &site);

        let mut base = resource_attributes.clone();
        for key in RESOURCE_ONLY_KEYS {
            base.shift_remove(*key);
        }
        let mut attributes = merge_with(&base, &declared, &self.merge_options);

        let method = kind.method();
        attributes.insert("class".to_string(), Value::from(class));
        attributes.insert("short_name".to_string(), Value::from(short_name));
        attributes.insert("method".to_string(), Value::from(method.as_str()));
        attributes.insert("collection".to_string(), Value::Bool(collection));

        let declared_template = string_attribute(&attributes, "uri_template").map(str::to_string);
        let name = match string_attribute(&attributes, "name") {
            Some(name) => name.to_string(),
            None => {
                let mut suffixes = Vec::new();
                if collection && kind != OperationKind::Post {
                    suffixes.push("collection");
                }
                if let Some(suffix) = suffix.as_deref() {
                    suffixes.push(suffix);
                }
                naming::operation_name(declared_template.as_deref().unwrap_or(short_name), &method, &suffixes)
            }
        };
        attributes.insert("name".to_string(), Value::from(name.as_str()));

        if declared_template.is_none() {
            let segment = naming::path_segment(short_name, self.config.naming.path_segment);
            let template = naming::uri_template(
                string_attribute(&attributes, "route_prefix"),
                &segment,
                !collection,
                suffix.as_deref(),
                self.config.naming.format_suffix,
            );
            attributes.insert("uri_template".to_string(), Value::from(template));
        }

        let fingerprint = attributes.clone();
        if !attributes.get("priority").is_some_and(Value::is_i64) {
            attributes.insert("priority".to_string(), Value::from(priority));
        }

        let extra = match attributes.shift_remove("extra_properties") {
            None | Some(Value::Null) => serde_json::Map::new(),
            Some(Value::Object(extra)) => extra,
            Some(other) => {
                return Err(MetadataError::invalid_declaration(format!(
                    "\"extra_properties\" must be a map at {site}, got {other}"
                )))
            }
        };

        let mut operation = Operation::from_attributes(&attributes).map_err(|err| match err {
            MetadataError::InvalidDeclaration(message) => {
                MetadataError::invalid_declaration(format!("{message} (declared at {site})"))
            }
            other => other,
        })?;
        for (key, value) in extra {
            operation = operation.with_extra_property(key, value);
        }

        Ok(Resolved {
            name,
            operation,
            fingerprint,
            site,
        })
    }
}

impl ResourceMetadataCollectionFactory for ExtractorResourceMetadataCollectionFactory {
    fn name(&self) -> &'static str {
        "extractor"
    }

    fn create(&self, class: &str) -> MetadataResult<ResourceMetadataCollection> {
        let declarations = self.extractor.resources(class)?;

        let mut resources = match &self.inner {
            Some(inner) => match inner.create(class) {
                Ok(collection) => collection.into_iter().collect(),
                Err(err) if err.is_resource_class_not_found() => Vec::new(),
                Err(err) => return Err(err),
            },
            None => Vec::new(),
        };

        if declarations.is_empty() {
            if resources.is_empty() {
                return Err(MetadataError::resource_class_not_found(class));
            }
            return Ok(ResourceMetadataCollection::new(class, resources));
        }

        let mut seen: IndexMap<String, (DeclarationSite, AttributeMap)> = IndexMap::new();
        let mut priority: i64 = 0;
        for (index, resource) in resources.iter().enumerate() {
            for (name, operation) in resource.operations() {
                let site = DeclarationSite::new("decorated", index).operation(name.as_str());
                seen.insert(name.clone(), (site, operation.to_attributes()));
                priority += 1;
            }
        }

        let mut defaults = self.config.default_attributes();
        self.remap(&mut defaults, class, &"configuration defaults");

        for declaration in declarations {
            let site = declaration.site().clone();
            let mut declared = declaration.into_attributes();
            self.remap(&mut declared, class, &site);

            let operations = operation_declarations(&mut declared, &site)?;
            let short_name = string_attribute(&declared, "short_name")
                .map(str::to_string)
                .unwrap_or_else(|| class_short_name(class).to_string());
            let resource_attributes = merge_with(&defaults, &declared, &self.merge_options);

            let mut resolved_operations = IndexMap::new();
            for operation in operations {
                let resolved = self.resolve_operation(class, &short_name, &resource_attributes, operation, priority)?;
                priority += 1;

                if let Some((existing_site, existing)) = seen.get(&resolved.name) {
                    if *existing == resolved.fingerprint || *existing == resolved.operation.to_attributes() {
                        debug!(class = %class, operation = %resolved.name, source = %resolved.site, "identical operation redeclared");
                        continue;
                    }
                    return Err(MetadataError::invalid_declaration(format!(
                        "operation name \"{}\" declared at {} collides with the operation declared at {}",
                        resolved.name, resolved.site, existing_site
                    )));
                }

                seen.insert(resolved.name.clone(), (resolved.site, resolved.fingerprint));
                resolved_operations.insert(resolved.name, resolved.operation);
            }

            resources.push(ApiResource::new(class, short_name, resource_attributes).with_operations(resolved_operations));
        }

        debug!(
            class = %class,
            resources = resources.len(),
            operations = seen.len(),
            "resolved resource metadata collection"
        );
        Ok(ResourceMetadataCollection::new(class, resources))
    }
}

/// Splits the operation declarations off resource attributes.
///
/// Without any operation key the default operations are generated. A legacy
/// scope that is not declared gets its default operations while the other
/// scope is declared.
fn operation_declarations(
    attributes: &mut AttributeMap,
    site: &DeclarationSite,
) -> MetadataResult<Vec<OperationDeclaration>> {
    let unified = attributes.shift_remove("operations").filter(|v| !v.is_null());
    let item = attributes.shift_remove("item_operations").filter(|v| !v.is_null());
    let collection = attributes.shift_remove("collection_operations").filter(|v| !v.is_null());

    let mut declared = Vec::new();
    let mut generated = Vec::new();

    match &unified {
        None => {}
        Some(Value::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                declared.push(unified_operation(None, item, site.operation(index.to_string()))?);
            }
        }
        Some(Value::Object(entries)) => {
            for (key, item) in entries {
                declared.push(unified_operation(Some(key), item, site.operation(key.as_str()))?);
            }
        }
        Some(other) => {
            return Err(MetadataError::invalid_declaration(format!(
                "\"operations\" must be a list or a map at {site}, got {other}"
            )))
        }
    }

    let legacy = item.is_some() || collection.is_some();
    for (scope, is_collection, defaults) in [
        (&item, false, &[OperationKind::Get, OperationKind::Put, OperationKind::Patch, OperationKind::Delete][..]),
        (&collection, true, &[OperationKind::GetCollection, OperationKind::Post][..]),
    ] {
        match scope {
            Some(Value::Object(entries)) => {
                for (key, item) in entries {
                    declared.push(legacy_operation(key, item, is_collection, site.operation(key.as_str()))?);
                }
            }
            Some(other) => {
                return Err(MetadataError::invalid_declaration(format!(
                    "legacy operations must be a map at {site}, got {other}"
                )))
            }
            None if legacy => generated.extend(defaults.iter().map(|kind| default_operation(kind, site))),
            None => {}
        }
    }

    if unified.is_none() && !legacy {
        generated.extend(OperationKind::defaults().iter().map(|kind| default_operation(kind, site)));
    }

    declared.extend(generated);
    Ok(declared)
}

fn default_operation(kind: &OperationKind, site: &DeclarationSite) -> OperationDeclaration {
    OperationDeclaration {
        kind: kind.clone(),
        collection: kind.is_collection(),
        suffix: None,
        attributes: AttributeMap::new(),
        site: site.operation(format!("default:{kind}")),
    }
}

fn operation_attributes(value: &Value, site: &DeclarationSite) -> MetadataResult<AttributeMap> {
    match value {
        Value::Null => Ok(AttributeMap::new()),
        Value::Object(map) => Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        other => Err(MetadataError::invalid_declaration(format!(
            "operation at {site} must be a map, got {other}"
        ))),
    }
}

fn parse_method(value: &str, site: &DeclarationSite) -> MetadataResult<Method> {
    Method::from_bytes(value.to_ascii_uppercase().as_bytes())
        .map_err(|_| MetadataError::invalid_declaration(format!("invalid method \"{value}\" at {site}")))
}

fn declared_method(attributes: &AttributeMap, site: &DeclarationSite) -> MetadataResult<Option<Method>> {
    match attributes.get("method") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(method)) => parse_method(method, site).map(Some),
        Some(other) => Err(MetadataError::invalid_declaration(format!(
            "\"method\" must be a string at {site}, got {other}"
        ))),
    }
}

fn take_kind_name(attributes: &mut AttributeMap, key: &str, site: &DeclarationSite) -> MetadataResult<Option<String>> {
    match attributes.shift_remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(kind)) => Ok(Some(kind)),
        Some(other) => Err(MetadataError::invalid_declaration(format!(
            "\"{key}\" must be a string at {site}, got {other}"
        ))),
    }
}

// Entry of `operations`: the kind comes from `kind` or `class`, then from the
// map key, then from `method` and `collection`. A map key that is not a kind
// names the operation.
fn unified_operation(key: Option<&str>, value: &Value, site: DeclarationSite) -> MetadataResult<OperationDeclaration> {
    let mut attributes = operation_attributes(value, &site)?;
    let kind_name = take_kind_name(&mut attributes, "kind", &site)?;
    let class_name = take_kind_name(&mut attributes, "class", &site)?;
    let kind_name = kind_name.or(class_name);
    let method = declared_method(&attributes, &site)?;
    let collection = attributes.get("collection").and_then(Value::as_bool);

    let key_kind = key.and_then(OperationKind::from_name);
    let names_operation = key.filter(|_| key_kind.is_none());
    let kind = match (kind_name.as_deref(), key_kind, method) {
        (Some(name), _, method) => match (OperationKind::from_name(name), method) {
            (Some(kind), _) => kind,
            (None, Some(method)) => OperationKind::from_method(&method, collection.unwrap_or(false)),
            (None, None) => {
                return Err(MetadataError::invalid_declaration(format!(
                    "unknown operation kind \"{name}\" at {site}"
                )))
            }
        },
        (None, Some(kind), _) => kind,
        (None, None, Some(method)) => OperationKind::from_method(&method, collection.unwrap_or(false)),
        (None, None, None) => {
            return Err(MetadataError::invalid_declaration(format!(
                "operation at {site} must declare a kind or a method"
            )))
        }
    };

    if let Some(key) = names_operation {
        if !attributes.contains_key("name") {
            attributes.insert("name".to_string(), Value::from(key));
        }
    }
    attributes.shift_remove("method");
    attributes.shift_remove("collection");

    Ok(OperationDeclaration {
        collection: collection.unwrap_or_else(|| kind.is_collection()),
        kind,
        suffix: None,
        attributes,
        site,
    })
}

// Entry of `item_operations` / `collection_operations`, keyed by method or by
// a custom name that then requires a `method`.
fn legacy_operation(
    key: &str,
    value: &Value,
    collection: bool,
    site: DeclarationSite,
) -> MetadataResult<OperationDeclaration> {
    let mut attributes = operation_attributes(value, &site)?;
    attributes.shift_remove("kind");
    let key_is_method = METHOD_KEYS.contains(&key.to_ascii_uppercase().as_str());

    let method = match (declared_method(&attributes, &site)?, key_is_method) {
        (Some(method), _) => method,
        (None, true) => parse_method(key, &site)?,
        (None, false) => {
            return Err(MetadataError::invalid_declaration(format!(
                "operation \"{key}\" at {site} must declare a method"
            )))
        }
    };
    attributes.shift_remove("method");
    attributes.shift_remove("collection");

    Ok(OperationDeclaration {
        kind: OperationKind::from_method(&method, collection),
        collection,
        suffix: (!key_is_method).then(|| key.to_string()),
        attributes,
        site,
    })
}
