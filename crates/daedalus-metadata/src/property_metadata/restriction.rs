//! Schema restrictions derived from validation constraints.
//!
//! Each resolver turns the constraints it understands into a JSON schema
//! fragment. Fragments from every matching resolver are merged into the
//! property's schema.

use std::fmt;
use std::sync::Arc;

use daedalus_core::{BuiltinType, Constraint, PropertyMetadata};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

/// A JSON schema fragment.
pub type SchemaFragment = IndexMap<String, Value>;

/// Converts one kind of constraint into schema keywords.
pub trait RestrictionResolver: Send + Sync + fmt::Debug {
    /// Returns true if this resolver understands `constraint` for `metadata`.
    fn supports(&self, constraint: &Constraint, metadata: &PropertyMetadata) -> bool;

    /// Returns the fragment for `constraint`; empty when nothing applies.
    fn resolve(&self, constraint: &Constraint, metadata: &PropertyMetadata) -> SchemaFragment;
}

/// Shared handle to a resolver.
pub type SharedRestrictionResolver = Arc<dyn RestrictionResolver>;

/// Returns the built-in resolvers.
pub fn default_resolvers() -> Vec<SharedRestrictionResolver> {
    let leaves = leaf_resolvers();
    let mut resolvers = leaves.clone();
    resolvers.push(Arc::new(AtLeastOneOfRestriction::new(leaves)));
    resolvers
}

fn leaf_resolvers() -> Vec<SharedRestrictionResolver> {
    vec![
        Arc::new(LengthRestriction),
        Arc::new(RegexRestriction),
        Arc::new(FormatRestriction),
        Arc::new(ChoiceRestriction),
        Arc::new(RangeRestriction),
        Arc::new(CountRestriction),
        Arc::new(ComparisonRestriction),
        Arc::new(UniqueRestriction),
    ]
}

/// Resolves `constraint` with every supporting resolver and merges the result.
pub fn resolve_all(
    resolvers: &[SharedRestrictionResolver],
    constraint: &Constraint,
    metadata: &PropertyMetadata,
) -> SchemaFragment {
    let mut fragment = SchemaFragment::new();
    for resolver in resolvers {
        if resolver.supports(constraint, metadata) {
            fragment.extend(resolver.resolve(constraint, metadata));
        }
    }
    fragment
}

// Properties without type information are treated as matching any kind.
fn has_builtin(metadata: &PropertyMetadata, kinds: &[BuiltinType]) -> bool {
    match metadata.builtin_types() {
        None => true,
        Some(types) if types.is_empty() => true,
        Some(types) => types.iter().any(|t| kinds.contains(&t.builtin())),
    }
}

fn is_collection(metadata: &PropertyMetadata) -> bool {
    match metadata.builtin_types() {
        None => true,
        Some(types) if types.is_empty() => true,
        Some(types) => types
            .iter()
            .any(|t| t.is_collection() || matches!(t.builtin(), BuiltinType::Array | BuiltinType::Iterable)),
    }
}

fn copy_option(fragment: &mut SchemaFragment, constraint: &Constraint, option: &str, keyword: &str) {
    if let Some(value) = constraint.option(option).filter(|v| !v.is_null()) {
        fragment.insert(keyword.to_string(), value.clone());
    }
}

const NUMERIC: &[BuiltinType] = &[BuiltinType::Int, BuiltinType::Float];

/// `Length` → `minLength` / `maxLength` on strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthRestriction;

impl RestrictionResolver for LengthRestriction {
    fn supports(&self, constraint: &Constraint, metadata: &PropertyMetadata) -> bool {
        constraint.name() == "Length" && has_builtin(metadata, &[BuiltinType::String])
    }

    fn resolve(&self, constraint: &Constraint, _metadata: &PropertyMetadata) -> SchemaFragment {
        let mut fragment = SchemaFragment::new();
        copy_option(&mut fragment, constraint, "min", "minLength");
        copy_option(&mut fragment, constraint, "max", "maxLength");
        fragment
    }
}

static DELIMITED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^([^\w\s\\])(.*)([^\w\s\\])([a-zA-Z]*)$").expect("delimiter pattern is valid")
});

/// Strips PCRE delimiters and flags: `/^[a-z]+$/i` → `^[a-z]+$`.
///
/// Patterns without a recognised delimiter pair are returned unchanged.
pub fn strip_delimiters(pattern: &str) -> &str {
    let Some(captures) = DELIMITED.captures(pattern) else {
        return pattern;
    };
    let (open, close) = (&captures[1], &captures[3]);
    let paired = match open {
        "(" => close == ")",
        "{" => close == "}",
        "[" => close == "]",
        "<" => close == ">",
        _ => open == close,
    };
    match captures.get(2) {
        Some(body) if paired => body.as_str(),
        _ => pattern,
    }
}

/// Builds an anchored schema pattern from a constraint pattern.
///
/// Unanchored ends match anything, as a validator searching the value would.
pub fn schema_pattern(pattern: &str) -> String {
    let body = strip_delimiters(pattern);
    let (body, start) = match body.strip_prefix('^') {
        Some(rest) => (rest, ""),
        None => (body, ".*"),
    };
    let (body, end) = match body.strip_suffix('$') {
        Some(rest) if !rest.ends_with('\\') => (rest, ""),
        _ => (body, ".*"),
    };
    format!("^({start}{body}{end})$")
}

/// `Regex` → `pattern`, unless the constraint forbids a match.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexRestriction;

impl RestrictionResolver for RegexRestriction {
    fn supports(&self, constraint: &Constraint, metadata: &PropertyMetadata) -> bool {
        constraint.name() == "Regex" && has_builtin(metadata, &[BuiltinType::String])
    }

    fn resolve(&self, constraint: &Constraint, _metadata: &PropertyMetadata) -> SchemaFragment {
        let mut fragment = SchemaFragment::new();
        let matches = constraint.option("match").and_then(Value::as_bool).unwrap_or(true);
        if let (true, Some(pattern)) = (matches, constraint.option("pattern").and_then(Value::as_str)) {
            fragment.insert("pattern".to_string(), Value::String(schema_pattern(pattern)));
        }
        fragment
    }
}

/// String formats: `Email` → `email`, `Url` → `uri`, `Uuid` → `uuid`, ...
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatRestriction;

impl FormatRestriction {
    fn format(constraint: &Constraint) -> Option<&'static str> {
        let format = match constraint.name() {
            "Email" => "email",
            "Url" => "uri",
            "Uuid" => "uuid",
            "Hostname" => "hostname",
            "Date" => "date",
            "DateTime" => "date-time",
            "Time" => "time",
            "Ip" => match constraint.option("version").and_then(Value::as_str) {
                Some(version) if version.starts_with('6') => "ipv6",
                Some(version) if version.starts_with('4') => "ipv4",
                Some(_) => return None,
                None => "ipv4",
            },
            _ => return None,
        };
        Some(format)
    }
}

impl RestrictionResolver for FormatRestriction {
    fn supports(&self, constraint: &Constraint, metadata: &PropertyMetadata) -> bool {
        Self::format(constraint).is_some() && has_builtin(metadata, &[BuiltinType::String])
    }

    fn resolve(&self, constraint: &Constraint, _metadata: &PropertyMetadata) -> SchemaFragment {
        Self::format(constraint)
            .map(|format| SchemaFragment::from([("format".to_string(), json!(format))]))
            .unwrap_or_default()
    }
}

/// `Choice` → `enum`, or an array of `enum` items when multiple.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChoiceRestriction;

impl RestrictionResolver for ChoiceRestriction {
    fn supports(&self, constraint: &Constraint, _metadata: &PropertyMetadata) -> bool {
        constraint.name() == "Choice" && constraint.option("choices").is_some_and(Value::is_array)
    }

    fn resolve(&self, constraint: &Constraint, _metadata: &PropertyMetadata) -> SchemaFragment {
        let mut fragment = SchemaFragment::new();
        let Some(choices) = constraint.option("choices") else {
            return fragment;
        };

        if constraint.option("multiple").and_then(Value::as_bool).unwrap_or(false) {
            fragment.insert("type".to_string(), json!("array"));
            fragment.insert("items".to_string(), json!({ "enum": choices }));
            copy_option(&mut fragment, constraint, "min", "minItems");
            copy_option(&mut fragment, constraint, "max", "maxItems");
        } else {
            fragment.insert("enum".to_string(), choices.clone());
        }
        fragment
    }
}

/// `Range` → `minimum` / `maximum` on numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeRestriction;

impl RestrictionResolver for RangeRestriction {
    fn supports(&self, constraint: &Constraint, metadata: &PropertyMetadata) -> bool {
        constraint.name() == "Range" && has_builtin(metadata, NUMERIC)
    }

    fn resolve(&self, constraint: &Constraint, _metadata: &PropertyMetadata) -> SchemaFragment {
        let mut fragment = SchemaFragment::new();
        copy_option(&mut fragment, constraint, "min", "minimum");
        copy_option(&mut fragment, constraint, "max", "maximum");
        fragment
    }
}

/// `Count` → `minItems` / `maxItems` on collections.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountRestriction;

impl RestrictionResolver for CountRestriction {
    fn supports(&self, constraint: &Constraint, metadata: &PropertyMetadata) -> bool {
        constraint.name() == "Count" && is_collection(metadata)
    }

    fn resolve(&self, constraint: &Constraint, _metadata: &PropertyMetadata) -> SchemaFragment {
        let mut fragment = SchemaFragment::new();
        copy_option(&mut fragment, constraint, "min", "minItems");
        copy_option(&mut fragment, constraint, "max", "maxItems");
        fragment
    }
}

/// Comparison constraints on numbers: `GreaterThan`, `Positive`, ...
#[derive(Debug, Clone, Copy, Default)]
pub struct ComparisonRestriction;

impl ComparisonRestriction {
    fn keyword(constraint: &Constraint) -> Option<(&'static str, Value)> {
        let value = || constraint.option("value").filter(|v| v.is_number()).cloned();
        match constraint.name() {
            "GreaterThan" => value().map(|v| ("exclusiveMinimum", v)),
            "GreaterThanOrEqual" => value().map(|v| ("minimum", v)),
            "LessThan" => value().map(|v| ("exclusiveMaximum", v)),
            "LessThanOrEqual" => value().map(|v| ("maximum", v)),
            "Positive" => Some(("exclusiveMinimum", json!(0))),
            "PositiveOrZero" => Some(("minimum", json!(0))),
            "Negative" => Some(("exclusiveMaximum", json!(0))),
            "NegativeOrZero" => Some(("maximum", json!(0))),
            _ => None,
        }
    }
}

impl RestrictionResolver for ComparisonRestriction {
    fn supports(&self, constraint: &Constraint, metadata: &PropertyMetadata) -> bool {
        Self::keyword(constraint).is_some() && has_builtin(metadata, NUMERIC)
    }

    fn resolve(&self, constraint: &Constraint, _metadata: &PropertyMetadata) -> SchemaFragment {
        Self::keyword(constraint)
            .map(|(keyword, value)| SchemaFragment::from([(keyword.to_string(), value)]))
            .unwrap_or_default()
    }
}

/// `Unique` → `uniqueItems`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueRestriction;

impl RestrictionResolver for UniqueRestriction {
    fn supports(&self, constraint: &Constraint, metadata: &PropertyMetadata) -> bool {
        constraint.name() == "Unique" && is_collection(metadata)
    }

    fn resolve(&self, _constraint: &Constraint, _metadata: &PropertyMetadata) -> SchemaFragment {
        SchemaFragment::from([("uniqueItems".to_string(), json!(true))])
    }
}

/// `AtLeastOneOf` → `oneOf` built from the nested constraints.
///
/// Nested constraints are read from the `constraints` option as a list of
/// `{"name": ..., "options": {...}}` maps and resolved with the wrapped
/// resolvers. Nested constraints producing nothing are skipped.
#[derive(Debug, Clone)]
pub struct AtLeastOneOfRestriction {
    resolvers: Vec<SharedRestrictionResolver>,
}

impl AtLeastOneOfRestriction {
    /// Creates a resolver delegating nested constraints to `resolvers`.
    pub fn new(resolvers: Vec<SharedRestrictionResolver>) -> Self {
        Self { resolvers }
    }

    fn nested(constraint: &Constraint) -> Vec<Constraint> {
        constraint
            .option("constraints")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl RestrictionResolver for AtLeastOneOfRestriction {
    fn supports(&self, constraint: &Constraint, _metadata: &PropertyMetadata) -> bool {
        constraint.name() == "AtLeastOneOf"
    }

    fn resolve(&self, constraint: &Constraint, metadata: &PropertyMetadata) -> SchemaFragment {
        let alternatives: Vec<Value> = Self::nested(constraint)
            .iter()
            .map(|nested| resolve_all(&self.resolvers, nested, metadata))
            .filter(|fragment| !fragment.is_empty())
            .map(|fragment| Value::Object(fragment.into_iter().collect()))
            .collect();

        if alternatives.is_empty() {
            SchemaFragment::new()
        } else {
            SchemaFragment::from([("oneOf".to_string(), Value::Array(alternatives))])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daedalus_core::Type;

    fn typed(builtin: BuiltinType) -> PropertyMetadata {
        PropertyMetadata::new().with_builtin_types(vec![Type::new(builtin)])
    }

    #[test]
    fn test_length() {
        let constraint = Constraint::new("Length").with_option("min", 3).with_option("max", 255);
        let fragment = resolve_all(&default_resolvers(), &constraint, &typed(BuiltinType::String));
        assert_eq!(fragment["minLength"], json!(3));
        assert_eq!(fragment["maxLength"], json!(255));

        let on_int = resolve_all(&default_resolvers(), &constraint, &typed(BuiltinType::Int));
        assert!(on_int.is_empty());
    }

    #[test]
    fn test_strip_delimiters() {
        assert_eq!(strip_delimiters("/^[a-z]+$/i"), "^[a-z]+$");
        assert_eq!(strip_delimiters("#\\d{3}#"), "\\d{3}");
        assert_eq!(strip_delimiters("{abc}"), "abc");
        assert_eq!(strip_delimiters("abc"), "abc");
        assert_eq!(strip_delimiters("/abc#"), "/abc#");
    }

    #[test]
    fn test_schema_pattern_anchoring() {
        assert_eq!(schema_pattern("/^[a-z]+$/"), "^([a-z]+)$");
        assert_eq!(schema_pattern("/foo/"), "^(.*foo.*)$");
        assert_eq!(schema_pattern("/^foo/"), "^(foo.*)$");
    }

    #[test]
    fn test_regex_not_matching_is_skipped() {
        let constraint = Constraint::new("Regex")
            .with_option("pattern", "/\\d/")
            .with_option("match", false);
        assert!(RegexRestriction.resolve(&constraint, &PropertyMetadata::new()).is_empty());
    }

    #[test]
    fn test_format() {
        let metadata = typed(BuiltinType::String);
        let email = resolve_all(&default_resolvers(), &Constraint::new("Email"), &metadata);
        assert_eq!(email["format"], json!("email"));

        let ip = Constraint::new("Ip").with_option("version", "6");
        assert_eq!(resolve_all(&default_resolvers(), &ip, &metadata)["format"], json!("ipv6"));
        assert_eq!(resolve_all(&default_resolvers(), &Constraint::new("Ip"), &metadata)["format"], json!("ipv4"));
        let all = Constraint::new("Ip").with_option("version", "all");
        assert!(resolve_all(&default_resolvers(), &all, &metadata).is_empty());
    }

    #[test]
    fn test_choice() {
        let single = Constraint::new("Choice").with_option("choices", json!(["a", "b"]));
        assert_eq!(ChoiceRestriction.resolve(&single, &PropertyMetadata::new())["enum"], json!(["a", "b"]));

        let multiple = Constraint::new("Choice")
            .with_option("choices", json!(["a", "b"]))
            .with_option("multiple", true)
            .with_option("max", 1);
        let fragment = ChoiceRestriction.resolve(&multiple, &PropertyMetadata::new());
        assert_eq!(fragment["type"], json!("array"));
        assert_eq!(fragment["items"], json!({"enum": ["a", "b"]}));
        assert_eq!(fragment["maxItems"], json!(1));
    }

    #[test]
    fn test_numeric_restrictions() {
        let metadata = typed(BuiltinType::Int);
        let range = Constraint::new("Range").with_option("min", 0).with_option("max", 5);
        let fragment = resolve_all(&default_resolvers(), &range, &metadata);
        assert_eq!(fragment["minimum"], json!(0));
        assert_eq!(fragment["maximum"], json!(5));

        let positive = resolve_all(&default_resolvers(), &Constraint::new("Positive"), &metadata);
        assert_eq!(positive["exclusiveMinimum"], json!(0));

        let less = Constraint::new("LessThan").with_option("value", 10);
        assert_eq!(resolve_all(&default_resolvers(), &less, &metadata)["exclusiveMaximum"], json!(10));
    }

    #[test]
    fn test_collection_restrictions() {
        let metadata = PropertyMetadata::new().with_builtin_types(vec![Type::collection_of(Type::new(BuiltinType::String))]);
        let count = Constraint::new("Count").with_option("min", 1);
        assert_eq!(resolve_all(&default_resolvers(), &count, &metadata)["minItems"], json!(1));
        assert_eq!(
            resolve_all(&default_resolvers(), &Constraint::new("Unique"), &metadata)["uniqueItems"],
            json!(true)
        );
    }

    #[test]
    fn test_at_least_one_of() {
        let constraint = Constraint::new("AtLeastOneOf").with_option(
            "constraints",
            json!([
                {"name": "Length", "options": {"min": 10}},
                {"name": "Email"},
                {"name": "NotBlank"},
            ]),
        );
        let fragment = resolve_all(&default_resolvers(), &constraint, &typed(BuiltinType::String));
        assert_eq!(fragment["oneOf"], json!([{"minLength": 10}, {"format": "email"}]));
    }
}
