//! URI templates and operation names.

use convert_case::{Case, Casing};
use daedalus_config::PathSegmentStrategy;
use http::Method;

/// Suffix appended to generated URI templates.
pub const FORMAT_SUFFIX: &str = "{._format}";

/// Placeholder for the item identifier in generated URI templates.
pub const IDENTIFIER_PLACEHOLDER: &str = "{id}";

const IRREGULAR_PLURALS: &[(&str, &str)] = &[("person", "people"), ("child", "children"), ("datum", "data")];

/// Pluralises an English word, lowercase.
///
/// ```
/// use daedalus_metadata::resource::naming::pluralize;
///
/// assert_eq!(pluralize("book"), "books");
/// assert_eq!(pluralize("dummy"), "dummies");
/// assert_eq!(pluralize("address"), "addresses");
/// assert_eq!(pluralize("person"), "people");
/// ```
pub fn pluralize(word: &str) -> String {
    if let Some((singular, plural)) = IRREGULAR_PLURALS.iter().find(|(singular, _)| word.ends_with(singular)) {
        return format!("{}{plural}", &word[..word.len() - singular.len()]);
    }

    if let Some(stem) = word.strip_suffix('y') {
        if !stem.is_empty() && !stem.ends_with(&['a', 'e', 'i', 'o', 'u'][..]) {
            return format!("{stem}ies");
        }
    }

    if ["s", "x", "z", "ch", "sh"].iter().any(|end| word.ends_with(end)) {
        return format!("{word}es");
    }

    format!("{word}s")
}

/// Returns the URI path segment for a short name.
///
/// ```
/// use daedalus_config::PathSegmentStrategy;
/// use daedalus_metadata::resource::naming::path_segment;
///
/// assert_eq!(path_segment("BookReview", PathSegmentStrategy::Underscore), "book_reviews");
/// assert_eq!(path_segment("BookReview", PathSegmentStrategy::Dash), "book-reviews");
/// ```
pub fn path_segment(short_name: &str, strategy: PathSegmentStrategy) -> String {
    let case = match strategy {
        PathSegmentStrategy::Underscore => Case::Snake,
        PathSegmentStrategy::Dash => Case::Kebab,
    };
    pluralize(&short_name.to_case(case))
}

/// Builds a default URI template.
///
/// `suffix` is an extra path segment after the identifier, used for custom
/// operations (`/books/{id}/publish`).
pub fn uri_template(
    route_prefix: Option<&str>,
    segment: &str,
    item: bool,
    suffix: Option<&str>,
    format_suffix: bool,
) -> String {
    let mut template = String::new();
    if let Some(prefix) = route_prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        template.push('/');
        template.push_str(prefix);
    }
    template.push('/');
    template.push_str(segment);
    if item {
        template.push('/');
        template.push_str(IDENTIFIER_PLACEHOLDER);
    }
    if let Some(suffix) = suffix {
        template.push('/');
        template.push_str(suffix);
    }
    if format_suffix {
        template.push_str(FORMAT_SUFFIX);
    }
    template
}

/// Builds a generated operation name.
///
/// `template` is the declared URI template or, without one, the short name.
///
/// ```
/// use daedalus_metadata::resource::naming::operation_name;
/// use http::Method;
///
/// assert_eq!(operation_name("Book", &Method::GET, &["collection"]), "_api_Book_get_collection");
/// assert_eq!(operation_name("/books/{id}/publish", &Method::PUT, &[]), "_api_/books/{id}/publish_put");
/// ```
pub fn operation_name(template: &str, method: &Method, suffixes: &[&str]) -> String {
    let mut name = format!("_api_{template}_{}", method.as_str().to_ascii_lowercase());
    for suffix in suffixes {
        name.push('_');
        name.push_str(suffix);
    }
    name
}
