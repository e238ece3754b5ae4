//! File-based extractor tests.

use std::fs;

use daedalus_core::MetadataError;
use daedalus_extractor::{ExtractError, ResourceExtractor, XmlExtractor, YamlExtractor};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn yaml_files_are_read_in_order() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("book.yaml");
    let second = dir.path().join("book_by_author.yaml");
    fs::write(&first, "resources:\n  App\\Entity\\Book:\n    shortName: Book\n").unwrap();
    fs::write(
        &second,
        "resources:\n  App\\Entity\\Book:\n    uriTemplate: /authors/{id}/books\n    operations: [GetCollection]\n",
    )
    .unwrap();

    let extractor = YamlExtractor::from_paths(&[&first, &second]).unwrap();
    let books = extractor.resources("App\\Entity\\Book").unwrap();

    assert_eq!(books.len(), 2);
    assert_eq!(books[0].site().source(), first.display().to_string());
    assert_eq!(books[1].site().resource_index(), 1);
    assert_eq!(books[1].attributes()["uri_template"], json!("/authors/{id}/books"));
}

#[test]
fn xml_file_is_read() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("resources.xml");
    fs::write(
        &path,
        r#"<resources><resource class="App\Entity\Book" description="Books &amp; more"/></resources>"#,
    )
    .unwrap();

    let extractor = XmlExtractor::from_paths(&[&path]).unwrap();
    assert_eq!(
        extractor.resources("App\\Entity\\Book").unwrap()[0].attributes()["description"],
        json!("Books & more")
    );
}

#[test]
fn missing_file_is_distinct_from_missing_declaration() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.yaml");

    let err = YamlExtractor::from_paths(&[&missing]).unwrap_err();
    assert!(matches!(err, ExtractError::FileNotFound { .. }));
    assert!(matches!(MetadataError::from(err), MetadataError::Source(_)));

    let empty = dir.path().join("empty.yaml");
    fs::write(&empty, "").unwrap();
    let extractor = YamlExtractor::from_paths(&[&empty]).unwrap();
    assert!(extractor.resources("App\\Entity\\Book").unwrap().is_empty());
}

#[test]
fn unknown_key_in_file_names_the_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.yaml");
    fs::write(&path, "resources:\n  App\\Entity\\Book:\n    itemsPerPage: 3\n").unwrap();

    let err = YamlExtractor::from_paths(&[&path]).unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Unknown property items_per_page on resource declaration"));
    assert!(message.contains("bad.yaml"));
    assert!(matches!(MetadataError::from(err), MetadataError::InvalidDeclaration(_)));
}
