use std::fs;

use catalog_core::{CatalogQuery, CatalogStore, Entry, FileBackend, SortKey, StorageBackend};
use tempfile::TempDir;

fn names(entries: &[Entry]) -> Vec<String> {
    entries.iter().map(|entry| entry.name.clone()).collect()
}

fn seed(dir: &TempDir) -> FileBackend {
    let backend = FileBackend::new(dir.path().join("sites.json"));
    backend
        .store(&[
            Entry::new("Alpha").with_category("tools").with_tags(["ai", "chat"]),
            Entry::new("Beta").with_category("tools").with_tags(["search"]),
            Entry::new("Gamma").with_category("media").with_tags(["image"]),
        ])
        .expect("seed catalog");
    backend
}

#[test]
fn example_scenario_against_a_file() {
    let temp_dir = TempDir::new().expect("temporary directory");
    let store = CatalogStore::open(seed(&temp_dir));

    let found = store
        .query(&CatalogQuery::from_params("al", "", ""))
        .expect("text query");
    assert_eq!(names(&found), vec!["Alpha"]);

    let tools = store
        .query(&CatalogQuery::from_params("", "tools", "name"))
        .expect("category query");
    assert_eq!(names(&tools), vec!["Alpha", "Beta"]);

    assert!(store.delete("Beta").expect("delete beta").is_persisted());
    let remaining = store.query(&CatalogQuery::new()).expect("query all");
    assert_eq!(names(&remaining), vec!["Alpha", "Gamma"]);

    store.load().expect("reload from file");
    let reloaded = store.query(&CatalogQuery::new()).expect("query after reload");
    assert_eq!(names(&reloaded), vec!["Alpha", "Gamma"]);
}

#[test]
fn persisted_catalog_round_trips_field_by_field() {
    let temp_dir = TempDir::new().expect("temporary directory");
    let path = temp_dir.path().join("sites.json");
    let store = CatalogStore::new(FileBackend::new(&path));

    let mut featured = Entry::new("Delta")
        .with_description("Video generation")
        .with_category("media")
        .with_tags(["video", "ai"]);
    featured.url = "https://delta.example".into();
    featured.logo = "/static/logos/delta.png".into();
    featured.rating = 4.25;
    featured.visits = 310;
    featured.featured = true;
    featured.created_at = Some("2024-05-01T08:00:00Z".into());

    store.insert(Entry::new("Alpha")).expect("insert alpha");
    store.insert(featured).expect("insert delta");
    let written = store.snapshot().expect("snapshot");

    let reopened = CatalogStore::open(FileBackend::new(&path));
    assert_eq!(*reopened.snapshot().expect("reopened snapshot"), *written);
}

#[test]
fn legacy_wrapped_documents_load() {
    let temp_dir = TempDir::new().expect("temporary directory");
    let path = temp_dir.path().join("ai.json");
    fs::write(
        &path,
        r#"{"sites":[{"name":"Alpha","tags":null},{"name":"Beta","category":"tools"}]}"#,
    )
    .expect("write legacy file");

    let store = CatalogStore::open(FileBackend::new(&path));
    let categories: Vec<_> = store
        .unique_categories()
        .expect("categories")
        .into_iter()
        .collect();
    assert_eq!(categories, vec!["tools"]);

    // The first mutation rewrites the file in the current layout.
    store.insert(Entry::new("Gamma")).expect("insert gamma");
    let raw = fs::read_to_string(&path).expect("read rewritten file");
    assert!(raw.trim_start().starts_with('['));
}

#[test]
fn missing_file_starts_empty_and_first_insert_creates_it() {
    let temp_dir = TempDir::new().expect("temporary directory");
    let path = temp_dir.path().join("data").join("sites.json");

    let store = CatalogStore::open(FileBackend::new(&path));
    assert!(store.is_empty().expect("is_empty"));

    store.insert(Entry::new("Alpha")).expect("insert alpha");
    assert!(path.exists());

    let sorted = store
        .query(&CatalogQuery::new().sort(SortKey::Popularity))
        .expect("query");
    assert_eq!(names(&sorted), vec!["Alpha"]);
}

#[test]
fn corrupt_file_on_reload_keeps_serving_previous_state() {
    let temp_dir = TempDir::new().expect("temporary directory");
    let backend = seed(&temp_dir);
    let path = backend.path().to_path_buf();
    let store = CatalogStore::open(backend);

    fs::write(&path, "[{\"name\": \"Alpha\",").expect("corrupt file");
    assert!(store.load().is_err());

    assert_eq!(store.len().expect("len"), 3);
}
