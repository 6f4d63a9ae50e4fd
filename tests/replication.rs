//! Replication convergence and crash-safety behavior of the file store.

use std::fs;

use serde_json::{json, Value};
use tempfile::TempDir;

use thontrangliennhat_api::{Document, DocumentStore, FileDocumentStore, Replicator, StorageLocator};

fn doc(value: Value) -> Document {
    serde_json::from_value(value).unwrap()
}

#[test]
fn save_creates_missing_replica_directories_and_converges() {
    let dir = TempDir::new().unwrap();
    let paths = vec![
        dir.path().join("database.json"),
        dir.path().join("public").join("nested").join("database.json"),
        dir.path().join("api").join("database.json"),
    ];

    let replicator = Replicator::new(paths.clone());
    let mut document = doc(json!({ "products": [{ "id": 1 }] }));
    let written = replicator.save(&mut document).unwrap();
    assert_eq!(written, paths.len());

    let contents: Vec<String> = paths
        .iter()
        .map(|p| fs::read_to_string(p).unwrap())
        .collect();
    assert!(contents.windows(2).all(|pair| pair[0] == pair[1]));

    for text in &contents {
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["syncInfo"]["lastSync"], parsed["_lastSync"]);
    }
}

#[test]
fn newest_replica_wins_regardless_of_order() {
    let dir = TempDir::new().unwrap();
    let stale = dir.path().join("database.json");
    let fresh = dir.path().join("public").join("database.json");
    fs::create_dir_all(fresh.parent().unwrap()).unwrap();

    fs::write(
        &stale,
        json!({
            "products": [{ "id": 1, "name": "stale" }],
            "syncInfo": { "lastSync": "2024-01-01T00:00:00.000Z" }
        })
        .to_string(),
    )
    .unwrap();
    fs::write(
        &fresh,
        json!({
            "products": [{ "id": 1, "name": "fresh" }],
            "syncInfo": { "lastSync": "2025-02-01T00:00:00.000Z" }
        })
        .to_string(),
    )
    .unwrap();

    // The stale copy is listed first (it would win on order alone).
    let locator = StorageLocator::new(vec![stale, fresh.clone()]);
    let located = locator.locate_newest().unwrap();
    assert_eq!(located.path, fresh);
    assert_eq!(located.document.collection("products")[0]["name"], json!("fresh"));
}

#[test]
fn a_save_heals_stale_replicas() {
    let dir = TempDir::new().unwrap();
    let primary = dir.path().join("database.json");
    let replica = dir.path().join("public").join("database.json");
    fs::create_dir_all(replica.parent().unwrap()).unwrap();

    fs::write(
        &primary,
        json!({
            "products": [],
            "syncInfo": { "lastSync": "2024-01-01T00:00:00.000Z" }
        })
        .to_string(),
    )
    .unwrap();
    fs::write(
        &replica,
        json!({
            "products": [{ "id": 7, "name": "only-here" }],
            "syncInfo": { "lastSync": "2025-01-01T00:00:00.000Z" }
        })
        .to_string(),
    )
    .unwrap();

    // Load picks the fresher replica; save then rewrites both copies.
    let store = FileDocumentStore::new(vec![primary.clone(), replica.clone()]);
    let mut document = store.load().unwrap();
    store.save(&mut document).unwrap();

    let healed: Value =
        serde_json::from_str(&fs::read_to_string(&primary).unwrap()).unwrap();
    assert_eq!(healed["products"][0]["name"], json!("only-here"));
    assert_eq!(
        fs::read_to_string(&primary).unwrap(),
        fs::read_to_string(&replica).unwrap()
    );
}

#[test]
fn backup_preserves_the_previous_primary_state() {
    let dir = TempDir::new().unwrap();
    let primary = dir.path().join("database.json");
    fs::write(
        &primary,
        json!({ "products": [{ "id": 1, "name": "before" }] }).to_string(),
    )
    .unwrap();

    let replicator = Replicator::new(vec![primary.clone()]);
    let mut document = doc(json!({ "products": [{ "id": 1, "name": "after" }] }));
    replicator.save(&mut document).unwrap();

    let backup: Value = serde_json::from_str(
        &fs::read_to_string(dir.path().join("database.json.backup")).unwrap(),
    )
    .unwrap();
    assert_eq!(backup["products"][0]["name"], json!("before"));
}

#[test]
fn every_replica_is_standalone_valid_json() {
    let dir = TempDir::new().unwrap();
    let paths = vec![
        dir.path().join("database.json"),
        dir.path().join("api").join("database.json"),
    ];
    let replicator = Replicator::new(paths.clone());
    let mut document = doc(json!({
        "products": [{ "id": 1, "name": "Ổi lê", "images": ["/images/uploads/oi.jpg"] }],
        "navigation": [{ "id": 1, "title": "Trang chủ", "slug": "trang-chu", "children": [] }]
    }));
    replicator.save(&mut document).unwrap();

    for path in paths {
        let standalone: Document =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(standalone.collection("products").len(), 1);
        assert!(standalone.last_sync().is_some());
    }
}
