//! Record store and index catalog against real files

use crate::common::{articles_mapping, build_index, create_test_services, ids_of};
use searchbridge::core::storage::{RecordStore, SqliteStore};
use serde_json::json;

#[test]
fn test_fetch_by_ids_returns_store_order() {
    let env = create_test_services();
    let store = SqliteStore::open(&env.db.path);

    let records = store
        .fetch_by_ids(&articles_mapping(), &[4, 1, 2], &[])
        .unwrap();
    assert_eq!(ids_of(&records), vec![1, 2, 4]);
    assert_eq!(records[0].get("title"), Some(&json!("Rust ownership explained")));
    assert_eq!(records[0].get("rating"), Some(&json!(4.5)));
}

#[test]
fn test_fetch_attaches_relations() {
    let env = create_test_services();
    let store = SqliteStore::open(&env.db.path);
    let relations = vec!["author".to_string(), "comments".to_string()];

    let records = store
        .fetch_by_ids(&articles_mapping(), &[1, 3], &relations)
        .unwrap();

    assert_eq!(records[0].get("author"), Some(&json!({"id": 1, "name": "Ada"})));
    let comments = records[0].get("comments").and_then(|c| c.as_array()).unwrap();
    assert_eq!(comments.len(), 2);

    assert_eq!(records[1].get("author"), Some(&json!({"id": 3, "name": "Linus"})));
    assert_eq!(records[1].get("comments"), Some(&json!([])));
}

#[test]
fn test_missing_database_is_store_unavailable() {
    let env = create_test_services();
    let store = SqliteStore::open(env.index_dir.path().join("missing.db"));

    let err = store
        .fetch_by_ids(&articles_mapping(), &[1], &[])
        .unwrap_err();
    assert!(err.is_store_unavailable());
}

#[test]
fn test_delete_index() {
    let env = create_test_services();
    build_index(&env.services, "articles");

    env.services.catalog.delete_index("articles").unwrap();
    assert!(!env.services.catalog.index_exists("articles"));
    assert!(env.services.catalog.get_metadata("articles").unwrap_err().is_not_found());
}
