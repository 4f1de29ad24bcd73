//! Index builds from the record store

use crate::common::{articles_mapping, build_index, create_test_services};
use searchbridge::core::services::Services;
use searchbridge::core::error::BridgeError;

#[test]
fn test_build_index_from_database() {
    let env = create_test_services();

    let stats = build_index(&env.services, "articles");
    assert_eq!(stats.index, "articles");
    assert_eq!(stats.documents, 5);

    let metadata = env.services.catalog.get_metadata("articles").unwrap();
    assert_eq!(metadata.documents, 5);
    assert_eq!(metadata.mapping, articles_mapping());
    assert!(metadata.index_size_bytes > 0);
}

#[test]
fn test_rebuild_requires_force() {
    let env = create_test_services();
    build_index(&env.services, "articles");

    let pipeline = env.services.create_pipeline();
    let err = pipeline
        .build_index("articles", &articles_mapping(), false)
        .unwrap_err();
    assert!(matches!(err, BridgeError::IndexAlreadyExists(_)));

    let stats = pipeline
        .build_index("articles", &articles_mapping(), true)
        .unwrap();
    assert_eq!(stats.documents, 5);
}

#[test]
fn test_missing_table_leaves_no_index() {
    let env = create_test_services();
    let mut mapping = articles_mapping();
    mapping.table = "posts".to_string();

    let err = env
        .services
        .create_pipeline()
        .build_index("posts", &mapping, false)
        .unwrap_err();

    assert!(err.is_store_unavailable(), "unexpected error: {err}");
    assert!(!env.services.catalog.index_exists("posts"));
}

#[test]
fn test_list_indexes_after_builds() {
    let env = create_test_services();
    build_index(&env.services, "titles");
    build_index(&env.services, "articles");

    let names: Vec<String> = env
        .services
        .catalog
        .list_indexes()
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(names, vec!["articles", "titles"]);
}

#[test]
fn test_forced_rebuild_with_unreachable_database_keeps_index() {
    let env = create_test_services();
    build_index(&env.services, "articles");

    let mut config = (*env.services.config).clone();
    config.store.database = "/nonexistent/blog.db".into();
    let offline = Services::new(config);

    let err = offline
        .create_pipeline()
        .build_index("articles", &articles_mapping(), true)
        .unwrap_err();
    assert!(err.is_store_unavailable(), "unexpected error: {err}");

    let metadata = env.services.catalog.get_metadata("articles").unwrap();
    assert_eq!(metadata.documents, 5);

    let mut bridge = env.services.bridge().unwrap();
    assert_eq!(bridge.search("rust", None).query().unwrap().total_found, 3);
}
