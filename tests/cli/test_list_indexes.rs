//! Tests for the list-indexes CLI command

use crate::common::{build_index, create_test_services};
use searchbridge::cli::commands::list_indexes::{collect, execute, ListIndexesArgs};
use searchbridge::cli::OutputFormat;

#[tokio::test]
async fn test_list_indexes_marks_unbuilt() {
    let env = create_test_services();
    build_index(&env.services, "articles");

    let response = collect(&env.services).unwrap();
    assert_eq!(response.count, 2);

    let articles = &response.indexes[0];
    assert_eq!(articles.name, "articles");
    assert!(articles.built);
    assert_eq!(articles.documents, 5);

    let titles = &response.indexes[1];
    assert_eq!(titles.name, "titles");
    assert!(!titles.built);
    assert!(titles.indexed_at.is_none());
}

#[tokio::test]
async fn test_list_indexes_outputs() {
    let env = create_test_services();
    build_index(&env.services, "titles");

    assert!(execute(ListIndexesArgs {}, &env.services, OutputFormat::Human)
        .await
        .is_ok());
    assert!(execute(ListIndexesArgs {}, &env.services, OutputFormat::Json)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_list_indexes_flags_stale_mapping() {
    let env = create_test_services();
    build_index(&env.services, "articles");

    let mut config = (*env.services.config).clone();
    if let Some(mapping) = config.indexes.get_mut("articles") {
        mapping.fields.push("summary".to_string());
    }
    let services = searchbridge::core::services::Services::new(config);

    let response = collect(&services).unwrap();
    let articles = response.indexes.iter().find(|i| i.name == "articles").unwrap();
    assert!(articles.stale);

    let response = collect(&env.services).unwrap();
    assert!(response.indexes.iter().all(|i| !i.stale));
}
