//! Tests for the index CLI command

use crate::common::{build_index, create_test_services};
use searchbridge::cli::commands::index::{execute, IndexArgs};
use searchbridge::cli::OutputFormat;

fn args(names: &[&str], all: bool, force: bool) -> IndexArgs {
    IndexArgs {
        names: names.iter().map(|n| n.to_string()).collect(),
        all,
        force,
        quiet: true,
    }
}

#[tokio::test]
async fn test_index_named() {
    let env = create_test_services();

    let result = execute(args(&["articles"], false, false), &env.services, OutputFormat::Human).await;
    assert!(result.is_ok(), "Index should succeed: {:?}", result.err());
    assert!(env.services.catalog.index_exists("articles"));
    assert!(!env.services.catalog.index_exists("titles"));
}

#[tokio::test]
async fn test_index_all_json() {
    let env = create_test_services();

    let result = execute(args(&[], true, false), &env.services, OutputFormat::Json).await;
    assert!(result.is_ok(), "Index should succeed: {:?}", result.err());
    assert!(env.services.catalog.index_exists("articles"));
    assert!(env.services.catalog.index_exists("titles"));
}

#[tokio::test]
async fn test_index_unknown_name() {
    let env = create_test_services();

    let err = execute(args(&["posts"], false, false), &env.services, OutputFormat::Human)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not configured"));
}

#[tokio::test]
async fn test_index_existing_suggests_force() {
    let env = create_test_services();
    build_index(&env.services, "articles");

    let err = execute(args(&["articles"], false, false), &env.services, OutputFormat::Human)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("--force"));

    let result = execute(args(&["articles"], false, true), &env.services, OutputFormat::Human).await;
    assert!(result.is_ok());
}
