//! Tests for the excerpts CLI command

use crate::common::{build_index, create_test_services};
use searchbridge::cli::commands::excerpts::{execute, ExcerptsArgs};
use searchbridge::cli::OutputFormat;
use std::path::PathBuf;

fn args(query: &str, files: Vec<PathBuf>) -> ExcerptsArgs {
    ExcerptsArgs {
        query: query.to_string(),
        files,
        index: None,
        limit: Some(64),
        around: None,
        before_match: Some("[".to_string()),
        after_match: Some("]".to_string()),
        strip_html: true,
    }
}

#[tokio::test]
async fn test_excerpts_from_files() {
    let env = create_test_services();
    build_index(&env.services, "articles");

    let doc = env.index_dir.path().join("doc.html");
    std::fs::write(&doc, "<p>Learning rust one borrow at a time</p>").unwrap();

    let result = execute(args("rust", vec![doc]), &env.services, OutputFormat::Json).await;
    assert!(result.is_ok(), "Excerpts should succeed: {:?}", result.err());
}

#[tokio::test]
async fn test_excerpts_missing_file() {
    let env = create_test_services();
    build_index(&env.services, "articles");

    let missing = env.index_dir.path().join("missing.txt");
    let err = execute(args("rust", vec![missing]), &env.services, OutputFormat::Human)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Cannot read"));
}

#[tokio::test]
async fn test_excerpts_index_not_built() {
    let env = create_test_services();

    let doc = env.index_dir.path().join("doc.txt");
    std::fs::write(&doc, "rust").unwrap();

    let result = execute(args("rust", vec![doc]), &env.services, OutputFormat::Human).await;
    assert!(result.is_err());
}
