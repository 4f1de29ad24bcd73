//! Tests for the search CLI command

use crate::common::{build_index, create_test_services};
use searchbridge::cli::commands::search::{execute, SearchArgs, ValuesFilterArg};
use searchbridge::cli::OutputFormat;
use searchbridge::core::search::options::{GroupFunc, MatchMode};

fn args(query: &str) -> SearchArgs {
    SearchArgs {
        query: query.to_string(),
        index: None,
        mode: None,
        ranking: None,
        sort: None,
        sort_by: None,
        weights: vec![],
        filter: vec![],
        exclude_filter: vec![],
        range: vec![],
        float_range: vec![],
        geo_anchor: None,
        group_by: None,
        group_func: GroupFunc::Attr,
        group_sort: None,
        select: None,
        limit: None,
        offset: 0,
        max_matches: None,
        cutoff: None,
        with: vec![],
        ordered: false,
        raw: false,
    }
}

#[tokio::test]
async fn test_search_records_human() {
    let env = create_test_services();
    build_index(&env.services, "articles");

    let mut args = args("rust");
    args.ordered = true;
    args.with = vec!["author".to_string()];

    let result = execute(args, &env.services, OutputFormat::Human).await;
    assert!(result.is_ok(), "Search should succeed: {:?}", result.err());
}

#[tokio::test]
async fn test_search_raw_json() {
    let env = create_test_services();
    build_index(&env.services, "articles");

    let mut args = args("rust");
    args.raw = true;
    args.filter = vec![ValuesFilterArg {
        attr: "author_id".to_string(),
        values: vec![1],
    }];
    args.group_by = Some("author_id".to_string());

    let result = execute(args, &env.services, OutputFormat::Json).await;
    assert!(result.is_ok(), "Search should succeed: {:?}", result.err());
}

#[tokio::test]
async fn test_search_empty_results() {
    let env = create_test_services();
    build_index(&env.services, "articles");

    let mut args = args("haskell");
    args.mode = Some(MatchMode::All);

    let result = execute(args, &env.services, OutputFormat::Human).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_search_index_not_built() {
    let env = create_test_services();

    let result = execute(args("rust"), &env.services, OutputFormat::Human).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_search_invalid_sort() {
    let env = create_test_services();
    build_index(&env.services, "articles");

    let mut args = args("rust");
    args.sort = Some("attr_desc".to_string());

    let err = execute(args, &env.services, OutputFormat::Human)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("sort-by"));
}
