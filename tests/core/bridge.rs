//! Search bridge end to end: backend query, bulk fetch, reconciliation

use crate::common::{build_index, create_test_services, create_test_services_with, ids_of, TestEnv};
use searchbridge::core::search::options::{GroupFunc, MatchMode, RankingMode, SortMode};
use searchbridge::core::search::{COUNT_ATTR, GROUPBY_ATTR};
use searchbridge::core::types::AttrValue;
use serde_json::json;

fn indexed() -> TestEnv {
    let env = create_test_services();
    build_index(&env.services, "articles");
    env
}

#[test]
fn test_get_returns_store_order_by_default() {
    let env = indexed();
    let mut bridge = env.services.bridge().unwrap();

    let records = bridge.search("rust", None).get(false).unwrap();
    assert_eq!(ids_of(&records), vec![1, 2, 4]);
    assert_eq!(bridge.total_count(), 3);
    assert!(bridge.last_error().is_none());
}

#[test]
fn test_get_preserves_relevance_order() {
    let env = indexed();
    let mut bridge = env.services.bridge().unwrap();
    bridge.search("rust", Some("articles"));

    let ranked = bridge.query().unwrap().ids();
    let records = bridge.get(true).unwrap();
    assert_eq!(ids_of(&records), ranked);
}

#[test]
fn test_preserve_order_follows_attribute_sort() {
    let env = indexed();
    let mut bridge = env.services.bridge().unwrap();
    bridge
        .search("rust", None)
        .set_sort_mode(SortMode::AttrDesc("views".to_string()));

    assert_eq!(ids_of(&bridge.get(true).unwrap()), vec![4, 2, 1]);
    assert_eq!(ids_of(&bridge.get(false).unwrap()), vec![1, 2, 4]);
}

#[test]
fn test_no_matches_skips_the_store() {
    // The database path is bogus: any fetch would fail
    let env = create_test_services_with(|config| {
        config.store.database = "/nonexistent/blog.db".into();
    });
    build_index_from(&env);

    let mut bridge = env.services.bridge().unwrap();
    let records = bridge.search("haskell", None).get(true).unwrap();
    assert!(records.is_empty());
    assert_eq!(bridge.total_count(), 0);
}

/// Build through a second service set that can reach the real database
fn build_index_from(env: &TestEnv) {
    let db_path = env.db.path.clone();
    let index_dir = env.index_dir.path().to_path_buf();
    let mut config = (*env.services.config).clone();
    config.store.database = db_path;
    config.backend.index_dir = index_dir;
    let builder = searchbridge::core::services::Services::new(config);
    build_index(&builder, "articles");
}

#[test]
fn test_store_failure_surfaces_after_search() {
    let env = create_test_services_with(|config| {
        config.store.database = "/nonexistent/blog.db".into();
    });
    build_index_from(&env);

    let mut bridge = env.services.bridge().unwrap();
    let err = bridge.search("rust", None).get(true).unwrap_err();
    assert!(err.is_store_unavailable());
    assert!(bridge.last_error().is_some());
}

#[test]
fn test_filters_and_ranges() {
    let env = indexed();
    let mut bridge = env.services.bridge().unwrap();

    let records = bridge
        .search("rust", None)
        .filter("author_id", &[1], false)
        .get(false)
        .unwrap();
    assert_eq!(ids_of(&records), vec![1, 4]);

    let records = bridge
        .search("rust", None)
        .filter("author_id", &[2], true)
        .get(false)
        .unwrap();
    assert_eq!(ids_of(&records), vec![1, 4]);

    let records = bridge
        .search("rust", None)
        .range("views", 100, 260, false)
        .get(false)
        .unwrap();
    assert_eq!(ids_of(&records), vec![1, 2]);

    let records = bridge
        .search("rust", None)
        .set_filter_float_range("rating", 4.4, 5.0, false)
        .get(false)
        .unwrap();
    assert_eq!(ids_of(&records), vec![1, 2]);
}

#[test]
fn test_search_resets_filters() {
    let env = indexed();
    let mut bridge = env.services.bridge().unwrap();

    bridge.search("rust", None).filter("author_id", &[2], false);
    assert_eq!(ids_of(&bridge.get(false).unwrap()), vec![2]);

    let records = bridge.search("rust", None).get(false).unwrap();
    assert_eq!(ids_of(&records), vec![1, 2, 4]);
}

#[test]
fn test_match_modes() {
    let env = indexed();
    let mut bridge = env.services.bridge().unwrap();

    bridge.search("rust tokio", None).set_match_mode(MatchMode::All);
    assert_eq!(ids_of(&bridge.get(false).unwrap()), vec![2]);

    bridge.search("python sqlite", None).set_match_mode(MatchMode::Any);
    assert_eq!(ids_of(&bridge.get(false).unwrap()), vec![3, 5]);

    bridge.search("rust macros", None).set_match_mode(MatchMode::Phrase);
    assert_eq!(ids_of(&bridge.get(false).unwrap()), vec![4]);

    bridge.search("", None).set_match_mode(MatchMode::FullScan);
    assert_eq!(ids_of(&bridge.get(false).unwrap()), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_ranking_none_weighs_every_match_equally() {
    let env = indexed();
    let mut bridge = env.services.bridge().unwrap();
    bridge
        .search("rust", None)
        .set_ranking_mode(RankingMode::None);

    let result = bridge.query().unwrap();
    assert!(result.matches.iter().all(|m| m.weight == 1.0));
    // Equal weights fall back to id order
    assert_eq!(result.ids(), vec![1, 2, 4]);
}

#[test]
fn test_limit_and_offset_page_the_matches() {
    let env = indexed();
    let mut bridge = env.services.bridge().unwrap();
    bridge
        .search("rust", None)
        .set_sort_mode(SortMode::AttrAsc("views".to_string()))
        .limit(1, 1, 1000, 1000);

    let records = bridge.get(true).unwrap();
    assert_eq!(ids_of(&records), vec![2]);
    assert_eq!(bridge.total_count(), 3);
}

#[test]
fn test_group_by_author() {
    let env = indexed();
    let mut bridge = env.services.bridge().unwrap();
    bridge
        .search("rust", None)
        .set_group_by("author_id", GroupFunc::Attr, None);

    let result = bridge.query().unwrap();
    assert_eq!(result.total_found, 2);

    let groups: Vec<(Option<&AttrValue>, Option<&AttrValue>)> = result
        .matches
        .iter()
        .map(|m| (m.attrs.get(GROUPBY_ATTR), m.attrs.get(COUNT_ATTR)))
        .collect();
    assert_eq!(
        groups,
        vec![
            (Some(&AttrValue::Int(2)), Some(&AttrValue::Int(1))),
            (Some(&AttrValue::Int(1)), Some(&AttrValue::Int(2))),
        ]
    );
}

#[test]
fn test_select_limits_returned_attributes() {
    let env = indexed();
    let mut bridge = env.services.bridge().unwrap();
    bridge.search("rust", None).set_select("views");

    let result = bridge.query().unwrap();
    for m in &result.matches {
        assert_eq!(m.attrs.keys().collect::<Vec<_>>(), vec!["views"]);
    }
}

#[test]
fn test_eager_loads_are_consumed() {
    let env = indexed();
    let mut bridge = env.services.bridge().unwrap();

    let records = bridge
        .search("ownership", None)
        .with(["author", "comments"])
        .get(true)
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("author"), Some(&json!({"id": 1, "name": "Ada"})));
    assert_eq!(
        records[0].get("comments").and_then(|c| c.as_array()).map(Vec::len),
        Some(2)
    );
    assert!(bridge.eager_loads().is_empty());

    let records = bridge.search("ownership", None).get(true).unwrap();
    assert!(records[0].get("author").is_none());
}

#[test]
fn test_unknown_relation_is_configuration_error() {
    let env = indexed();
    let mut bridge = env.services.bridge().unwrap();

    let err = bridge
        .search("rust", None)
        .with(["publisher"])
        .get(true)
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_multi_index_search_needs_global_mapping() {
    let env = create_test_services();
    build_index(&env.services, "articles");
    build_index(&env.services, "titles");

    let mut bridge = env.services.bridge().unwrap();
    let err = bridge
        .search("tokio", Some("articles,titles"))
        .get(true)
        .unwrap_err();
    assert!(err.is_configuration());

    let env = create_test_services_with(|config| {
        config.mapping = config.indexes.get("articles").cloned();
    });
    build_index(&env.services, "articles");
    build_index(&env.services, "titles");

    let mut bridge = env.services.bridge().unwrap();
    let records = bridge
        .search("tokio", Some("articles, titles"))
        .get(true)
        .unwrap();
    assert_eq!(ids_of(&records), vec![2]);

    let records = bridge.search("rust", Some("*")).get(false).unwrap();
    assert_eq!(ids_of(&records), vec![1, 2, 4]);
}

#[test]
fn test_missing_index_is_not_found() {
    let env = create_test_services();
    let mut bridge = env.services.bridge().unwrap();

    let err = bridge.search("rust", None).get(true).unwrap_err();
    assert!(err.is_not_found());
    assert!(bridge.last_error().is_some());
}

#[test]
fn test_overlong_query_rejected() {
    let env = indexed();
    let mut bridge = env.services.bridge().unwrap();

    let query = "rust ".repeat(200);
    let err = bridge.search(&query, None).get(true).unwrap_err();
    assert!(err.is_bad_request());
}

#[test]
fn test_excerpts_and_snippets() {
    let env = indexed();
    let mut bridge = env.services.bridge().unwrap();
    bridge.search("rust", Some("articles"));

    let excerpt = bridge.excerpt("I like rust a lot", None).unwrap();
    assert!(excerpt.contains("<b>rust</b>"), "excerpt: {excerpt}");

    let snippets = bridge
        .snippets(
            &["<p>Writing rust daily</p>".to_string()],
            "articles",
            "rust",
            None,
        )
        .unwrap();
    assert!(snippets[0].contains("<b>rust</b>"));
    assert!(!snippets[0].contains("<p>"));

    assert!(bridge
        .snippets(&["rust".to_string()], "missing", "rust", None)
        .unwrap_err()
        .is_not_found());
}

#[test]
fn test_escape_string() {
    let env = create_test_services();
    let bridge = env.services.bridge().unwrap();
    assert_eq!(bridge.escape_string("a-b (c)"), r"a\-b \(c\)");
    assert_eq!(bridge.escape_string("plain words"), "plain words");
}

#[test]
fn test_huge_cutoff_is_clamped_to_index_size() {
    let env = indexed();
    let mut bridge = env.services.bridge().unwrap();

    let results = bridge
        .search("rust", None)
        .limit(20, 0, 1000, usize::MAX)
        .query()
        .unwrap();
    assert_eq!(results.total_found, 3);

    let results = bridge
        .search("rust", None)
        .limit(20, 0, 1000, 1)
        .query()
        .unwrap();
    assert_eq!(results.total_found, 1);
}

#[test]
fn test_index_selector_must_be_identifiers() {
    let env = indexed();
    let mut bridge = env.services.bridge().unwrap();

    for selector in ["../articles", "articles, ../../etc", "a/b"] {
        let err = bridge.search("rust", Some(selector)).query().unwrap_err();
        assert!(err.is_bad_request(), "{selector}: {err}");
    }
}
