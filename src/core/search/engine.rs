//! BM25 search backend using Tantivy.
//!
//! Candidates are collected per index with BM25 ranking (bounded by
//! the cutoff), then filtered, merged, sorted, grouped and paged in
//! process so every option behaves the same across indexes.

use crate::core::config::{split_index_selector, DOC_ID_FIELD};
use crate::core::error::{BridgeError, Result};
use crate::core::search::excerpt::{self, ExcerptOptions};
use crate::core::search::options::{
    parse_sort_clause, GroupBy, QueryOptions, RankingMode, SortDir, SortKey,
};
use crate::core::search::query::{prepare_query, PreparedQuery};
use crate::core::search::SearchBackend;
use crate::core::storage::{is_safe_identifier, DocumentIndex, IndexCatalog, IndexMetadata};
use crate::core::types::{AttrValue, DocId, SearchMatch, SearchResultSet};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tantivy::{
    collector::TopDocs,
    query::{AllQuery, Query, QueryParser},
    schema::{Field, Value},
    TantivyDocument,
};

/// Attribute holding the distance from the geo anchor, in meters
pub const GEODIST_ATTR: &str = "@geodist";
/// Attribute holding a match's group key
pub const GROUPBY_ATTR: &str = "@groupby";
/// Attribute holding the number of matches in a group
pub const COUNT_ATTR: &str = "@count";

/// Search backend over the indexes of an [`IndexCatalog`]
pub struct TantivyBackend {
    catalog: Arc<IndexCatalog>,
}

impl TantivyBackend {
    pub fn new(catalog: Arc<IndexCatalog>) -> Self {
        Self { catalog }
    }

    /// Resolve an index selector (`*` means every index)
    fn resolve_indexes(&self, selector: &str) -> Result<Vec<String>> {
        let names = split_index_selector(selector);

        let resolved: Vec<String> = if names.contains(&"*") {
            self.catalog
                .list_indexes()?
                .into_iter()
                .map(|m| m.name)
                .collect()
        } else {
            if let Some(bad) = names.iter().find(|n| !is_safe_identifier(n)) {
                return Err(BridgeError::InvalidQuery(format!("Invalid index name '{bad}'")));
            }
            names.into_iter().map(str::to_string).collect()
        };

        if resolved.is_empty() {
            return Err(BridgeError::InvalidQuery(format!(
                "No index to search for '{selector}'"
            )));
        }

        Ok(resolved)
    }

    /// Collect filtered candidates from one index
    fn search_index(
        &self,
        name: &str,
        text: &str,
        options: &QueryOptions,
    ) -> Result<Vec<SearchMatch>> {
        let metadata: IndexMetadata = self.catalog.get_metadata(name)?;
        let index: DocumentIndex = self.catalog.open_index(name)?;
        let schema = index.schema();
        let mapping = &metadata.mapping;

        let lookup = |field_name: &str| -> Result<Field> {
            schema.get_field(field_name).map_err(|e| {
                BridgeError::SearchFailed(format!("Index '{name}' is missing {field_name}: {e}"))
            })
        };

        let id_field = lookup(DOC_ID_FIELD)?;
        let text_fields = mapping
            .fields
            .iter()
            .map(|f| lookup(f.as_str()))
            .collect::<Result<Vec<Field>>>()?;
        let int_fields = mapping
            .int_attrs
            .iter()
            .map(|a| Ok((a.as_str(), lookup(a.as_str())?)))
            .collect::<Result<Vec<_>>>()?;
        let float_fields = mapping
            .float_attrs
            .iter()
            .map(|a| Ok((a.as_str(), lookup(a.as_str())?)))
            .collect::<Result<Vec<_>>>()?;

        let query: Box<dyn Query> = match prepare_query(text, options.match_mode, &mapping.fields)? {
            PreparedQuery::MatchAll => Box::new(AllQuery),
            PreparedQuery::Parse { text, conjunction } => {
                let mut parser = QueryParser::for_index(index.index(), text_fields);
                if conjunction {
                    parser.set_conjunction_by_default();
                }
                for (field_name, weight) in &options.field_weights {
                    if let Ok(field) = schema.get_field(field_name) {
                        parser.set_field_boost(field, *weight);
                    }
                }
                parser
                    .parse_query(&text)
                    .map_err(|e| BridgeError::InvalidQuery(format!("Failed to parse query: {e}")))?
            }
        };

        let reader = index.reader()?;
        let searcher = reader.searcher();

        // TopDocs preallocates `limit` slots
        let num_docs = searcher.num_docs() as usize;
        let cutoff = match options.limits.cutoff {
            0 => num_docs,
            c => c.min(num_docs),
        };

        let top_docs = searcher
            .search(query.as_ref(), &TopDocs::with_limit(cutoff.max(1)))
            .map_err(|e| BridgeError::SearchFailed(format!("Search failed: {e}")))?;

        let mut matches = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address).map_err(|e| {
                BridgeError::SearchFailed(format!("Failed to retrieve document: {e}"))
            })?;

            let Some(id) = doc.get_first(id_field).and_then(|v| v.as_u64()) else {
                tracing::warn!("Document without id in index '{}'", name);
                continue;
            };

            let mut attrs = BTreeMap::new();
            for (attr, field) in &int_fields {
                if let Some(v) = doc.get_first(*field).and_then(|v| v.as_i64()) {
                    attrs.insert(attr.to_string(), AttrValue::Int(v));
                }
            }
            for (attr, field) in &float_fields {
                if let Some(v) = doc.get_first(*field).and_then(|v| v.as_f64()) {
                    attrs.insert(attr.to_string(), AttrValue::Float(v));
                }
            }

            if let Some(anchor) = &options.geo_anchor {
                if let Some(distance) = anchor.distance_for(&attrs) {
                    attrs.insert(GEODIST_ATTR.to_string(), AttrValue::Float(distance));
                }
            }

            if !options.filters.iter().all(|f| f.accepts(id, &attrs)) {
                continue;
            }

            let weight = match options.ranking_mode {
                RankingMode::Bm25 => score,
                RankingMode::None => 1.0,
            };

            matches.push(SearchMatch { id, weight, attrs });
        }

        Ok(matches)
    }
}

impl SearchBackend for TantivyBackend {
    fn query(&self, text: &str, indexes: &str, options: &QueryOptions) -> Result<SearchResultSet> {
        let start = Instant::now();
        let names = self.resolve_indexes(indexes)?;

        // Same id in several indexes: the later index wins
        let mut merged: HashMap<DocId, SearchMatch> = HashMap::new();
        for name in &names {
            for m in self.search_index(name, text, options)? {
                merged.insert(m.id, m);
            }
        }

        let candidates: Vec<SearchMatch> = merged.into_values().collect();
        let (matches, total, total_found) = arrange_matches(candidates, options)?;

        let time = start.elapsed().as_secs_f64();
        tracing::debug!(
            "Query '{}' on {:?}: {} of {} match(es) in {:.3}s",
            text,
            names,
            matches.len(),
            total_found,
            time
        );

        Ok(SearchResultSet {
            matches,
            total,
            total_found,
            time,
        })
    }

    fn build_excerpts(
        &self,
        docs: &[String],
        index: &str,
        query: &str,
        options: &ExcerptOptions,
    ) -> Result<Vec<String>> {
        if !self.catalog.index_exists(index) {
            return Err(BridgeError::IndexNotFound(index.to_string()));
        }

        Ok(excerpt::build_excerpts(docs, query, options))
    }
}

/// Sort, group, cap and page filtered candidates.
///
/// Returns the page of matches, `total` (matches retrievable by
/// paging) and `total_found` (matches or groups found).
pub fn arrange_matches(
    mut candidates: Vec<SearchMatch>,
    options: &QueryOptions,
) -> Result<(Vec<SearchMatch>, usize, usize)> {
    let keys = options.sort.keys()?;
    sort_matches(&mut candidates, &keys);

    if let Some(group_by) = &options.group_by {
        candidates = group_matches(candidates, group_by)?;
    }

    let total_found = candidates.len();
    let total = total_found.min(options.limits.max_matches);

    let mut page: Vec<SearchMatch> = candidates
        .into_iter()
        .take(total)
        .skip(options.limits.offset)
        .take(options.limits.limit)
        .collect();

    if let Some(select) = &options.select {
        for m in &mut page {
            m.attrs.retain(|attr, _| select.iter().any(|s| s == attr));
        }
    }

    Ok((page, total, total_found))
}

/// Value of a sort key for a match (pseudo-attributes included)
fn sort_value(m: &SearchMatch, attr: &str) -> Option<AttrValue> {
    match attr {
        "@weight" | "@relevance" | "@rank" => Some(AttrValue::Float(m.weight as f64)),
        "@id" => Some(AttrValue::Int(m.id as i64)),
        "@group" => m.attrs.get(GROUPBY_ATTR).cloned(),
        other => m.attrs.get(other).cloned(),
    }
}

fn compare_matches(a: &SearchMatch, b: &SearchMatch, keys: &[SortKey]) -> Ordering {
    for key in keys {
        // Missing values sort as the smallest
        let ord = match (sort_value(a, &key.attr), sort_value(b, &key.attr)) {
            (Some(x), Some(y)) => x.sort_cmp(&y),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let ord = match key.dir {
            SortDir::Asc => ord,
            SortDir::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.id.cmp(&b.id)
}

fn sort_matches(matches: &mut [SearchMatch], keys: &[SortKey]) {
    matches.sort_by(|a, b| compare_matches(a, b, keys));
}

/// Keep the best match per group (input must already be sorted)
fn group_matches(matches: Vec<SearchMatch>, group_by: &GroupBy) -> Result<Vec<SearchMatch>> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<SearchMatch> = Vec::new();

    for mut m in matches {
        let Some(key) = m
            .attrs
            .get(&group_by.attr)
            .and_then(|value| group_by.func.key(value))
        else {
            continue;
        };

        match positions.get(&key.to_string()) {
            Some(&pos) => {
                if let Some(AttrValue::Int(count)) = groups[pos].attrs.get_mut(COUNT_ATTR) {
                    *count += 1;
                }
            }
            None => {
                positions.insert(key.to_string(), groups.len());
                m.attrs.insert(GROUPBY_ATTR.to_string(), key);
                m.attrs.insert(COUNT_ATTR.to_string(), AttrValue::Int(1));
                groups.push(m);
            }
        }
    }

    let group_keys = parse_sort_clause(&group_by.group_sort)?;
    sort_matches(&mut groups, &group_keys);

    Ok(groups)
}
