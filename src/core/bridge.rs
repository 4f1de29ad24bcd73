//! Search bridge facade.
//!
//! Holds the state of one search conversation (query text, index
//! selector, builder options, pending eager loads) and turns backend
//! matches into store records with [`reconcile`].
//!
//! ```no_run
//! # use searchbridge::core::{Config, Services};
//! # fn main() -> searchbridge::core::Result<()> {
//! let services = Services::new(Config::load()?);
//! let mut bridge = services.bridge()?;
//! let articles = bridge
//!     .search("rust async", Some("articles"))
//!     .filter("author_id", &[1, 2], false)
//!     .with(["author"])
//!     .get(true)?;
//! println!("{} of {} found", articles.len(), bridge.total_count());
//! # Ok(())
//! # }
//! ```

use crate::core::config::Config;
use crate::core::error::{BridgeError, Result};
use crate::core::reconcile::reconcile;
use crate::core::search::options::{
    parse_select, Filter, GeoAnchor, GroupBy, GroupFunc, Limits, MatchMode, QueryOptions,
    RankingMode, SortMode, DEFAULT_GROUP_SORT,
};
use crate::core::search::{escape_string, ExcerptOptions, SearchBackend};
use crate::core::storage::RecordStore;
use crate::core::types::{Record, SearchResultSet};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Search facade over a backend and a record store
pub struct SearchBridge<B: ?Sized, S: ?Sized> {
    backend: Arc<B>,
    store: Arc<S>,
    config: Arc<Config>,

    query_text: String,
    index: String,
    options: QueryOptions,
    excerpt_options: ExcerptOptions,
    eager_loads: Vec<String>,

    total_count: usize,
    time: f64,
    last_error: Option<String>,
}

impl<B, S> SearchBridge<B, S>
where
    B: SearchBackend + ?Sized,
    S: RecordStore + ?Sized,
{
    /// Create a bridge with the configured defaults.
    ///
    /// The index selector starts as the default index (empty when no
    /// index is configured).
    pub fn new(backend: Arc<B>, store: Arc<S>, config: Arc<Config>) -> Result<Self> {
        let options = config.default_options()?;
        let index = config.default_index_name().unwrap_or_default().to_string();
        let excerpt_options = config.excerpts.clone();

        Ok(Self {
            backend,
            store,
            config,
            query_text: String::new(),
            index,
            options,
            excerpt_options,
            eager_loads: Vec::new(),
            total_count: 0,
            time: 0.0,
            last_error: None,
        })
    }

    /// Start a search.
    ///
    /// `index` may name one index, several (comma or space separated)
    /// or `*`; `None` keeps the current selector. Filters, the geo
    /// anchor and group-by are reset; other options persist.
    pub fn search(&mut self, text: &str, index: Option<&str>) -> &mut Self {
        self.query_text = text.to_string();
        if let Some(index) = index {
            self.index = index.trim().to_string();
        }
        self.options.reset_filters();
        self.options.reset_group_by();
        self
    }

    pub fn set_field_weights(&mut self, weights: BTreeMap<String, f32>) -> &mut Self {
        self.options.field_weights = weights;
        self
    }

    pub fn set_match_mode(&mut self, mode: MatchMode) -> &mut Self {
        self.options.match_mode = mode;
        self
    }

    pub fn set_ranking_mode(&mut self, mode: RankingMode) -> &mut Self {
        self.options.ranking_mode = mode;
        self
    }

    pub fn set_sort_mode(&mut self, sort: SortMode) -> &mut Self {
        self.options.sort = sort;
        self
    }

    pub fn set_filter_float_range(
        &mut self,
        attr: &str,
        min: f64,
        max: f64,
        exclude: bool,
    ) -> &mut Self {
        self.options.filters.push(Filter::FloatRange {
            attr: attr.to_string(),
            min,
            max,
            exclude,
        });
        self
    }

    /// Anchor point for `@geodist` (coordinates in radians)
    pub fn set_geo_anchor(&mut self, lat_attr: &str, long_attr: &str, lat: f64, long: f64) -> &mut Self {
        self.options.geo_anchor = Some(GeoAnchor {
            lat_attr: lat_attr.to_string(),
            long_attr: long_attr.to_string(),
            lat,
            long,
        });
        self
    }

    /// Group matches; `group_sort` defaults to `@group desc`
    pub fn set_group_by(&mut self, attr: &str, func: GroupFunc, group_sort: Option<&str>) -> &mut Self {
        self.options.group_by = Some(GroupBy {
            attr: attr.to_string(),
            func,
            group_sort: group_sort.unwrap_or(DEFAULT_GROUP_SORT).to_string(),
        });
        self
    }

    /// Attributes returned with matches (`*` for all)
    pub fn set_select(&mut self, select: &str) -> &mut Self {
        self.options.select = parse_select(select);
        self
    }

    pub fn limit(&mut self, limit: usize, offset: usize, max_matches: usize, cutoff: usize) -> &mut Self {
        self.options.limits = Limits {
            offset,
            limit,
            max_matches,
            cutoff,
        };
        self
    }

    /// Keep matches whose attribute is one of `values`
    pub fn filter(&mut self, attr: &str, values: &[i64], exclude: bool) -> &mut Self {
        self.options.filters.push(Filter::Values {
            attr: attr.to_string(),
            values: values.to_vec(),
            exclude,
        });
        self
    }

    /// Keep matches whose attribute lies in `min..=max`
    pub fn range(&mut self, attr: &str, min: i64, max: i64, exclude: bool) -> &mut Self {
        self.options.filters.push(Filter::Range {
            attr: attr.to_string(),
            min,
            max,
            exclude,
        });
        self
    }

    /// Queue relations to eager load with the next [`get`](Self::get)
    pub fn with<I, T>(&mut self, relations: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        for relation in relations {
            let relation = relation.into();
            if !self.eager_loads.contains(&relation) {
                self.eager_loads.push(relation);
            }
        }
        self
    }

    /// Run the current query and return the raw result set
    pub fn query(&mut self) -> Result<SearchResultSet> {
        let result = self.run_query();
        self.track(result)
    }

    /// Run the current query and hydrate the matches.
    ///
    /// With `preserve_order` the records follow the backend's ranking;
    /// otherwise they come back in store order. Pending eager loads are
    /// consumed either way.
    pub fn get(&mut self, preserve_order: bool) -> Result<Vec<Record>> {
        let relations = std::mem::take(&mut self.eager_loads);
        self.total_count = 0;

        let result = self.run_query();
        let result = self.track(result)?;

        self.total_count = result.total_found;
        self.time = result.time;

        if result.total == 0 || result.is_empty() {
            return Ok(Vec::new());
        }

        let records = self.hydrate(&result, &relations, preserve_order);
        self.track(records)
    }

    fn hydrate(
        &self,
        result: &SearchResultSet,
        relations: &[String],
        preserve_order: bool,
    ) -> Result<Vec<Record>> {
        let mapping = self.config.mapping_for(&self.index)?;
        let store = &self.store;

        reconcile(
            &result.ids(),
            &mapping.column,
            |ids| store.fetch_by_ids(mapping, ids, relations),
            preserve_order,
        )
    }

    fn run_query(&self) -> Result<SearchResultSet> {
        let max_len = self.config.search.max_query_length;
        if self.query_text.chars().count() > max_len {
            return Err(BridgeError::InvalidQuery(format!(
                "Query exceeds maximum length of {max_len} characters"
            )));
        }

        let limits = &self.options.limits;
        if limits.limit == 0 || limits.max_matches == 0 {
            return Err(BridgeError::InvalidQuery(
                "Limit and max matches must be non-zero".to_string(),
            ));
        }

        if self.index.is_empty() {
            return Err(BridgeError::InvalidQuery(
                "No index selected and no index configured".to_string(),
            ));
        }

        tracing::debug!("Searching '{}' in '{}'", self.query_text, self.index);
        self.backend
            .query(&self.query_text, &self.index, &self.options)
    }

    /// Remember the outcome for [`last_error`](Self::last_error)
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.last_error = None,
            Err(e) => self.last_error = Some(e.to_string()),
        }
        result
    }

    /// Excerpt of one document for the current query and index
    pub fn excerpt(&mut self, content: &str, options: Option<&ExcerptOptions>) -> Result<String> {
        let mut excerpts = self.excerpts(&[content.to_string()], options)?;
        Ok(excerpts.pop().unwrap_or_default())
    }

    /// Excerpts of several documents for the current query and index
    pub fn excerpts(
        &mut self,
        contents: &[String],
        options: Option<&ExcerptOptions>,
    ) -> Result<Vec<String>> {
        let options = options.unwrap_or(&self.excerpt_options);
        let result = self
            .backend
            .build_excerpts(contents, &self.index, &self.query_text, options);
        self.track(result)
    }

    /// Excerpts for an explicit index and query, HTML stripped
    pub fn snippets(
        &mut self,
        docs: &[String],
        index: &str,
        query: &str,
        options: Option<&ExcerptOptions>,
    ) -> Result<Vec<String>> {
        let mut options = options.cloned().unwrap_or_else(|| self.excerpt_options.clone());
        options.strip_html = true;

        let result = self.backend.build_excerpts(docs, index, query, &options);
        self.track(result)
    }

    /// `total_found` of the last [`get`](Self::get)
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    /// Query time of the last [`get`](Self::get), in seconds
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Message of the last failed operation
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Escape query syntax characters in user input
    pub fn escape_string(&self, text: &str) -> String {
        escape_string(text)
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Relations queued for the next fetch
    pub fn eager_loads(&self) -> &[String] {
        &self.eager_loads
    }
}
