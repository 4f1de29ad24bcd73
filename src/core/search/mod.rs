//! Full-text search over named indexes.
//!
//! [`SearchBackend`] is the seam between the bridge and the engine;
//! [`TantivyBackend`] implements it with Tantivy's BM25 ranking.

mod engine;
pub mod excerpt;
pub mod options;
mod query;

pub use engine::{arrange_matches, TantivyBackend, COUNT_ATTR, GEODIST_ATTR, GROUPBY_ATTR};
pub use excerpt::ExcerptOptions;
pub use options::QueryOptions;
pub use query::{
    escape_string, prepare_query, preprocess_query, query_terms, validate_query_fields,
    PreparedQuery,
};

use crate::core::error::Result;
use crate::core::types::SearchResultSet;

/// A full-text search engine
pub trait SearchBackend: Send + Sync {
    /// Run `text` against the indexes named by `indexes`
    /// (comma or space separated, `*` for all).
    fn query(&self, text: &str, indexes: &str, options: &QueryOptions) -> Result<SearchResultSet>;

    /// Highlight `query` in arbitrary documents, one excerpt per document
    fn build_excerpts(
        &self,
        docs: &[String],
        index: &str,
        query: &str,
        options: &ExcerptOptions,
    ) -> Result<Vec<String>>;
}
