//! Core data types for searchbridge.
//!
//! Search-side types (matches and result sets) are produced by the
//! backend per query and never mutated afterwards. Store-side types
//! (records) are whatever the store returned for a bulk fetch.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Document identifier returned by the search backend
pub type DocId = u64;

/// Scalar attribute value attached to a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl AttrValue {
    /// Integer view (floats are truncated, text is not numeric)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            AttrValue::Float(v) => Some(*v as i64),
            AttrValue::Text(_) => None,
        }
    }

    /// Float view (text is not numeric)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(v) => Some(*v as f64),
            AttrValue::Float(v) => Some(*v),
            AttrValue::Text(_) => None,
        }
    }

    /// Total order used by attribute sorting.
    ///
    /// Numbers compare numerically and sort before text.
    pub fn sort_cmp(&self, other: &AttrValue) -> Ordering {
        match (self, other) {
            (AttrValue::Text(a), AttrValue::Text(b)) => a.cmp(b),
            (AttrValue::Text(_), _) => Ordering::Greater,
            (_, AttrValue::Text(_)) => Ordering::Less,
            (AttrValue::Int(a), AttrValue::Int(b)) => a.cmp(b),
            (a, b) => a
                .as_f64()
                .unwrap_or(0.0)
                .total_cmp(&b.as_f64().unwrap_or(0.0)),
        }
    }
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Int(v) => write!(f, "{v}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Text(v) => write!(f, "{v}"),
        }
    }
}

/// A single ranked match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    /// Document identifier (correlates with the mapping's lookup column)
    pub id: DocId,

    /// Relevance weight (higher = more relevant)
    pub weight: f32,

    /// Attribute values, including computed ones such as `@geodist`
    #[serde(default)]
    pub attrs: BTreeMap<String, AttrValue>,
}

/// Result of one backend query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResultSet {
    /// Matches on the requested page, in backend order
    pub matches: Vec<SearchMatch>,

    /// Matches retrievable by paging (capped at max_matches)
    pub total: usize,

    /// Documents that satisfied the query and filters
    pub total_found: usize,

    /// Query time in seconds
    pub time: f64,
}

impl SearchResultSet {
    /// Identifiers of the matches, in backend order
    pub fn ids(&self) -> Vec<DocId> {
        self.matches.iter().map(|m| m.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// A hydrated row from the record store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a column value
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Set a column value (also used to attach eager-loaded relations)
    pub fn insert(&mut self, column: impl Into<String>, value: Value) {
        self.0.insert(column.into(), value);
    }

    /// Column names in store order
    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A row prepared for the search index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexDocument {
    pub id: DocId,

    /// Full-text fields
    pub text: BTreeMap<String, String>,

    /// Numeric attributes
    pub attrs: BTreeMap<String, AttrValue>,
}

/// Statistics from an indexing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Index name
    pub index: String,

    /// Documents written to the index
    pub documents: usize,

    /// Indexing duration in milliseconds
    pub duration_ms: u64,
}
