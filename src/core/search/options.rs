//! Query-builder options.
//!
//! These mirror the builder calls of a classic search client (match
//! mode, ranking, sorting, filters, grouping, select lists, limits and
//! geo anchors). The bridge passes them to the backend unchanged.

use crate::core::error::{BridgeError, Result};
use crate::core::types::{AttrValue, DocId};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Earth radius used for `@geodist`, in meters
pub const EARTH_RADIUS_M: f64 = 6_384_000.0;

/// How query text is matched against documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Every word must match
    All,
    /// Any word may match
    #[default]
    Any,
    /// The text must match as a phrase
    Phrase,
    /// AND/OR/NOT operators are honoured
    Boolean,
    /// Full query syntax including `field:` prefixes
    Extended,
    /// Ignore the text and return every document
    FullScan,
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "any" => Ok(Self::Any),
            "phrase" => Ok(Self::Phrase),
            "boolean" => Ok(Self::Boolean),
            "extended" | "extended2" => Ok(Self::Extended),
            "full_scan" | "fullscan" => Ok(Self::FullScan),
            other => Err(format!(
                "unknown match mode '{other}' (expected all, any, phrase, boolean, extended, full_scan)"
            )),
        }
    }
}

/// How match weights are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingMode {
    #[default]
    Bm25,
    /// Every match weighs 1
    None,
}

impl FromStr for RankingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bm25" => Ok(Self::Bm25),
            "none" => Ok(Self::None),
            other => Err(format!("unknown ranking mode '{other}' (expected bm25, none)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDir {
    Asc,
    Desc,
}

/// One `attr ASC|DESC` element of an extended sort clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub attr: String,
    pub dir: SortDir,
}

/// Parse a clause such as `@weight DESC, price ASC`.
///
/// A key without a direction sorts ascending.
pub fn parse_sort_clause(clause: &str) -> Result<Vec<SortKey>> {
    let mut keys = Vec::new();

    for part in clause.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let mut tokens = part.split_whitespace();
        let attr = tokens.next().unwrap_or_default().to_string();
        let dir = match tokens.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => SortDir::Asc,
            Some("desc") => SortDir::Desc,
            Some(other) => {
                return Err(BridgeError::InvalidQuery(format!(
                    "Invalid sort direction '{other}' in '{part}'"
                )))
            }
        };
        if tokens.next().is_some() {
            return Err(BridgeError::InvalidQuery(format!(
                "Invalid sort clause element '{part}'"
            )));
        }
        keys.push(SortKey { attr, dir });
    }

    if keys.is_empty() {
        return Err(BridgeError::InvalidQuery(
            "Sort clause cannot be empty".to_string(),
        ));
    }

    Ok(keys)
}

/// Result ordering
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortMode {
    /// Weight descending, then id ascending
    #[default]
    Relevance,
    AttrDesc(String),
    AttrAsc(String),
    /// Comma separated `attr ASC|DESC` clause
    Extended(String),
}

impl SortMode {
    /// Build a sort mode from its name and optional sort-by argument
    pub fn from_parts(mode: &str, sort_by: Option<&str>) -> Result<Self> {
        let needs_arg = |name: &str| {
            sort_by
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    BridgeError::InvalidQuery(format!("Sort mode '{name}' requires a sort-by value"))
                })
        };

        match mode.to_ascii_lowercase().as_str() {
            "relevance" => Ok(Self::Relevance),
            "attr_desc" => Ok(Self::AttrDesc(needs_arg("attr_desc")?)),
            "attr_asc" => Ok(Self::AttrAsc(needs_arg("attr_asc")?)),
            "extended" => {
                let clause = needs_arg("extended")?;
                parse_sort_clause(&clause)?;
                Ok(Self::Extended(clause))
            }
            other => Err(BridgeError::InvalidQuery(format!(
                "Unknown sort mode '{other}' (expected relevance, attr_desc, attr_asc, extended)"
            ))),
        }
    }

    /// Sort keys equivalent to this mode
    pub fn keys(&self) -> Result<Vec<SortKey>> {
        let key = |attr: &str, dir| SortKey {
            attr: attr.to_string(),
            dir,
        };
        match self {
            SortMode::Relevance => Ok(vec![key("@weight", SortDir::Desc), key("@id", SortDir::Asc)]),
            SortMode::AttrDesc(attr) => Ok(vec![key(attr, SortDir::Desc)]),
            SortMode::AttrAsc(attr) => Ok(vec![key(attr, SortDir::Asc)]),
            SortMode::Extended(clause) => parse_sort_clause(clause),
        }
    }
}

/// Attribute filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// Attribute value is one of `values`
    Values {
        attr: String,
        values: Vec<i64>,
        exclude: bool,
    },
    /// Inclusive integer range
    Range {
        attr: String,
        min: i64,
        max: i64,
        exclude: bool,
    },
    /// Inclusive float range
    FloatRange {
        attr: String,
        min: f64,
        max: f64,
        exclude: bool,
    },
}

impl Filter {
    pub fn attr(&self) -> &str {
        match self {
            Filter::Values { attr, .. }
            | Filter::Range { attr, .. }
            | Filter::FloatRange { attr, .. } => attr,
        }
    }

    /// Whether a document passes this filter.
    ///
    /// `@id` refers to the document id. A document without the
    /// attribute never satisfies an including filter.
    pub fn accepts(&self, id: DocId, attrs: &BTreeMap<String, AttrValue>) -> bool {
        let value = if self.attr() == "@id" {
            Some(AttrValue::Int(id as i64))
        } else {
            attrs.get(self.attr()).cloned()
        };

        let (hit, exclude) = match (self, value) {
            (_, None) => (false, self.excludes()),
            (Filter::Values { values, exclude, .. }, Some(v)) => {
                (v.as_i64().is_some_and(|v| values.contains(&v)), *exclude)
            }
            (Filter::Range { min, max, exclude, .. }, Some(v)) => (
                v.as_i64().is_some_and(|v| *min <= v && v <= *max),
                *exclude,
            ),
            (Filter::FloatRange { min, max, exclude, .. }, Some(v)) => (
                v.as_f64().is_some_and(|v| *min <= v && v <= *max),
                *exclude,
            ),
        };

        hit != exclude
    }

    fn excludes(&self) -> bool {
        match self {
            Filter::Values { exclude, .. }
            | Filter::Range { exclude, .. }
            | Filter::FloatRange { exclude, .. } => *exclude,
        }
    }
}

/// Grouping function applied to the group-by attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupFunc {
    /// Group by the attribute value
    #[default]
    Attr,
    /// Timestamp attribute grouped as YYYYMMDD
    Day,
    /// Timestamp attribute grouped as ISO YYYYWW
    Week,
    /// Timestamp attribute grouped as YYYYMM
    Month,
    /// Timestamp attribute grouped as YYYY
    Year,
}

impl FromStr for GroupFunc {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "attr" => Ok(Self::Attr),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(format!(
                "unknown group function '{other}' (expected attr, day, week, month, year)"
            )),
        }
    }
}

impl GroupFunc {
    /// Group key for an attribute value, `None` when it cannot be grouped
    pub fn key(&self, value: &AttrValue) -> Option<AttrValue> {
        let timestamp = |v: &AttrValue| DateTime::<Utc>::from_timestamp(v.as_i64()?, 0);
        let key = match self {
            GroupFunc::Attr => return Some(value.clone()),
            GroupFunc::Day => {
                let ts = timestamp(value)?;
                ts.year() as i64 * 10_000 + ts.month() as i64 * 100 + ts.day() as i64
            }
            GroupFunc::Week => {
                let week = timestamp(value)?.iso_week();
                week.year() as i64 * 100 + week.week() as i64
            }
            GroupFunc::Month => {
                let ts = timestamp(value)?;
                ts.year() as i64 * 100 + ts.month() as i64
            }
            GroupFunc::Year => timestamp(value)?.year() as i64,
        };
        Some(AttrValue::Int(key))
    }
}

/// Group-by settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBy {
    pub attr: String,
    pub func: GroupFunc,

    /// Ordering of the groups, e.g. `@group desc` or `@count desc`
    pub group_sort: String,
}

pub const DEFAULT_GROUP_SORT: &str = "@group desc";

/// Anchor point for `@geodist`; all coordinates in radians
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoAnchor {
    pub lat_attr: String,
    pub long_attr: String,
    pub lat: f64,
    pub long: f64,
}

impl GeoAnchor {
    /// Great-circle distance in meters from the anchor
    pub fn distance(&self, lat: f64, long: f64) -> f64 {
        let dlat = (lat - self.lat) / 2.0;
        let dlong = (long - self.long) / 2.0;
        let a = dlat.sin().powi(2) + self.lat.cos() * lat.cos() * dlong.sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
    }

    /// `@geodist` for a document, when both coordinates are present
    pub fn distance_for(&self, attrs: &BTreeMap<String, AttrValue>) -> Option<f64> {
        let lat = attrs.get(&self.lat_attr)?.as_f64()?;
        let long = attrs.get(&self.long_attr)?.as_f64()?;
        Some(self.distance(lat, long))
    }
}

/// Paging and result caps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub offset: usize,
    pub limit: usize,
    /// Matches kept for paging
    pub max_matches: usize,
    /// Candidates examined per index (0 = no cutoff)
    pub cutoff: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
            max_matches: 1000,
            cutoff: 1000,
        }
    }
}

/// Parse a select list: `*` (or empty) means every attribute
pub fn parse_select(select: &str) -> Option<Vec<String>> {
    let attrs: Vec<String> = select
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if attrs.is_empty() || attrs.iter().any(|a| a == "*") {
        None
    } else {
        Some(attrs)
    }
}

/// Complete option set of one query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub match_mode: MatchMode,
    pub ranking_mode: RankingMode,
    pub sort: SortMode,
    pub field_weights: BTreeMap<String, f32>,
    pub filters: Vec<Filter>,
    pub group_by: Option<GroupBy>,
    /// Attributes to return (`None` = all)
    pub select: Option<Vec<String>>,
    pub limits: Limits,
    pub geo_anchor: Option<GeoAnchor>,
}

impl QueryOptions {
    pub fn reset_filters(&mut self) {
        self.filters.clear();
        self.geo_anchor = None;
    }

    pub fn reset_group_by(&mut self) {
        self.group_by = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, AttrValue)]) -> BTreeMap<String, AttrValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_match_mode_parsing() {
        assert_eq!("ALL".parse::<MatchMode>().unwrap(), MatchMode::All);
        assert_eq!("extended2".parse::<MatchMode>().unwrap(), MatchMode::Extended);
        assert!("fuzzy".parse::<MatchMode>().is_err());
        assert_eq!(MatchMode::default(), MatchMode::Any);
    }

    #[test]
    fn test_sort_clause_parsing() {
        let keys = parse_sort_clause("@weight DESC, price asc, id").unwrap();
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[0].attr, "@weight");
        assert_eq!(keys[0].dir, SortDir::Desc);
        assert_eq!(keys[1].dir, SortDir::Asc);
        assert_eq!(keys[2].dir, SortDir::Asc);
    }

    #[test]
    fn test_sort_clause_rejects_bad_direction() {
        assert!(parse_sort_clause("price upward").is_err());
        assert!(parse_sort_clause(" , ").is_err());
    }

    #[test]
    fn test_sort_mode_requires_attribute() {
        assert!(SortMode::from_parts("attr_desc", None).is_err());
        assert_eq!(
            SortMode::from_parts("attr_desc", Some("price")).unwrap(),
            SortMode::AttrDesc("price".to_string())
        );
        assert_eq!(
            SortMode::from_parts("relevance", None).unwrap(),
            SortMode::Relevance
        );
    }

    #[test]
    fn test_values_filter() {
        let doc = attrs(&[("category", AttrValue::Int(3))]);
        let include = Filter::Values {
            attr: "category".to_string(),
            values: vec![1, 3],
            exclude: false,
        };
        let exclude = Filter::Values {
            attr: "category".to_string(),
            values: vec![3],
            exclude: true,
        };

        assert!(include.accepts(1, &doc));
        assert!(!exclude.accepts(1, &doc));
    }

    #[test]
    fn test_missing_attribute_only_passes_exclusion() {
        let doc = attrs(&[]);
        let include = Filter::Range {
            attr: "price".to_string(),
            min: 0,
            max: 10,
            exclude: false,
        };
        let exclude = Filter::Range {
            attr: "price".to_string(),
            min: 0,
            max: 10,
            exclude: true,
        };

        assert!(!include.accepts(1, &doc));
        assert!(exclude.accepts(1, &doc));
    }

    #[test]
    fn test_id_pseudo_attribute() {
        let filter = Filter::Range {
            attr: "@id".to_string(),
            min: 10,
            max: 20,
            exclude: false,
        };
        assert!(filter.accepts(15, &BTreeMap::new()));
        assert!(!filter.accepts(21, &BTreeMap::new()));
    }

    #[test]
    fn test_float_range_filter() {
        let doc = attrs(&[("rating", AttrValue::Float(4.2))]);
        let filter = Filter::FloatRange {
            attr: "rating".to_string(),
            min: 4.0,
            max: 5.0,
            exclude: false,
        };
        assert!(filter.accepts(1, &doc));
    }

    #[test]
    fn test_group_func_keys() {
        // 2024-03-15T12:00:00Z
        let ts = AttrValue::Int(1_710_504_000);
        assert_eq!(GroupFunc::Day.key(&ts), Some(AttrValue::Int(20240315)));
        assert_eq!(GroupFunc::Week.key(&ts), Some(AttrValue::Int(202411)));
        assert_eq!(GroupFunc::Month.key(&ts), Some(AttrValue::Int(202403)));
        assert_eq!(GroupFunc::Year.key(&ts), Some(AttrValue::Int(2024)));
        assert_eq!(
            GroupFunc::Attr.key(&AttrValue::Text("x".into())),
            Some(AttrValue::Text("x".into()))
        );
        assert_eq!(GroupFunc::Day.key(&AttrValue::Text("x".into())), None);
    }

    #[test]
    fn test_geodist_zero_at_anchor() {
        let anchor = GeoAnchor {
            lat_attr: "lat".to_string(),
            long_attr: "lng".to_string(),
            lat: 0.7,
            long: 0.2,
        };
        assert!(anchor.distance(0.7, 0.2).abs() < 1e-6);

        // One degree of latitude is roughly 111 km
        let one_degree = anchor.distance(0.7 + 1f64.to_radians(), 0.2);
        assert!((one_degree - 111_400.0).abs() < 1_000.0);
    }

    #[test]
    fn test_parse_select() {
        assert_eq!(parse_select("*"), None);
        assert_eq!(parse_select(""), None);
        assert_eq!(
            parse_select("price, category"),
            Some(vec!["price".to_string(), "category".to_string()])
        );
    }

    #[test]
    fn test_reset_filters_keeps_other_options() {
        let mut options = QueryOptions {
            match_mode: MatchMode::All,
            ..Default::default()
        };
        options.filters.push(Filter::Values {
            attr: "a".to_string(),
            values: vec![1],
            exclude: false,
        });
        options.group_by = Some(GroupBy {
            attr: "a".to_string(),
            func: GroupFunc::Attr,
            group_sort: DEFAULT_GROUP_SORT.to_string(),
        });

        options.reset_filters();
        options.reset_group_by();

        assert!(options.filters.is_empty());
        assert!(options.group_by.is_none());
        assert_eq!(options.match_mode, MatchMode::All);
    }
}
