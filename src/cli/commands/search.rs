//! Search command - search an index and hydrate the matches

use crate::cli::output::{colors, format_value};
use crate::cli::OutputFormat;
use crate::core::search::options::{GroupFunc, MatchMode, RankingMode, SortMode};
use crate::core::services::Services;
use crate::core::types::{Record, SearchMatch};
use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// `attr=v1,v2,...`
#[derive(Debug, Clone, PartialEq)]
pub struct ValuesFilterArg {
    pub attr: String,
    pub values: Vec<i64>,
}

/// `attr=min..max`
#[derive(Debug, Clone, PartialEq)]
pub struct RangeArg<T> {
    pub attr: String,
    pub min: T,
    pub max: T,
}

/// `lat_attr,long_attr,lat,long` (radians)
#[derive(Debug, Clone, PartialEq)]
pub struct GeoAnchorArg {
    pub lat_attr: String,
    pub long_attr: String,
    pub lat: f64,
    pub long: f64,
}

/// Arguments for the search command
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query
    pub query: String,

    /// Index selector: a name, several names (comma separated) or '*'
    #[arg(long, short = 'i')]
    pub index: Option<String>,

    /// Match mode (all, any, phrase, boolean, extended, full_scan)
    #[arg(long, short = 'm', value_parser = parse_match_mode)]
    pub mode: Option<MatchMode>,

    /// Ranking mode (bm25, none)
    #[arg(long, value_parser = parse_ranking_mode)]
    pub ranking: Option<RankingMode>,

    /// Sort mode (relevance, attr_desc, attr_asc, extended)
    #[arg(long)]
    pub sort: Option<String>,

    /// Attribute or clause for the sort mode, e.g. "author_id DESC, @id ASC"
    #[arg(long)]
    pub sort_by: Option<String>,

    /// Field weight as field=weight (repeatable)
    #[arg(long = "weight", value_parser = parse_field_weight)]
    pub weights: Vec<(String, f32)>,

    /// Keep matches whose attribute is one of the values: attr=v1,v2 (repeatable)
    #[arg(long, value_parser = parse_values_filter)]
    pub filter: Vec<ValuesFilterArg>,

    /// Drop matches whose attribute is one of the values: attr=v1,v2 (repeatable)
    #[arg(long, value_parser = parse_values_filter)]
    pub exclude_filter: Vec<ValuesFilterArg>,

    /// Keep matches with an integer attribute in attr=min..max (repeatable)
    #[arg(long, value_parser = parse_int_range)]
    pub range: Vec<RangeArg<i64>>,

    /// Keep matches with a float attribute in attr=min..max (repeatable)
    #[arg(long, value_parser = parse_float_range)]
    pub float_range: Vec<RangeArg<f64>>,

    /// Anchor for @geodist: lat_attr,long_attr,lat,long (radians)
    #[arg(long, value_parser = parse_geo_anchor)]
    pub geo_anchor: Option<GeoAnchorArg>,

    /// Group matches by this attribute
    #[arg(long)]
    pub group_by: Option<String>,

    /// Grouping function (attr, day, week, month, year)
    #[arg(long, default_value = "attr", value_parser = parse_group_func)]
    pub group_func: GroupFunc,

    /// Group ordering clause (default: "@group desc")
    #[arg(long)]
    pub group_sort: Option<String>,

    /// Attributes returned with each match, comma separated
    #[arg(long)]
    pub select: Option<String>,

    /// Matches per page (default from configuration)
    #[arg(long, short = 'k')]
    pub limit: Option<usize>,

    /// Matches to skip
    #[arg(long, default_value = "0")]
    pub offset: usize,

    /// Matches kept for paging (default from configuration)
    #[arg(long)]
    pub max_matches: Option<usize>,

    /// Candidates examined per index (default from configuration)
    #[arg(long)]
    pub cutoff: Option<usize>,

    /// Relations to eager load, comma separated
    #[arg(long, value_delimiter = ',')]
    pub with: Vec<String>,

    /// Return records in relevance order instead of store order
    #[arg(long)]
    pub ordered: bool,

    /// Print raw matches without fetching records
    #[arg(long)]
    pub raw: bool,
}

fn parse_match_mode(s: &str) -> Result<MatchMode, String> {
    s.parse()
}

fn parse_ranking_mode(s: &str) -> Result<RankingMode, String> {
    s.parse()
}

fn parse_group_func(s: &str) -> Result<GroupFunc, String> {
    s.parse()
}

fn split_assignment(s: &str) -> Result<(String, &str), String> {
    let (attr, rest) = s
        .split_once('=')
        .ok_or_else(|| format!("expected attr=value, got '{s}'"))?;
    let attr = attr.trim();
    if attr.is_empty() {
        return Err(format!("missing attribute name in '{s}'"));
    }
    Ok((attr.to_string(), rest.trim()))
}

fn parse_number<T: std::str::FromStr>(s: &str) -> Result<T, String> {
    s.trim()
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s.trim()))
}

fn parse_field_weight(s: &str) -> Result<(String, f32), String> {
    let (field, weight) = split_assignment(s)?;
    Ok((field, parse_number(weight)?))
}

fn parse_values_filter(s: &str) -> Result<ValuesFilterArg, String> {
    let (attr, rest) = split_assignment(s)?;
    let values = rest
        .split(',')
        .filter(|v| !v.trim().is_empty())
        .map(parse_number)
        .collect::<Result<Vec<i64>, _>>()?;

    if values.is_empty() {
        return Err(format!("no values given for '{attr}'"));
    }
    Ok(ValuesFilterArg { attr, values })
}

fn parse_range<T: std::str::FromStr + PartialOrd>(s: &str) -> Result<RangeArg<T>, String> {
    let (attr, rest) = split_assignment(s)?;
    let (min, max) = rest
        .split_once("..")
        .ok_or_else(|| format!("expected attr=min..max, got '{s}'"))?;
    let (min, max) = (parse_number(min)?, parse_number(max)?);

    if min > max {
        return Err(format!("range for '{attr}' has min greater than max"));
    }
    Ok(RangeArg { attr, min, max })
}

fn parse_int_range(s: &str) -> Result<RangeArg<i64>, String> {
    parse_range(s)
}

fn parse_float_range(s: &str) -> Result<RangeArg<f64>, String> {
    parse_range(s)
}

fn parse_geo_anchor(s: &str) -> Result<GeoAnchorArg, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [lat_attr, long_attr, lat, long] if !lat_attr.is_empty() && !long_attr.is_empty() => {
            Ok(GeoAnchorArg {
                lat_attr: lat_attr.to_string(),
                long_attr: long_attr.to_string(),
                lat: parse_number(lat)?,
                long: parse_number(long)?,
            })
        }
        _ => Err(format!("expected lat_attr,long_attr,lat,long, got '{s}'")),
    }
}

/// Search response
#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub query: String,
    pub index: String,
    pub total_found: usize,
    pub time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<SearchMatch>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<Record>>,
}

/// Execute the search command
pub async fn execute(
    args: SearchArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut bridge = services.bridge()?;
    bridge.search(&args.query, args.index.as_deref());

    if let Some(mode) = args.mode {
        bridge.set_match_mode(mode);
    }
    if let Some(ranking) = args.ranking {
        bridge.set_ranking_mode(ranking);
    }
    if let Some(sort) = &args.sort {
        bridge.set_sort_mode(SortMode::from_parts(sort, args.sort_by.as_deref())?);
    }
    if !args.weights.is_empty() {
        bridge.set_field_weights(args.weights.iter().cloned().collect::<BTreeMap<_, _>>());
    }

    for filter in &args.filter {
        bridge.filter(&filter.attr, &filter.values, false);
    }
    for filter in &args.exclude_filter {
        bridge.filter(&filter.attr, &filter.values, true);
    }
    for range in &args.range {
        bridge.range(&range.attr, range.min, range.max, false);
    }
    for range in &args.float_range {
        bridge.set_filter_float_range(&range.attr, range.min, range.max, false);
    }
    if let Some(anchor) = &args.geo_anchor {
        bridge.set_geo_anchor(&anchor.lat_attr, &anchor.long_attr, anchor.lat, anchor.long);
    }
    if let Some(attr) = &args.group_by {
        bridge.set_group_by(attr, args.group_func, args.group_sort.as_deref());
    }
    if let Some(select) = &args.select {
        bridge.set_select(select);
    }

    let defaults = bridge.options().limits;
    bridge.limit(
        args.limit.unwrap_or(defaults.limit),
        args.offset,
        args.max_matches.unwrap_or(defaults.max_matches),
        args.cutoff.unwrap_or(defaults.cutoff),
    );

    let output = if args.raw {
        let result = bridge.query()?;
        SearchOutput {
            query: args.query.clone(),
            index: bridge.index().to_string(),
            total_found: result.total_found,
            time: result.time,
            matches: Some(result.matches),
            records: None,
        }
    } else {
        let records = bridge.with(args.with.iter().cloned()).get(args.ordered)?;
        SearchOutput {
            query: args.query.clone(),
            index: bridge.index().to_string(),
            total_found: bridge.total_count(),
            time: bridge.time(),
            matches: None,
            records: Some(records),
        }
    };

    match format {
        OutputFormat::Human => print_human(&output),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
    }

    Ok(())
}

fn print_human(output: &SearchOutput) {
    let shown = output
        .matches
        .as_ref()
        .map(Vec::len)
        .or_else(|| output.records.as_ref().map(Vec::len))
        .unwrap_or(0);

    if shown == 0 {
        println!(
            "No results found for '{}' in '{}'",
            colors::label(&output.query),
            colors::index_name(&output.index)
        );
        return;
    }

    println!(
        "Showing {} of {} match(es) in '{}' {}\n",
        colors::number(&shown.to_string()),
        colors::number(&output.total_found.to_string()),
        colors::index_name(&output.index),
        colors::dim(&format!("({:.3}s)", output.time))
    );

    if let Some(matches) = &output.matches {
        for (i, m) in matches.iter().enumerate() {
            println!(
                "[{}] id {} {}",
                colors::rank(&(i + 1).to_string()),
                colors::number(&m.id.to_string()),
                colors::score(&format!("(weight: {:.3})", m.weight))
            );
            for (attr, value) in &m.attrs {
                println!("    {}: {}", colors::label(attr), value);
            }
        }
    }

    if let Some(records) = &output.records {
        for (i, record) in records.iter().enumerate() {
            println!("[{}]", colors::rank(&(i + 1).to_string()));
            for (column, value) in record.as_map() {
                println!("    {}: {}", colors::label(column), colors::dim(&format_value(value, 100)));
            }
            println!();
        }
    }
}
