//! Show-config command - show current configuration

use crate::cli::output::colors;
use crate::cli::OutputFormat;
use crate::core::config::{Config, IndexMapping};
use crate::core::services::Services;
use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Arguments for the show-config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Also show index mappings
    #[arg(long, short = 'a')]
    pub all: bool,
}

/// Configuration response
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub config_file: String,
    pub index_dir: String,
    pub database: String,
    pub default_index: Option<String>,
    pub search: SearchSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexes: Option<BTreeMap<String, IndexMapping>>,
}

#[derive(Debug, Serialize)]
pub struct SearchSummary {
    pub default_limit: usize,
    pub max_matches: usize,
    pub cutoff: usize,
    pub max_query_length: usize,
    pub match_mode: String,
    pub ranking_mode: String,
    pub sort_mode: String,
    pub sort_by: Option<String>,
}

fn summarize(config: &Config, all: bool) -> ConfigResponse {
    let xdg = crate::core::xdg::XdgDirs::new();
    let search = &config.search;

    ConfigResponse {
        config_file: xdg.config_file().to_string_lossy().into_owned(),
        index_dir: config.backend.index_dir.to_string_lossy().into_owned(),
        database: config.store.database.to_string_lossy().into_owned(),
        default_index: config.default_index_name().map(str::to_string),
        search: SearchSummary {
            default_limit: search.default_limit,
            max_matches: search.max_matches,
            cutoff: search.cutoff,
            max_query_length: search.max_query_length,
            match_mode: format!("{:?}", search.match_mode).to_lowercase(),
            ranking_mode: format!("{:?}", search.ranking_mode).to_lowercase(),
            sort_mode: search.sort_mode.clone(),
            sort_by: search.sort_by.clone(),
        },
        indexes: all.then(|| config.indexes.clone()),
    }
}

/// Execute the show-config command
pub async fn execute(
    args: ConfigArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = summarize(&services.config, args.all);

    match format {
        OutputFormat::Human => {
            println!("{}", colors::label("Configuration:"));
            println!("  config_file: {}", response.config_file);
            println!("  index_dir: {}", response.index_dir);
            println!("  database: {}", response.database);
            println!(
                "  default_index: {}",
                response.default_index.as_deref().unwrap_or("(none)")
            );
            println!("  search:");
            println!("    default_limit: {}", response.search.default_limit);
            println!("    max_matches: {}", response.search.max_matches);
            println!("    cutoff: {}", response.search.cutoff);
            println!("    max_query_length: {}", response.search.max_query_length);
            println!("    match_mode: {}", response.search.match_mode);
            println!("    ranking_mode: {}", response.search.ranking_mode);
            println!("    sort_mode: {}", response.search.sort_mode);
            if let Some(sort_by) = &response.search.sort_by {
                println!("    sort_by: {sort_by}");
            }
            if let Some(indexes) = &response.indexes {
                println!("  indexes:");
                for (name, mapping) in indexes {
                    println!(
                        "    {}: table={} column={} fields={:?}",
                        colors::index_name(name),
                        mapping.table,
                        mapping.column,
                        mapping.fields
                    );
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
