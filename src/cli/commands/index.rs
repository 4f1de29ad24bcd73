//! Index command - build search indexes from the record store

use crate::cli::output::{colors, format_duration};
use crate::cli::OutputFormat;
use crate::core::error::BridgeError;
use crate::core::services::Services;
use crate::core::types::IndexStats;
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

/// Arguments for the index command
#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("target").required(true).args(["names", "all"])))]
pub struct IndexArgs {
    /// Indexes to build, as named in the configuration
    pub names: Vec<String>,

    /// Build every configured index
    #[arg(long, short = 'a')]
    pub all: bool,

    /// Rebuild indexes that already exist
    #[arg(long, short = 'f')]
    pub force: bool,

    /// Suppress progress output
    #[arg(long, short = 'q')]
    pub quiet: bool,
}

/// Indexing result response
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub indexes: Vec<IndexStats>,
    pub documents: usize,
    pub duration_secs: f64,
}

/// Execute the index command
pub async fn execute(
    args: IndexArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = &services.config;

    let names: Vec<String> = if args.all {
        config.indexes.keys().cloned().collect()
    } else {
        args.names.clone()
    };

    if names.is_empty() {
        return Err("No indexes configured. Add an [indexes.<name>] section to the config file.".into());
    }

    let pipeline = services.create_pipeline();
    let mut built = Vec::with_capacity(names.len());

    for name in &names {
        let mapping = config.indexes.get(name).ok_or_else(|| {
            format!("Index '{name}' is not configured. Run 'searchbridge list-indexes' to see configured indexes.")
        })?;

        if !args.quiet && format == OutputFormat::Human {
            eprintln!(
                "Indexing table {} as '{}'...",
                colors::path(&mapping.table),
                colors::index_name(name)
            );
        }

        let stats = pipeline.build_index(name, mapping, args.force).map_err(|e| {
            if matches!(e, BridgeError::IndexAlreadyExists(_)) {
                format!("{e}. Use --force to rebuild it.")
            } else {
                e.to_string()
            }
        })?;
        built.push(stats);
    }

    let response = IndexResponse {
        documents: built.iter().map(|s| s.documents).sum(),
        duration_secs: built.iter().map(|s| s.duration_ms).sum::<u64>() as f64 / 1000.0,
        indexes: built,
    };

    match format {
        OutputFormat::Human => {
            for stats in &response.indexes {
                println!(
                    "{} '{}': {} documents in {}",
                    colors::success("Indexed"),
                    colors::index_name(&stats.index),
                    colors::number(&stats.documents.to_string()),
                    colors::number(&format_duration(stats.duration_ms as f64 / 1000.0))
                );
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
