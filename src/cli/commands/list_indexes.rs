//! List-indexes command - built and configured indexes

use crate::cli::output::{colors, format_bytes, format_relative_time, print_warning};
use crate::cli::OutputFormat;
use crate::core::services::Services;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use std::sync::Arc;

/// Arguments for list-indexes
#[derive(Args, Debug)]
pub struct ListIndexesArgs {}

/// Index list item
#[derive(Debug, Serialize)]
pub struct IndexListItem {
    pub name: String,
    pub table: Option<String>,
    pub built: bool,
    /// Built from a mapping that differs from the current configuration
    pub stale: bool,
    pub documents: usize,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexed_at: Option<DateTime<Utc>>,
}

/// Index list response
#[derive(Debug, Serialize)]
pub struct IndexListResponse {
    pub count: usize,
    pub indexes: Vec<IndexListItem>,
}

/// Collect built indexes plus configured ones that were never built
pub fn collect(services: &Services) -> Result<IndexListResponse, Box<dyn std::error::Error>> {
    let built = services.catalog.list_indexes()?;

    let mut indexes: Vec<IndexListItem> = built
        .into_iter()
        .map(|m| IndexListItem {
            table: Some(m.mapping.table.clone()),
            stale: services
                .config
                .indexes
                .get(&m.name)
                .is_some_and(|current| current != &m.mapping),
            name: m.name,
            built: true,
            documents: m.documents,
            size_bytes: m.index_size_bytes,
            indexed_at: Some(m.last_indexed_at),
        })
        .collect();

    for (name, mapping) in &services.config.indexes {
        if !indexes.iter().any(|i| &i.name == name) {
            indexes.push(IndexListItem {
                name: name.clone(),
                table: Some(mapping.table.clone()),
                built: false,
                stale: false,
                documents: 0,
                size_bytes: 0,
                indexed_at: None,
            });
        }
    }
    indexes.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(IndexListResponse {
        count: indexes.len(),
        indexes,
    })
}

/// Execute list-indexes
pub async fn execute(
    _args: ListIndexesArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = collect(services)?;

    match format {
        OutputFormat::Human => {
            if response.indexes.is_empty() {
                println!(
                    "No indexes found. Configure one and run '{}'.",
                    colors::label("searchbridge index <name>")
                );
            } else {
                println!(
                    "{} ({}):",
                    colors::label("Indexes"),
                    colors::number(&response.count.to_string())
                );
                for index in &response.indexes {
                    let table = index.table.as_deref().unwrap_or("-");
                    match &index.indexed_at {
                        Some(at) => println!(
                            "  {:<20} {:<16} {:>8} docs  {:>10}  {}",
                            colors::index_name(&index.name),
                            colors::path(table),
                            colors::number(&index.documents.to_string()),
                            colors::number(&format_bytes(index.size_bytes)),
                            colors::dim(&format_relative_time(at))
                        ),
                        None => println!(
                            "  {:<20} {:<16} {}",
                            colors::index_name(&index.name),
                            colors::path(table),
                            colors::warning("not built")
                        ),
                    }
                }
                for index in response.indexes.iter().filter(|i| i.stale) {
                    print_warning(&format!(
                        "Index '{}' was built from a different mapping; run 'searchbridge index {} --force'",
                        index.name, index.name
                    ));
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
