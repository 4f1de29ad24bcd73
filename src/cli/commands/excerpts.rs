//! Excerpts command - highlight a query in documents

use crate::cli::OutputFormat;
use crate::core::services::Services;
use clap::Args;
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the excerpts command
#[derive(Args, Debug)]
pub struct ExcerptsArgs {
    /// Query whose words are highlighted
    pub query: String,

    /// Documents to excerpt (reads stdin when none are given)
    pub files: Vec<PathBuf>,

    /// Index whose settings apply (default index when omitted)
    #[arg(long, short = 'i')]
    pub index: Option<String>,

    /// Maximum excerpt length in characters
    #[arg(long)]
    pub limit: Option<usize>,

    /// Words of context around each hit
    #[arg(long)]
    pub around: Option<usize>,

    /// Markup placed before each hit
    #[arg(long)]
    pub before_match: Option<String>,

    /// Markup placed after each hit
    #[arg(long)]
    pub after_match: Option<String>,

    /// Remove HTML tags before highlighting
    #[arg(long)]
    pub strip_html: bool,
}

/// Excerpts response
#[derive(Debug, Serialize)]
pub struct ExcerptsResponse {
    pub query: String,
    pub index: String,
    pub excerpts: Vec<String>,
}

/// Execute the excerpts command
pub async fn execute(
    args: ExcerptsArgs,
    services: &Arc<Services>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let docs = if args.files.is_empty() {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        vec![input]
    } else {
        args.files
            .iter()
            .map(|path| {
                std::fs::read_to_string(path)
                    .map_err(|e| format!("Cannot read '{}': {}", path.display(), e))
            })
            .collect::<Result<Vec<_>, _>>()?
    };

    let mut options = services.config.excerpts.clone();
    if let Some(limit) = args.limit {
        options.limit = limit;
    }
    if let Some(around) = args.around {
        options.around = around;
    }
    if let Some(before) = args.before_match {
        options.before_match = before;
    }
    if let Some(after) = args.after_match {
        options.after_match = after;
    }
    options.strip_html = args.strip_html;

    let mut bridge = services.bridge()?;
    bridge.search(&args.query, args.index.as_deref());
    let excerpts = bridge.excerpts(&docs, Some(&options))?;

    let response = ExcerptsResponse {
        query: args.query,
        index: bridge.index().to_string(),
        excerpts,
    };

    match format {
        OutputFormat::Human => {
            for excerpt in &response.excerpts {
                println!("{excerpt}");
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
