//! CLI adapter for searchbridge
//!
//! Provides a command-line interface over the core: building indexes,
//! searching with record hydration, excerpts and configuration.
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |     core/        |
//! |  (domain logic)  |
//! +--------+---------+
//!          |
//!          v
//! +------------------+
//! |      cli/        |
//! | (clap adapter)   |
//! +------------------+
//! ```

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// searchbridge - full-text search joined back to your database
///
/// Builds BM25 indexes from database tables and turns search matches
/// back into full records, in relevance order when asked to.
#[derive(Parser, Debug)]
#[command(name = "searchbridge")]
#[command(author = "RHOBIMD HEALTH")]
#[command(version)]
#[command(about = "Full-text search over relational records", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Emit logs as JSON (stderr)
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for scripting
    Json,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build search indexes from the configured tables
    Index(commands::IndexArgs),

    /// Search an index and print the matching records
    Search(commands::SearchArgs),

    /// Highlight a query in documents
    Excerpts(commands::ExcerptsArgs),

    /// List built and configured indexes
    #[command(name = "list-indexes")]
    ListIndexes(commands::ListIndexesArgs),

    /// Show current configuration
    #[command(name = "show-config")]
    ShowConfig(commands::ConfigArgs),

    /// Generate shell completion scripts
    ///
    /// Output completion script to stdout. To install:
    ///
    ///   bash:  searchbridge completions bash > ~/.local/share/bash-completion/completions/searchbridge
    ///   zsh:   searchbridge completions zsh > ~/.zfunc/_searchbridge
    ///   fish:  searchbridge completions fish > ~/.config/fish/completions/searchbridge.fish
    Completions(commands::CompletionsArgs),
}

/// Install the tracing subscriber (stderr, `RUST_LOG` aware)
pub fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "searchbridge=warn".into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Run the CLI with the provided arguments
pub async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    use crate::core::config::Config;
    use crate::core::services::Services;
    use crate::core::xdg::XdgDirs;
    use std::sync::Arc;

    // Handle completions command early (doesn't need services)
    if let Commands::Completions(args) = cli.command {
        return commands::completions::execute(args);
    }

    // Initialize XDG directories
    let xdg = XdgDirs::new();
    xdg.ensure_dirs_exist()?;
    xdg.log_paths();

    // Load configuration
    let config = Config::load_with_xdg(&xdg)?;
    config.log_config();

    // Create services
    let services = Arc::new(Services::new(config));

    // Execute command
    match cli.command {
        Commands::Index(args) => commands::index::execute(args, &services, cli.format).await,
        Commands::Search(args) => commands::search::execute(args, &services, cli.format).await,
        Commands::Excerpts(args) => {
            commands::excerpts::execute(args, &services, cli.format).await
        }
        Commands::ListIndexes(args) => {
            commands::list_indexes::execute(args, &services, cli.format).await
        }
        Commands::ShowConfig(args) => commands::config::execute(args, &services, cli.format).await,
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
