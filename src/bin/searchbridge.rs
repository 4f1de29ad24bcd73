//! searchbridge CLI - full-text search over relational records
//!
//! # Examples
//!
//! ```bash
//! # Build every configured index
//! searchbridge index --all
//!
//! # Search and print records in relevance order
//! searchbridge search "rust async" --index articles --ordered --with author
//!
//! # List indexes
//! searchbridge list-indexes
//!
//! # Show configuration
//! searchbridge show-config
//! ```

use clap::Parser;
use searchbridge::cli::{init_logging, run, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
