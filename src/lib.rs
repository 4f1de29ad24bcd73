//! searchbridge - Full-text search joined back to relational records
//!
//! Runs BM25 queries over Tantivy indexes built from a SQLite
//! database, then hydrates the matching document ids into full rows
//! with one bulk `WHERE IN` fetch, optionally in relevance order.
//!
//! # Architecture
//!
//! - **core**: Domain logic
//!   - config, error, types, xdg
//!   - reconcile (ids to records)
//!   - storage (index catalog, Tantivy, SQLite)
//!   - search (BM25 backend, options, excerpts)
//!   - indexer (index builds)
//!   - bridge (search facade), services (container)
//!
//! - **cli**: Command-line adapter (depends on core)
//!
//! # Key Features
//!
//! - One store round trip per search, never N+1
//! - Relevance order restored in process, no store-specific SQL
//! - Sphinx-style builder calls: match modes, filters, grouping, geo distance
//! - Eager loading of configured relations

// Core domain logic
pub mod core;

// Command-line adapter
pub mod cli;

// Re-export commonly used types for convenience
pub use core::config::Config;
pub use core::error::{BridgeError, Result};
pub use core::services::Services;
pub use core::types::*;
