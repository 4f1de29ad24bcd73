//! Core domain logic (transport-agnostic)
//!
//! # Architecture
//!
//! - **config**: Configuration loading (TOML + environment)
//! - **error**: Error types and Result alias
//! - **types**: Domain data structures
//! - **xdg**: XDG directory handling
//! - **reconcile**: Search ids to records, in relevance or store order
//! - **storage**: Tantivy indexes, index catalog, SQLite record store
//! - **search**: BM25 backend, query options, excerpts
//! - **indexer**: Index builds from the record store
//! - **bridge**: Search facade (builder calls, `get`, excerpts)
//! - **services**: Unified service container

pub mod bridge;
pub mod config;
pub mod error;
pub mod indexer;
pub mod reconcile;
pub mod search;
pub mod services;
pub mod storage;
pub mod types;
pub mod xdg;

// Re-export key types for convenience
pub use bridge::SearchBridge;
pub use config::Config;
pub use error::{BridgeError, Result};
pub use reconcile::{reconcile, Keyed};
pub use services::Services;
