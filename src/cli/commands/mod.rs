//! CLI command implementations
//!
//! Each command module handles argument parsing and execution for one CLI command.

pub mod completions;
pub mod config;
pub mod excerpts;
pub mod index;
pub mod list_indexes;
pub mod search;

// Re-export argument types for use in mod.rs
pub use completions::CompletionsArgs;
pub use config::ConfigArgs;
pub use excerpts::ExcerptsArgs;
pub use index::IndexArgs;
pub use list_indexes::ListIndexesArgs;
pub use search::SearchArgs;
