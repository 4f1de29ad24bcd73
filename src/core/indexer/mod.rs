//! Index building.
//!
//! Reads rows through a [`DocumentSource`](crate::core::storage::DocumentSource)
//! and writes them into a fresh search index, one index per mapping.

pub mod pipeline;

pub use pipeline::IndexingPipeline;
