//! Storage layer: search indexes and the record store.
//!
//! # Architecture
//!
//! - **DocumentIndex**: Wraps Tantivy index operations
//! - **IndexCatalog**: Manages named indexes and their metadata
//! - **SqliteStore**: Bulk record lookup and index source rows
//!
//! # Index Storage Structure
//!
//! ```text
//! {index_dir}/indexes/
//! ├── {index-name}/
//! │   ├── meta.json           # Index metadata (mapping, counts)
//! │   └── tantivy/            # Tantivy index
//! │       ├── meta.json
//! │       └── [segment files]
//! ```

mod catalog;
mod index;
mod records;

pub use catalog::{IndexCatalog, IndexMetadata};
pub use index::{create_schema, DocumentIndex, SCHEMA_VERSION};
pub use records::{is_safe_identifier, DocumentSource, RecordStore, SqliteStore};
