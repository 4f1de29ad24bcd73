//! Indexing pipeline orchestration.
//!
//! Coordinates building one search index from the record store:
//! 1. Validate the mapping
//! 2. Scan source rows into documents
//! 3. Write documents in batches into a staged index
//! 4. Commit, swap the staged index in and record metadata

use std::sync::Arc;
use std::time::Instant;

use crate::core::config::IndexMapping;
use crate::core::error::{BridgeError, Result};
use crate::core::storage::{is_safe_identifier, DocumentIndex, DocumentSource, IndexCatalog};
use crate::core::types::{IndexDocument, IndexStats};

const BATCH_SIZE: usize = 1000;

/// Builds search indexes from store rows
pub struct IndexingPipeline {
    catalog: Arc<IndexCatalog>,
    source: Arc<dyn DocumentSource>,
}

impl IndexingPipeline {
    pub fn new(catalog: Arc<IndexCatalog>, source: Arc<dyn DocumentSource>) -> Self {
        Self { catalog, source }
    }

    /// Build the index `name` from its mapping
    ///
    /// # Arguments
    ///
    /// * `name` - Index name
    /// * `mapping` - How rows become documents
    /// * `force` - Replace an existing index instead of failing
    ///
    /// # Errors
    ///
    /// Returns `IndexAlreadyExists` if the index exists and `force` is
    /// false. A failed build leaves the previous index (if any) untouched.
    pub fn build_index(&self, name: &str, mapping: &IndexMapping, force: bool) -> Result<IndexStats> {
        let start = Instant::now();

        if !is_safe_identifier(name) {
            return Err(BridgeError::ConfigError(format!("Invalid index name '{name}'")));
        }
        mapping.validate(name)?;

        let replacing = self.catalog.index_exists(name);
        if replacing && !force {
            return Err(BridgeError::IndexAlreadyExists(name.to_string()));
        }

        tracing::info!("Scanning table '{}' for index '{}'", mapping.table, name);
        let documents = self.source.scan_documents(mapping)?;
        tracing::info!("Found {} row(s) to index", documents.len());

        let mut index = self.catalog.create_staged(name, mapping)?;
        let written = write_batches(&mut index, &documents);
        drop(index);

        if let Err(e) = written {
            if let Err(cleanup) = self.catalog.discard_staged(name) {
                tracing::warn!("Failed to remove partial index '{}': {}", name, cleanup);
            }
            return Err(e);
        }

        if replacing {
            tracing::info!("Replacing existing index '{}'", name);
        }
        self.catalog.promote_staged(name)?;
        self.catalog.record_build(name, documents.len())?;

        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Indexed {} document(s) into '{}' in {}ms",
            documents.len(),
            name,
            duration_ms
        );

        Ok(IndexStats {
            index: name.to_string(),
            documents: documents.len(),
            duration_ms,
        })
    }
}

fn write_batches(index: &mut DocumentIndex, documents: &[IndexDocument]) -> Result<()> {
    let mut written = 0;
    for batch in documents.chunks(BATCH_SIZE) {
        index.add_documents(batch)?;
        written += batch.len();
        if written < documents.len() {
            tracing::info!("Progress: {}/{} documents written", written, documents.len());
        }
    }
    index.commit()
}
