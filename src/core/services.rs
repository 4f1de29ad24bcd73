//! Unified service container for searchbridge
//!
//! Provides shared access to all core services.

use crate::core::bridge::SearchBridge;
use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::indexer::IndexingPipeline;
use crate::core::search::TantivyBackend;
use crate::core::storage::{IndexCatalog, SqliteStore};
use std::sync::Arc;

/// Bridge over the default backend and store
pub type DefaultBridge = SearchBridge<TantivyBackend, SqliteStore>;

/// Unified services container
#[derive(Clone)]
pub struct Services {
    /// Catalog of named search indexes
    pub catalog: Arc<IndexCatalog>,

    /// BM25 search backend
    pub backend: Arc<TantivyBackend>,

    /// Record store for hydration and index builds
    pub store: Arc<SqliteStore>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl Services {
    /// Create services from configuration
    pub fn new(config: Config) -> Self {
        let catalog = Arc::new(IndexCatalog::new(config.backend.index_dir.clone()));
        let backend = Arc::new(TantivyBackend::new(Arc::clone(&catalog)));
        let store = Arc::new(SqliteStore::open(&config.store.database));

        Self {
            catalog,
            backend,
            store,
            config: Arc::new(config),
        }
    }

    /// A fresh bridge with the configured defaults
    ///
    /// Bridges carry per-search state, so each search gets its own.
    pub fn bridge(&self) -> Result<DefaultBridge> {
        SearchBridge::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.store),
            Arc::clone(&self.config),
        )
    }

    /// Pipeline building indexes from the record store
    pub fn create_pipeline(&self) -> IndexingPipeline {
        IndexingPipeline::new(Arc::clone(&self.catalog), self.store.clone())
    }
}
