//! Named index management.
//!
//! Each configured index lives in its own directory with a Tantivy
//! index and a metadata file recording the mapping it was built from.
//! Rebuilds are written under `staging/` and swapped in once committed.

use crate::core::config::IndexMapping;
use crate::core::error::{BridgeError, Result};
use crate::core::storage::index::{DocumentIndex, SCHEMA_VERSION};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Index metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    pub name: String,
    /// Mapping the index was built with
    pub mapping: IndexMapping,
    pub created_at: DateTime<Utc>,
    pub last_indexed_at: DateTime<Utc>,
    pub documents: usize,
    pub index_size_bytes: u64,
    pub schema_version: u32,
}

/// Catalog of named indexes under one root directory
#[derive(Debug, Clone)]
pub struct IndexCatalog {
    root: PathBuf,
}

impl IndexCatalog {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Root directory of the catalog
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_dir(&self, name: &str) -> PathBuf {
        self.root.join("indexes").join(name)
    }

    fn tantivy_dir(&self, name: &str) -> PathBuf {
        self.index_dir(name).join("tantivy")
    }

    fn metadata_path(&self, name: &str) -> PathBuf {
        self.index_dir(name).join("meta.json")
    }

    fn staging_dir(&self, name: &str) -> PathBuf {
        self.root.join("staging").join(name)
    }

    /// Create a new, empty index for a mapping
    pub fn create_index(&self, name: &str, mapping: &IndexMapping) -> Result<DocumentIndex> {
        let index_dir = self.index_dir(name);

        if index_dir.exists() {
            return Err(BridgeError::IndexAlreadyExists(name.to_string()));
        }

        init_index_dir(&index_dir, name, mapping)
    }

    /// Create an empty index under `staging/`, invisible to searches
    /// until [`promote_staged`](Self::promote_staged) moves it into place.
    ///
    /// Leftovers of an interrupted build are discarded first.
    pub fn create_staged(&self, name: &str, mapping: &IndexMapping) -> Result<DocumentIndex> {
        let staging_dir = self.staging_dir(name);

        if staging_dir.exists() {
            tracing::warn!("Discarding stale staged build of '{}'", name);
            fs::remove_dir_all(&staging_dir)?;
        }

        init_index_dir(&staging_dir, name, mapping)
    }

    /// Replace the live index `name` with its staged build
    pub fn promote_staged(&self, name: &str) -> Result<()> {
        let staging_dir = self.staging_dir(name);
        if !staging_dir.exists() {
            return Err(BridgeError::IndexNotFound(name.to_string()));
        }

        let index_dir = self.index_dir(name);
        fs::create_dir_all(self.root.join("indexes"))?;

        if index_dir.exists() {
            let replaced = self.root.join("staging").join(format!("{name}.replaced"));
            if replaced.exists() {
                fs::remove_dir_all(&replaced)?;
            }
            fs::rename(&index_dir, &replaced)?;
            fs::rename(&staging_dir, &index_dir)?;
            if let Err(e) = fs::remove_dir_all(&replaced) {
                tracing::warn!("Failed to remove replaced index '{}': {}", name, e);
            }
        } else {
            fs::rename(&staging_dir, &index_dir)?;
        }

        Ok(())
    }

    /// Drop the staged build of `name`, if any
    pub fn discard_staged(&self, name: &str) -> Result<()> {
        let staging_dir = self.staging_dir(name);
        if staging_dir.exists() {
            fs::remove_dir_all(staging_dir)?;
        }
        Ok(())
    }

    /// Open an existing index
    pub fn open_index(&self, name: &str) -> Result<DocumentIndex> {
        let tantivy_dir = self.tantivy_dir(name);

        if !tantivy_dir.exists() {
            return Err(BridgeError::IndexNotFound(name.to_string()));
        }

        let metadata = self.get_metadata(name)?;
        if metadata.schema_version < SCHEMA_VERSION {
            return Err(BridgeError::InvalidIndex(format!(
                "Index '{}' uses old schema version {} (current: v{}). \
                 Please rebuild it: searchbridge index {} --force",
                name, metadata.schema_version, SCHEMA_VERSION, name
            )));
        }

        DocumentIndex::open(&tantivy_dir)
    }

    pub fn index_exists(&self, name: &str) -> bool {
        self.index_dir(name).exists()
    }

    /// Delete an index and its metadata
    pub fn delete_index(&self, name: &str) -> Result<()> {
        let index_dir = self.index_dir(name);

        if !index_dir.exists() {
            return Err(BridgeError::IndexNotFound(name.to_string()));
        }

        fs::remove_dir_all(index_dir)?;
        Ok(())
    }

    /// Get index metadata
    pub fn get_metadata(&self, name: &str) -> Result<IndexMetadata> {
        let meta_path = self.metadata_path(name);

        if !meta_path.exists() {
            return Err(BridgeError::IndexNotFound(name.to_string()));
        }

        let contents = fs::read_to_string(&meta_path)?;
        let metadata: IndexMetadata = serde_json::from_str(&contents)?;

        Ok(metadata)
    }

    pub fn update_metadata(&self, name: &str, metadata: &IndexMetadata) -> Result<()> {
        write_metadata(&self.metadata_path(name), metadata)
    }

    /// Record a finished build: document count, size and timestamp
    pub fn record_build(&self, name: &str, documents: usize) -> Result<IndexMetadata> {
        let mut metadata = self.get_metadata(name)?;
        metadata.last_indexed_at = Utc::now();
        metadata.documents = documents;
        metadata.index_size_bytes = calculate_directory_size(&self.index_dir(name));

        self.update_metadata(name, &metadata)?;
        Ok(metadata)
    }

    /// List all indexes, sorted by name
    pub fn list_indexes(&self) -> Result<Vec<IndexMetadata>> {
        let indexes_dir = self.root.join("indexes");

        if !indexes_dir.exists() {
            return Ok(Vec::new());
        }

        let mut indexes = Vec::new();

        for entry in fs::read_dir(indexes_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    match self.get_metadata(name) {
                        Ok(metadata) => indexes.push(metadata),
                        Err(e) => tracing::warn!("Skipping index '{}': {}", name, e),
                    }
                }
            }
        }

        indexes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(indexes)
    }

    /// Full path to an index directory
    pub fn index_path(&self, name: &str) -> PathBuf {
        self.index_dir(name)
    }
}

/// Lay out a fresh index directory: Tantivy files plus initial metadata
fn init_index_dir(dir: &Path, name: &str, mapping: &IndexMapping) -> Result<DocumentIndex> {
    fs::create_dir_all(dir)?;

    let index = DocumentIndex::create(&dir.join("tantivy"), mapping)?;

    let now = Utc::now();
    let metadata = IndexMetadata {
        name: name.to_string(),
        mapping: mapping.clone(),
        created_at: now,
        last_indexed_at: now,
        documents: 0,
        index_size_bytes: 0,
        schema_version: SCHEMA_VERSION,
    };
    write_metadata(&dir.join("meta.json"), &metadata)?;

    Ok(index)
}

fn write_metadata(path: &Path, metadata: &IndexMetadata) -> Result<()> {
    let json = serde_json::to_string_pretty(metadata)?;
    fs::write(path, json)?;
    Ok(())
}

/// Calculate directory size recursively
fn calculate_directory_size(path: &Path) -> u64 {
    let mut total = 0;

    if path.is_dir() {
        if let Ok(entries) = fs::read_dir(path) {
            for entry in entries.filter_map(|e| e.ok()) {
                if let Ok(metadata) = entry.metadata() {
                    if metadata.is_dir() {
                        total += calculate_directory_size(&entry.path());
                    } else {
                        total += metadata.len();
                    }
                }
            }
        }
    }

    total
}
