//! Tantivy index wrapper.
//!
//! The schema of each index is derived from its [`IndexMapping`]:
//! full-text fields are tokenized and stored, attributes are stored
//! as fast numeric fields, and every document carries its store id.

use crate::core::config::{IndexMapping, DOC_ID_FIELD};
use crate::core::error::{BridgeError, Result};
use crate::core::types::{AttrValue, IndexDocument};
use std::path::Path;
use tantivy::schema::*;
use tantivy::{Index, IndexReader, IndexWriter, TantivyDocument};

/// Current schema version
/// Version 1: id, full-text fields, numeric attributes
pub const SCHEMA_VERSION: u32 = 1;

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Create the Tantivy schema for a mapping
///
/// Fields:
/// - `_docid`: store id (u64 | INDEXED | STORED | FAST)
/// - one TEXT | STORED field per full-text field
/// - one i64 / f64 INDEXED | STORED | FAST field per attribute
pub fn create_schema(mapping: &IndexMapping) -> Schema {
    let mut builder = Schema::builder();

    builder.add_u64_field(DOC_ID_FIELD, INDEXED | STORED | FAST);

    for field in &mapping.fields {
        builder.add_text_field(field, TEXT | STORED);
    }
    for attr in &mapping.int_attrs {
        builder.add_i64_field(attr, INDEXED | STORED | FAST);
    }
    for attr in &mapping.float_attrs {
        builder.add_f64_field(attr, INDEXED | STORED | FAST);
    }

    builder.build()
}

/// Tantivy index wrapper
pub struct DocumentIndex {
    index: Index,
    schema: Schema,

    /// Created on first write; searching never takes the writer lock
    writer: Option<IndexWriter>,
}

impl std::fmt::Debug for DocumentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentIndex")
            .field("schema", &"<schema>")
            .field("writable", &self.writer.is_some())
            .finish()
    }
}

impl DocumentIndex {
    /// Create a new index for a mapping at the given path
    pub fn create(index_dir: &Path, mapping: &IndexMapping) -> Result<Self> {
        let schema = create_schema(mapping);

        std::fs::create_dir_all(index_dir)?;

        let index = Index::create_in_dir(index_dir, schema.clone())
            .map_err(|e| BridgeError::IndexingFailed(format!("Failed to create index: {e}")))?;

        Ok(Self {
            index,
            schema,
            writer: None,
        })
    }

    /// Open an existing index
    pub fn open(index_dir: &Path) -> Result<Self> {
        let index = Index::open_in_dir(index_dir)
            .map_err(|e| BridgeError::SearchFailed(format!("Failed to open index: {e}")))?;

        let schema = index.schema();

        Ok(Self {
            index,
            schema,
            writer: None,
        })
    }

    fn writer(&mut self) -> Result<&mut IndexWriter> {
        if self.writer.is_none() {
            let writer = self
                .index
                .writer(WRITER_HEAP_BYTES)
                .map_err(|e| BridgeError::IndexingFailed(format!("Failed to create writer: {e}")))?;
            self.writer = Some(writer);
        }

        self.writer
            .as_mut()
            .ok_or_else(|| BridgeError::IndexingFailed("Index writer unavailable".to_string()))
    }

    fn field(&self, name: &str) -> Result<Field> {
        self.schema
            .get_field(name)
            .map_err(|e| BridgeError::IndexingFailed(format!("Missing {name} field: {e}")))
    }

    /// Add documents to the index (batch operation)
    pub fn add_documents(&mut self, documents: &[IndexDocument]) -> Result<()> {
        let id_field = self.field(DOC_ID_FIELD)?;

        let mut prepared = Vec::with_capacity(documents.len());
        for document in documents {
            let mut doc = TantivyDocument::default();
            doc.add_u64(id_field, document.id);

            for (name, text) in &document.text {
                doc.add_text(self.field(name)?, text);
            }

            for (name, value) in &document.attrs {
                let field = self.field(name)?;
                let is_float = matches!(
                    self.schema.get_field_entry(field).field_type(),
                    FieldType::F64(_)
                );
                match (value, is_float) {
                    (AttrValue::Int(v), false) => doc.add_i64(field, *v),
                    (AttrValue::Int(v), true) => doc.add_f64(field, *v as f64),
                    (AttrValue::Float(v), true) => doc.add_f64(field, *v),
                    (AttrValue::Float(v), false) => doc.add_i64(field, *v as i64),
                    (AttrValue::Text(v), _) => {
                        return Err(BridgeError::IndexingFailed(format!(
                            "Attribute '{name}' of document {} is not numeric: '{v}'",
                            document.id
                        )))
                    }
                }
            }

            prepared.push(doc);
        }

        let writer = self.writer()?;
        for doc in prepared {
            writer
                .add_document(doc)
                .map_err(|e| BridgeError::IndexingFailed(format!("Failed to add document: {e}")))?;
        }

        Ok(())
    }

    /// Commit changes to disk
    pub fn commit(&mut self) -> Result<()> {
        self.writer()?
            .commit()
            .map_err(|e| BridgeError::IndexingFailed(format!("Failed to commit: {e}")))?;
        Ok(())
    }

    /// Get an index reader for searching
    pub fn reader(&self) -> Result<IndexReader> {
        self.index
            .reader()
            .map_err(|e| BridgeError::SearchFailed(format!("Failed to create reader: {e}")))
    }

    /// Get the schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Get a reference to the underlying Tantivy index
    pub fn index(&self) -> &Index {
        &self.index
    }
}
