//! Relational record store.
//!
//! [`RecordStore`] is the seam the bridge hydrates matches through:
//! one bulk `WHERE column IN (...)` fetch per search, plus one query
//! per eager-loaded relation. [`SqliteStore`] implements it (and the
//! indexer's [`DocumentSource`]) on top of rusqlite.

use crate::core::config::{IndexMapping, RelationKind};
use crate::core::error::{BridgeError, Result};
use crate::core::types::{AttrValue, DocId, IndexDocument, Record};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags};
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Bulk record lookup by search identifiers
pub trait RecordStore: Send + Sync {
    /// Fetch the records whose lookup column is in `ids`.
    ///
    /// Records come back in the store's own order (primary key), with
    /// each named relation attached under its name.
    fn fetch_by_ids(
        &self,
        mapping: &IndexMapping,
        ids: &[DocId],
        relations: &[String],
    ) -> Result<Vec<Record>>;
}

/// Rows to build a search index from
pub trait DocumentSource: Send + Sync {
    fn scan_documents(&self, mapping: &IndexMapping) -> Result<Vec<IndexDocument>>;
}

/// Whether a name can be spliced into SQL as an identifier
pub fn is_safe_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 64 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn quote(ident: &str) -> Result<String> {
    if is_safe_identifier(ident) {
        Ok(format!("\"{ident}\""))
    } else {
        Err(BridgeError::ConfigError(format!(
            "Invalid SQL identifier '{ident}'"
        )))
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn store_error(e: rusqlite::Error) -> BridgeError {
    BridgeError::StoreUnavailable(e.to_string())
}

/// SQLite-backed record store.
///
/// The database is opened read-only on first use, so a missing file
/// only fails the operations that need it.
pub struct SqliteStore {
    path: Option<PathBuf>,
    conn: Mutex<Option<Connection>>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("path", &self.path)
            .finish()
    }
}

impl SqliteStore {
    /// Store over the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            conn: Mutex::new(None),
        }
    }

    /// Store over an existing connection (used with in-memory databases)
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            path: None,
            conn: Mutex::new(Some(conn)),
        }
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| BridgeError::StoreUnavailable("Connection lock poisoned".to_string()))?;

        if guard.is_none() {
            let path = self.path.as_ref().ok_or_else(|| {
                BridgeError::StoreUnavailable("No database configured".to_string())
            })?;
            tracing::debug!("Opening database {:?}", path);
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(|e| {
                BridgeError::StoreUnavailable(format!("Cannot open database {path:?}: {e}"))
            })?;
            *guard = Some(conn);
        }

        match guard.as_ref() {
            Some(conn) => f(conn),
            None => Err(BridgeError::StoreUnavailable(
                "Database connection unavailable".to_string(),
            )),
        }
    }

    fn query_records(conn: &Connection, sql: &str, params: &[SqlValue]) -> Result<Vec<Record>> {
        tracing::trace!("SQL: {} ({} params)", sql, params.len());

        let mut stmt = conn.prepare(sql).map_err(store_error)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params_from_iter(params.iter())).map_err(store_error)?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().map_err(store_error)? {
            let mut map = Map::new();
            for (i, column) in columns.iter().enumerate() {
                let value = row.get_ref(i).map_err(store_error)?;
                map.insert(column.clone(), to_json(value));
            }
            records.push(Record::from(map));
        }

        Ok(records)
    }

    fn attach_relation(
        conn: &Connection,
        mapping: &IndexMapping,
        name: &str,
        records: &mut [Record],
    ) -> Result<()> {
        let relation = mapping.relations.get(name).ok_or_else(|| {
            BridgeError::ConfigError(format!(
                "Unknown relation '{name}' for table '{}'",
                mapping.table
            ))
        })?;

        // Distinct parent keys, keyed by their JSON rendering
        let mut keys: Vec<SqlValue> = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for record in records.iter() {
            let value = record.get(&relation.local_key).ok_or_else(|| {
                BridgeError::ConfigError(format!(
                    "Relation '{name}': column '{}' is missing from '{}'",
                    relation.local_key, mapping.table
                ))
            })?;
            if let Some(sql_value) = to_sql(value) {
                if seen.insert(value.to_string()) {
                    keys.push(sql_value);
                }
            }
        }

        let mut related: HashMap<String, Vec<Value>> = HashMap::new();
        if !keys.is_empty() {
            let sql = format!(
                "SELECT * FROM {} WHERE {} IN ({})",
                quote(&relation.table)?,
                quote(&relation.foreign_key)?,
                placeholders(keys.len())
            );
            for row in Self::query_records(conn, &sql, &keys)? {
                let key = row
                    .get(&relation.foreign_key)
                    .map(Value::to_string)
                    .unwrap_or_default();
                related
                    .entry(key)
                    .or_default()
                    .push(Value::Object(row.into_map()));
            }
        }

        for record in records.iter_mut() {
            let rows = record
                .get(&relation.local_key)
                .and_then(|v| related.get(&v.to_string()));
            let value = match relation.kind {
                RelationKind::One => rows
                    .and_then(|rows| rows.first().cloned())
                    .unwrap_or(Value::Null),
                RelationKind::Many => Value::Array(rows.cloned().unwrap_or_default()),
            };
            record.insert(name, value);
        }

        Ok(())
    }
}

impl RecordStore for SqliteStore {
    fn fetch_by_ids(
        &self,
        mapping: &IndexMapping,
        ids: &[DocId],
        relations: &[String],
    ) -> Result<Vec<Record>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let params = ids
            .iter()
            .map(|&id| {
                i64::try_from(id).map(SqlValue::Integer).map_err(|_| {
                    BridgeError::ConfigError(format!(
                        "Id {id} does not fit the lookup column '{}'",
                        mapping.column
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let sql = format!(
            "SELECT * FROM {} WHERE {} IN ({}) ORDER BY {}",
            quote(&mapping.table)?,
            quote(&mapping.column)?,
            placeholders(params.len()),
            quote(&mapping.primary_key)?
        );

        self.with_conn(|conn| {
            let mut records = Self::query_records(conn, &sql, &params)?;
            for name in relations {
                Self::attach_relation(conn, mapping, name, &mut records)?;
            }
            Ok(records)
        })
    }
}

impl DocumentSource for SqliteStore {
    fn scan_documents(&self, mapping: &IndexMapping) -> Result<Vec<IndexDocument>> {
        let mut columns = vec![quote(&mapping.column)?];
        for name in mapping.fields.iter().chain(mapping.attributes()) {
            columns.push(quote(name)?);
        }

        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            columns.join(", "),
            quote(&mapping.table)?,
            quote(&mapping.primary_key)?
        );

        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql).map_err(store_error)?;
            let mut rows = stmt.query([]).map_err(store_error)?;
            let mut documents = Vec::new();

            while let Some(row) = rows.next().map_err(store_error)? {
                let id = match row.get_ref(0).map_err(store_error)? {
                    ValueRef::Integer(i) if i >= 0 => i as DocId,
                    other => {
                        return Err(BridgeError::ConfigError(format!(
                            "Column '{}' of '{}' must hold unsigned integer ids, found {:?}",
                            mapping.column,
                            mapping.table,
                            to_json(other)
                        )))
                    }
                };

                let mut text = BTreeMap::new();
                for (i, field) in mapping.fields.iter().enumerate() {
                    let value = match row.get_ref(i + 1).map_err(store_error)? {
                        ValueRef::Null => continue,
                        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
                        ValueRef::Integer(v) => v.to_string(),
                        ValueRef::Real(v) => v.to_string(),
                        ValueRef::Blob(_) => continue,
                    };
                    text.insert(field.clone(), value);
                }

                let mut attrs = BTreeMap::new();
                for (i, attr) in mapping.attributes().enumerate() {
                    let value = match row
                        .get_ref(i + 1 + mapping.fields.len())
                        .map_err(store_error)?
                    {
                        ValueRef::Null => continue,
                        ValueRef::Integer(v) => AttrValue::Int(v),
                        ValueRef::Real(v) => AttrValue::Float(v),
                        ValueRef::Text(t) => parse_numeric(attr, &String::from_utf8_lossy(t))?,
                        ValueRef::Blob(_) => {
                            return Err(BridgeError::ConfigError(format!(
                                "Attribute '{attr}' of document {id} is a blob"
                            )))
                        }
                    };
                    attrs.insert(attr.clone(), value);
                }

                documents.push(IndexDocument { id, text, attrs });
            }

            Ok(documents)
        })
    }
}

fn parse_numeric(attr: &str, text: &str) -> Result<AttrValue> {
    let text = text.trim();
    if let Ok(v) = text.parse::<i64>() {
        return Ok(AttrValue::Int(v));
    }
    text.parse::<f64>().map(AttrValue::Float).map_err(|_| {
        BridgeError::ConfigError(format!("Attribute '{attr}' is not numeric: '{text}'"))
    })
}

/// Convert a SQLite value to JSON (blobs become base64 strings)
fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(STANDARD.encode(b)),
    }
}

/// Convert a JSON key back to a SQL parameter (`None` for null/composite)
fn to_sql(value: &Value) -> Option<SqlValue> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real)),
        Value::String(s) => Some(SqlValue::Text(s.clone())),
        Value::Bool(b) => Some(SqlValue::Integer(i64::from(*b))),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
