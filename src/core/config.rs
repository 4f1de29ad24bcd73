//! Configuration management for searchbridge.
//!
//! This module handles loading configuration from TOML files and
//! environment variables, with sensible defaults for all settings.
//! Besides backend and store settings, the configuration declares
//! one [`IndexMapping`] per logical index: how search documents are
//! built from store rows and how matches are hydrated back.

use crate::core::error::{BridgeError, Result};
use crate::core::search::excerpt::ExcerptOptions;
use crate::core::search::options::{Limits, MatchMode, QueryOptions, RankingMode, SortMode};
use crate::core::storage::is_safe_identifier;
use crate::core::xdg::XdgDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the document id field inside search indexes
pub const DOC_ID_FIELD: &str = "_docid";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Index used when a search names none
    #[serde(default)]
    pub default_index: Option<String>,

    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub excerpts: ExcerptOptions,

    /// Per-index mappings
    #[serde(default)]
    pub indexes: BTreeMap<String, IndexMapping>,

    /// Mapping used when one query spans several indexes
    #[serde(default)]
    pub mapping: Option<IndexMapping>,
}

/// Search backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Root directory for search indexes
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,
}

/// Record store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// SQLite database file
    #[serde(default = "default_database")]
    pub database: PathBuf,
}

/// Search defaults
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Matches per page
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Matches kept for paging
    #[serde(default = "default_max_matches")]
    pub max_matches: usize,

    /// Candidates examined per index (0 = no cutoff)
    #[serde(default = "default_cutoff")]
    pub cutoff: usize,

    /// Maximum query string length
    #[serde(default = "default_max_query_length")]
    pub max_query_length: usize,

    #[serde(default)]
    pub match_mode: MatchMode,

    #[serde(default)]
    pub ranking_mode: RankingMode,

    /// relevance, attr_desc, attr_asc or extended
    #[serde(default = "default_sort_mode")]
    pub sort_mode: String,

    /// Attribute or clause for non-relevance sort modes
    #[serde(default)]
    pub sort_by: Option<String>,
}

/// How one logical index maps to store rows
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IndexMapping {
    /// Store table holding the records
    pub table: String,

    /// Lookup column compared against search ids
    #[serde(default = "default_key_column")]
    pub column: String,

    /// Primary key, used for the store's own ordering
    #[serde(default = "default_key_column")]
    pub primary_key: String,

    /// Full-text fields
    #[serde(default)]
    pub fields: Vec<String>,

    /// Integer attributes (filters, sorting, grouping)
    #[serde(default)]
    pub int_attrs: Vec<String>,

    /// Float attributes
    #[serde(default)]
    pub float_attrs: Vec<String>,

    /// Relations available for eager loading
    #[serde(default)]
    pub relations: BTreeMap<String, RelationConfig>,
}

/// An eager-loadable relation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RelationConfig {
    /// Related table
    pub table: String,

    /// Column of the parent record
    pub local_key: String,

    /// Column of the related table matched against `local_key`
    #[serde(default = "default_key_column")]
    pub foreign_key: String,

    #[serde(default)]
    pub kind: RelationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// Attach a single object (or null)
    #[default]
    One,
    /// Attach an array
    Many,
}

// Default value functions
fn default_index_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_database() -> PathBuf {
    PathBuf::from("./app.db")
}

fn default_limit() -> usize {
    20
}

fn default_max_matches() -> usize {
    1000
}

fn default_cutoff() -> usize {
    1000
}

fn default_max_query_length() -> usize {
    500
}

fn default_sort_mode() -> String {
    "relevance".to_string()
}

fn default_key_column() -> String {
    "id".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            index_dir: default_index_dir(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_matches: default_max_matches(),
            cutoff: default_cutoff(),
            max_query_length: default_max_query_length(),
            match_mode: MatchMode::default(),
            ranking_mode: RankingMode::default(),
            sort_mode: default_sort_mode(),
            sort_by: None,
        }
    }
}

impl IndexMapping {
    /// Every attribute name (integer then float)
    pub fn attributes(&self) -> impl Iterator<Item = &String> {
        self.int_attrs.iter().chain(self.float_attrs.iter())
    }

    /// Validate identifiers and field declarations
    pub fn validate(&self, name: &str) -> Result<()> {
        self.validate_keys(name)?;

        if self.fields.is_empty() {
            return Err(BridgeError::ConfigError(format!(
                "Index '{name}': at least one full-text field is required"
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for field in self.fields.iter().chain(self.attributes()) {
            check_identifier(name, "field", field)?;
            if field == DOC_ID_FIELD {
                return Err(BridgeError::ConfigError(format!(
                    "Index '{name}': '{DOC_ID_FIELD}' is reserved"
                )));
            }
            if !seen.insert(field.as_str()) {
                return Err(BridgeError::ConfigError(format!(
                    "Index '{name}': '{field}' is declared twice"
                )));
            }
        }

        Ok(())
    }

    /// Validate what hydration needs: table, keys and relations.
    ///
    /// The global `[mapping]` is only used to fetch records, so it is
    /// checked with this alone.
    pub fn validate_keys(&self, name: &str) -> Result<()> {
        check_identifier(name, "table", &self.table)?;
        check_identifier(name, "column", &self.column)?;
        check_identifier(name, "primary key", &self.primary_key)?;

        for (rel_name, relation) in &self.relations {
            check_identifier(name, "relation name", rel_name)?;
            check_identifier(name, "relation table", &relation.table)?;
            check_identifier(name, "relation local key", &relation.local_key)?;
            check_identifier(name, "relation foreign key", &relation.foreign_key)?;
        }

        Ok(())
    }
}

fn check_identifier(index: &str, what: &str, ident: &str) -> Result<()> {
    if is_safe_identifier(ident) {
        Ok(())
    } else {
        Err(BridgeError::ConfigError(format!(
            "Index '{index}': invalid {what} '{ident}'"
        )))
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| BridgeError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Create default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config with priority: env vars > TOML > defaults
    pub fn load() -> Result<Self> {
        let xdg = XdgDirs::new();
        Self::load_with_xdg(&xdg)
    }

    /// Load config with explicit XDG directories
    ///
    /// Priority order:
    /// 1. SEARCHBRIDGE_CONFIG env var
    /// 2. XDG config file (~/.config/searchbridge/config.toml)
    /// 3. ./searchbridge.toml
    /// 4. Defaults
    pub fn load_with_xdg(xdg: &XdgDirs) -> Result<Self> {
        let mut config = if let Ok(config_path) = env::var("SEARCHBRIDGE_CONFIG") {
            Self::from_file(config_path)?
        } else {
            let xdg_config = xdg.config_file();
            if xdg_config.exists() {
                Self::from_file(xdg_config)?
            } else if Path::new("searchbridge.toml").exists() {
                Self::from_file("searchbridge.toml")?
            } else {
                Self::default()
            }
        };

        // Indexes live in the XDG data directory unless configured
        if config.backend.index_dir == default_index_dir() {
            config.backend.index_dir = xdg.data_dir.clone();
        }

        config.merge_env();
        config.validate()?;

        Ok(config)
    }

    /// Merge configuration with environment variables
    pub fn merge_env(&mut self) {
        if let Ok(data_dir) = env::var("SEARCHBRIDGE_DATA_DIR") {
            self.backend.index_dir = PathBuf::from(data_dir);
        }
        if let Ok(database) = env::var("SEARCHBRIDGE_DATABASE") {
            self.store.database = PathBuf::from(database);
        }

        if let Ok(limit) = env::var("SEARCHBRIDGE_DEFAULT_LIMIT") {
            if let Ok(l) = limit.parse() {
                self.search.default_limit = l;
            }
        }
        if let Ok(max_matches) = env::var("SEARCHBRIDGE_MAX_MATCHES") {
            if let Ok(m) = max_matches.parse() {
                self.search.max_matches = m;
            }
        }
        if let Ok(cutoff) = env::var("SEARCHBRIDGE_CUTOFF") {
            if let Ok(c) = cutoff.parse() {
                self.search.cutoff = c;
            }
        }
        if let Ok(max_query_len) = env::var("SEARCHBRIDGE_MAX_QUERY_LENGTH") {
            if let Ok(len) = max_query_len.parse() {
                self.search.max_query_length = len;
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.search.default_limit == 0 {
            return Err(BridgeError::ConfigError(
                "Default limit must be non-zero".to_string(),
            ));
        }

        if self.search.max_matches == 0 {
            return Err(BridgeError::ConfigError(
                "Max matches must be non-zero".to_string(),
            ));
        }

        if self.search.default_limit > self.search.max_matches {
            return Err(BridgeError::ConfigError(
                "Default limit cannot exceed max matches".to_string(),
            ));
        }

        if self.search.max_query_length == 0 {
            return Err(BridgeError::ConfigError(
                "Max query length must be non-zero".to_string(),
            ));
        }

        SortMode::from_parts(&self.search.sort_mode, self.search.sort_by.as_deref())
            .map_err(|e| BridgeError::ConfigError(e.to_string()))?;

        for (name, mapping) in &self.indexes {
            if !is_safe_identifier(name) {
                return Err(BridgeError::ConfigError(format!(
                    "Invalid index name '{name}'"
                )));
            }
            mapping.validate(name)?;
        }

        if let Some(mapping) = &self.mapping {
            mapping.validate_keys("mapping")?;
        }

        if let Some(default) = &self.default_index {
            if !self.indexes.contains_key(default) {
                return Err(BridgeError::ConfigError(format!(
                    "Default index '{default}' is not configured"
                )));
            }
        }

        Ok(())
    }

    /// Index searched when none is named: `default_index`, else the first by name
    pub fn default_index_name(&self) -> Option<&str> {
        self.default_index
            .as_deref()
            .or_else(|| self.indexes.keys().next().map(String::as_str))
    }

    /// Mapping that hydrates matches of an index selector.
    ///
    /// A selector naming several indexes needs the global `mapping`.
    pub fn mapping_for(&self, selector: &str) -> Result<&IndexMapping> {
        let names = split_index_selector(selector);
        if names.len() == 1 && names[0] != "*" {
            return self.indexes.get(names[0]).ok_or_else(|| {
                BridgeError::ConfigError(format!("No mapping configured for index '{}'", names[0]))
            });
        }

        self.mapping.as_ref().ok_or_else(|| {
            BridgeError::ConfigError(format!(
                "Searching '{selector}' spans several indexes; configure a [mapping] section"
            ))
        })
    }

    /// Query options seeded from the search defaults
    pub fn default_options(&self) -> Result<QueryOptions> {
        Ok(QueryOptions {
            match_mode: self.search.match_mode,
            ranking_mode: self.search.ranking_mode,
            sort: SortMode::from_parts(&self.search.sort_mode, self.search.sort_by.as_deref())?,
            limits: Limits {
                offset: 0,
                limit: self.search.default_limit,
                max_matches: self.search.max_matches,
                cutoff: self.search.cutoff,
            },
            ..Default::default()
        })
    }

    /// Log configuration
    pub fn log_config(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Index dir: {:?}", self.backend.index_dir);
        tracing::info!("  Database: {:?}", self.store.database);
        tracing::info!("  Default limit: {}", self.search.default_limit);
        tracing::info!("  Max matches: {}", self.search.max_matches);
        tracing::info!("  Cutoff: {}", self.search.cutoff);
        tracing::info!("  Max query length: {}", self.search.max_query_length);
        tracing::info!("  Match mode: {:?}", self.search.match_mode);
        tracing::info!("  Sort mode: {}", self.search.sort_mode);
        tracing::info!("  Indexes: {} configured", self.indexes.len());
    }
}

/// Split an index selector on commas and whitespace
pub fn split_index_selector(selector: &str) -> Vec<&str> {
    selector
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect()
}
