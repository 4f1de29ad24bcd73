//! Error types and error handling for searchbridge.
//!
//! This module defines the error types used throughout the
//! application. Errors raised by the search backend are passed
//! through unchanged; the store and mapping failures are the only
//! ones the reconciler produces itself.

use thiserror::Error;

/// Result type alias for searchbridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Main error type for searchbridge
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The record store could not serve a bulk fetch
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Deployment-time misconfiguration (mapping, identifier types, settings)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Search failed: {0}")]
    SearchFailed(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid query field '{field}': {message}")]
    InvalidQueryField {
        field: String,
        message: String,
        valid_fields: Vec<String>,
        suggestion: Option<String>,
    },

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Index already exists: {0}")]
    IndexAlreadyExists(String),

    #[error("Invalid index: {0}")]
    InvalidIndex(String),

    #[error("Indexing failed: {0}")]
    IndexingFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl BridgeError {
    /// Get user-friendly error message
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Check if this is a "not found" type error
    pub fn is_not_found(&self) -> bool {
        matches!(self, BridgeError::IndexNotFound(_))
    }

    /// Check if this is a bad request error (invalid input)
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            BridgeError::InvalidQuery(_) | BridgeError::InvalidQueryField { .. }
        )
    }

    /// Check if this error points at a misconfigured deployment
    pub fn is_configuration(&self) -> bool {
        matches!(self, BridgeError::ConfigError(_))
    }

    /// Check if the record store failed
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, BridgeError::StoreUnavailable(_))
    }
}
