//! Error types for itemdb
//!
//! Provides a unified error type for the store and the ingestion pipeline.

use thiserror::Error;

/// Result type alias using ItemDbError
pub type Result<T> = std::result::Result<T, ItemDbError>;

/// Unified error type for itemdb operations
#[derive(Debug, Error)]
pub enum ItemDbError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Failed to open store: {0}")]
    Open(String),

    #[error("Write failed: {0}")]
    Write(String),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // -------------------------------------------------------------------------
    // Ingestion Errors
    // -------------------------------------------------------------------------
    #[error("request failed: {0}")]
    Network(String),

    #[error("API returned status: {code}")]
    HttpStatus { code: u16 },

    #[error("failed to read body: {0}")]
    Read(String),

    #[error("failed to parse payload: {0}")]
    Parse(String),

    #[error("ingest service is shut down")]
    Shutdown,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ItemDbError {
    /// Whether a retry of the same operation could plausibly succeed.
    ///
    /// Transport failures and 5xx/429 responses are transient; every other
    /// HTTP status is a permanent upstream rejection.
    pub fn is_transient(&self) -> bool {
        match self {
            ItemDbError::Network(_) | ItemDbError::Read(_) => true,
            ItemDbError::HttpStatus { code } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}
