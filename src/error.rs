//! Error types for TideKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using TideError
pub type Result<T> = std::result::Result<T, TideError>;

/// Unified error type for TideKV operations
#[derive(Debug, Error)]
pub enum TideError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Record / Storage Errors
    // -------------------------------------------------------------------------
    /// A WAL or segment record (or header) failed to decode fully
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// Key or value does not fit the 32-bit length prefix
    #[error("{field} too large: {len} bytes (max {})", u32::MAX)]
    RecordTooLarge { field: &'static str, len: usize },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// ERROR response relayed by a client
    #[error("Server error: {0}")]
    Server(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TideError {
    /// True for the expected "absent or deleted" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, TideError::KeyNotFound)
    }
}

impl From<bincode::Error> for TideError {
    fn from(err: bincode::Error) -> Self {
        TideError::Serialization(err.to_string())
    }
}
