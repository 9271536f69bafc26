//! Error types for cmdsafe core operations.
//!
//! This module defines the error hierarchy for all core operations.
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-friendly messages. Messages name handles and failing stages,
//! never key material or decrypted content.

use thiserror::Error;

/// Result type alias for cmdsafe operations.
pub type Result<T> = std::result::Result<T, CmdsafeError>;

/// Core error type for cmdsafe operations.
#[derive(Debug, Error)]
pub enum CmdsafeError {
    /// Bad cost parameters or entropy failure while deriving a user key
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Unknown cipher or KDF tag in a loaded envelope
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// HMAC mismatch: tampered envelope or wrong passphrase
    #[error("Invalid signature, the data may have been tampered with")]
    Integrity,

    /// The fast key-hash pre-check rejected the passphrase
    #[error("Incorrect passphrase")]
    IncorrectPassphrase,

    /// Decrypted record was stored under a different handle
    #[error("Stored record does not belong to handle \"{0}\"")]
    HandleMismatch(String),

    /// No record stored under the handle
    #[error("{0} not found")]
    HandleNotFound(String),

    /// A record already exists and replacing was not requested
    #[error("Cannot replace existing entry for {0}")]
    HandleExists(String),

    /// The child process could not be launched
    #[error("{handle} failed to start: {source}")]
    ProcessStart {
        handle: String,
        #[source]
        source: std::io::Error,
    },

    /// The child process was launched but could not be awaited
    #[error("{handle} could not be supervised: {source}")]
    ProcessWait {
        handle: String,
        #[source]
        source: std::io::Error,
    },

    /// Cipher or random number generator failure
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Storage backend error (generic)
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite-specific storage error
    #[error("SQLite error: {source}")]
    Sqlite {
        #[from]
        source: rusqlite::Error,
    },

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl CmdsafeError {
    /// True for failures that mean the stored envelope must not be trusted.
    pub fn is_tampering(&self) -> bool {
        matches!(
            self,
            CmdsafeError::Integrity
                | CmdsafeError::UnsupportedAlgorithm(_)
                | CmdsafeError::HandleMismatch(_)
        )
    }
}
