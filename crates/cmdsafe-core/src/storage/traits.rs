//! Storage backend trait definition.
//!
//! The `CommandStore` trait defines the interface that all storage backends
//! must implement: a map from handle to opaque envelope bytes. Backends never
//! see plaintext; encryption happens in the vault before `put`.

use chrono::{DateTime, Utc};

use crate::error::Result;

/// A stored handle and when its envelope was last written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCommand {
    pub handle: String,
    pub saved_at: DateTime<Utc>,
}

/// Handle-keyed storage for encrypted command envelopes.
///
/// All implementations must ensure:
/// - Every operation is atomic for a single handle
/// - Partial writes are never observable
/// - Readers may run concurrently; writers exclude everything else
/// - Resources held by an operation are released on every exit path
pub trait CommandStore: Send + Sync {
    /// Fetch the envelope bytes stored under `handle`.
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(bytes))` if found, `Ok(None)` if not found.
    fn get(&self, handle: &str) -> Result<Option<Vec<u8>>>;

    /// Store `data` under `handle`.
    ///
    /// # Errors
    ///
    /// Returns `CmdsafeError::HandleExists` if an entry exists and `replace`
    /// is false. The existing entry is left untouched.
    fn put(&self, handle: &str, data: &[u8], replace: bool) -> Result<()>;

    /// Remove the entry stored under `handle`.
    ///
    /// # Errors
    ///
    /// Returns `CmdsafeError::HandleNotFound` if there is no such entry.
    fn delete(&self, handle: &str) -> Result<()>;

    /// All stored handles, sorted.
    fn list_handles(&self) -> Result<Vec<String>> {
        Ok(self
            .list_entries()?
            .into_iter()
            .map(|entry| entry.handle)
            .collect())
    }

    /// All stored handles with their save times, sorted by handle.
    fn list_entries(&self) -> Result<Vec<StoredCommand>>;
}
