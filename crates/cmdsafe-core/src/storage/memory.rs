//! In-memory storage backend.
//!
//! Useful for tests and for embedding the vault where persistence is
//! handled elsewhere.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::error::{CmdsafeError, Result};
use crate::storage::traits::{CommandStore, StoredCommand};

/// A `CommandStore` held in a reader/writer-locked map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, (Vec<u8>, DateTime<Utc>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, (Vec<u8>, DateTime<Utc>)>>> {
        self.entries
            .read()
            .map_err(|_| CmdsafeError::Storage("Memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, (Vec<u8>, DateTime<Utc>)>>> {
        self.entries
            .write()
            .map_err(|_| CmdsafeError::Storage("Memory store lock poisoned".to_string()))
    }
}

impl CommandStore for MemoryStore {
    fn get(&self, handle: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.read()?.get(handle).map(|(data, _)| data.clone()))
    }

    fn put(&self, handle: &str, data: &[u8], replace: bool) -> Result<()> {
        let mut entries = self.write()?;
        if !replace && entries.contains_key(handle) {
            return Err(CmdsafeError::HandleExists(handle.to_string()));
        }
        entries.insert(handle.to_string(), (data.to_vec(), Utc::now()));
        Ok(())
    }

    fn delete(&self, handle: &str) -> Result<()> {
        self.write()?
            .remove(handle)
            .map(|_| ())
            .ok_or_else(|| CmdsafeError::HandleNotFound(handle.to_string()))
    }

    fn list_entries(&self) -> Result<Vec<StoredCommand>> {
        Ok(self
            .read()?
            .iter()
            .map(|(handle, (_, saved_at))| StoredCommand {
                handle: handle.clone(),
                saved_at: *saved_at,
            })
            .collect())
    }
}
