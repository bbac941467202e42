//! In-process `KvStore` for tests and hosts without a filesystem.

use super::{KvStore, StorageError, StorageResult};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// Map-backed store with an optional per-value byte quota.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RefCell<BTreeMap<String, String>>,
    quota: Cell<Option<usize>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates one key, bypassing the quota.
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::default();
        store.entries.borrow_mut().insert(key.into(), value.into());
        store
    }

    /// Limits the size of any single value written through `set`.
    pub fn set_quota(&self, quota: Option<usize>) {
        self.quota.set(quota);
    }

    /// Raw stored value, for inspection.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if let Some(quota) = self.quota.get() {
            if value.len() > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    bytes: value.len(),
                    quota,
                });
            }
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryKvStore;
    use crate::storage::{KvStore, StorageError};

    #[test]
    fn quota_rejects_oversized_values_and_keeps_previous() {
        let store = MemoryKvStore::with_entry("k", "old");
        store.set_quota(Some(4));

        let err = store.set("k", "too long").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { bytes: 8, quota: 4, .. }));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("old"));

        store.set("k", "new").unwrap();
        assert_eq!(store.raw("k").as_deref(), Some("new"));
    }
}
