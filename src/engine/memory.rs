//! In-Memory Engine
//!
//! Ordered map of strings with an optional byte quota, behaving like the
//! local/session storage areas of a browser.

use std::collections::BTreeMap;

use crate::engine::{EngineError, EngineResult, KeyEnumeration, StorageEngine};

// == Memory Engine ==
/// Process-local string storage.
#[derive(Debug, Default, Clone)]
pub struct MemoryEngine {
    /// Raw records by key
    items: BTreeMap<String, String>,
    /// Maximum bytes (keys + values), None = unlimited
    quota: Option<usize>,
    /// Bytes currently used
    used: usize,
}

impl MemoryEngine {
    // == Constructor ==
    /// Creates an unbounded engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine that refuses writes once `quota` bytes are in use.
    ///
    /// A quota of 0 means unlimited.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: (quota > 0).then_some(quota),
            ..Self::default()
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Bytes currently accounted against the quota.
    pub fn used_bytes(&self) -> usize {
        self.used
    }
}

impl StorageEngine for MemoryEngine {
    fn get(&self, key: &str) -> EngineResult<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> EngineResult<()> {
        let released = self
            .items
            .get(key)
            .map(|old| key.len() + old.len())
            .unwrap_or(0);
        let needed = self.used - released + key.len() + value.len();

        if let Some(limit) = self.quota {
            if needed > limit {
                return Err(EngineError::QuotaExceeded { needed, limit });
            }
        }

        self.items.insert(key.to_string(), value.to_string());
        self.used = needed;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> EngineResult<()> {
        if let Some(old) = self.items.remove(key) {
            self.used -= key.len() + old.len();
        }
        Ok(())
    }

    fn clear(&mut self) -> EngineResult<()> {
        self.items.clear();
        self.used = 0;
        Ok(())
    }
}

impl KeyEnumeration for MemoryEngine {
    fn keys(&self) -> EngineResult<Vec<String>> {
        Ok(self.items.keys().cloned().collect())
    }
}
