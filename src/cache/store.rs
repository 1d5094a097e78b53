//! Entry Store Module
//!
//! Wraps one storage engine and layers expiration and read-only semantics on
//! top of it. Expired entries are only ever removed when they are read.

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{record, Clock, Entry, SetOptions, SystemClock};
use crate::engine::{KeyEnumeration, StorageEngine};
use crate::error::{CacheError, Result};

// == Entry Store ==
/// Metadata layer over a single storage engine.
#[derive(Debug)]
pub struct EntryStore<E, C = SystemClock> {
    /// Backing engine, fixed for the store's lifetime
    engine: E,
    /// Time source for creation and expiration checks
    clock: C,
}

impl<E: StorageEngine> EntryStore<E> {
    // == Constructor ==
    /// Creates a store over `engine` using wall-clock time.
    pub fn new(engine: E) -> Self {
        Self::with_clock(engine, SystemClock)
    }
}

impl<E: StorageEngine, C: Clock> EntryStore<E, C> {
    /// Creates a store over `engine` with an explicit clock.
    pub fn with_clock(engine: E, clock: C) -> Self {
        Self { engine, clock }
    }

    /// Returns the wrapped engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Returns the wrapped engine mutably, bypassing every store rule.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Consumes the store and hands back the engine.
    pub fn into_engine(self) -> E {
        self.engine
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // == Read Raw ==
    /// Reads the complete entry under `key`.
    ///
    /// Strings that are not records come back as foreign entries. An expired
    /// entry is removed from the engine and reported as absent.
    pub fn read_raw(&mut self, key: &str) -> Option<Entry> {
        let now = self.clock.now();
        self.read_at(key, now)
    }

    fn read_at(&mut self, key: &str, now: i64) -> Option<Entry> {
        let raw = match self.engine.get(key) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return None,
            Err(err) => {
                warn!("Read of '{}' failed: {}", key, err);
                return None;
            }
        };

        let entry = record::decode(&raw).unwrap_or_else(|| Entry::foreign(raw));

        if entry.is_expired_at(now) {
            debug!("Evicting expired key '{}'", key);
            if let Err(err) = self.engine.remove(key) {
                warn!("Eviction of expired key '{}' failed: {}", key, err);
            }
            return None;
        }

        Some(entry)
    }

    // == Get ==
    /// Returns the value under `key`, or None if absent or expired.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        self.read_raw(key).map(|entry| entry.value)
    }

    /// Like [`get`](Self::get), deserializing into `T`.
    ///
    /// A value of the wrong shape is reported as None.
    pub fn get_as<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(err) => {
                debug!("Value under '{}' has an unexpected shape: {}", key, err);
                None
            }
        }
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// Returns false if the existing entry is read-only, the options are
    /// invalid, or the engine refuses the write.
    pub fn set<V: Serialize>(&mut self, key: &str, value: V, options: SetOptions) -> bool {
        match self.try_set(key, value, options) {
            Ok(()) => true,
            Err(err) => {
                warn!("Write of '{}' refused: {}", key, err);
                false
            }
        }
    }

    /// Fallible form of [`set`](Self::set).
    pub fn try_set<V: Serialize>(&mut self, key: &str, value: V, options: SetOptions) -> Result<()> {
        let now = self.clock.now();

        if self.read_at(key, now).is_some_and(|entry| entry.read_only) {
            return Err(CacheError::ReadOnly(key.to_string()));
        }

        let ttl = options.ttl()?;
        let value = serde_json::to_value(value).map_err(|err| {
            CacheError::InvalidRequest(format!("value is not serializable: {}", err))
        })?;

        let entry = Entry::new(value, now, ttl, options.read_only);
        self.engine.set(key, &record::encode(&entry))?;

        debug!(
            "Stored '{}' (expires_at={:?}, read_only={})",
            key, entry.expires_at, entry.read_only
        );
        Ok(())
    }

    // == Remove ==
    /// Removes `key` unless its entry is read-only.
    ///
    /// Removing an absent key succeeds.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.try_remove(key) {
            Ok(()) => true,
            Err(err) => {
                warn!("Removal of '{}' refused: {}", key, err);
                false
            }
        }
    }

    /// Fallible form of [`remove`](Self::remove).
    pub fn try_remove(&mut self, key: &str) -> Result<()> {
        if self.read_raw(key).is_some_and(|entry| entry.read_only) {
            return Err(CacheError::ReadOnly(key.to_string()));
        }

        self.engine.remove(key)?;
        debug!("Removed '{}'", key);
        Ok(())
    }

    // == Clear ==
    /// Empties the engine, ignoring read-only flags.
    pub fn clear(&mut self) -> bool {
        match self.try_clear() {
            Ok(()) => true,
            Err(err) => {
                warn!("Clear failed: {}", err);
                false
            }
        }
    }

    /// Fallible form of [`clear`](Self::clear).
    pub fn try_clear(&mut self) -> Result<()> {
        self.engine.clear()?;
        debug!("Cleared all entries");
        Ok(())
    }

    // == Inspection ==
    /// Whether the entry under `key` has expired, None if there is none.
    ///
    /// Checking evicts an expired entry, so an expired key reports None.
    pub fn is_expired(&mut self, key: &str) -> Option<bool> {
        let now = self.clock.now();
        self.read_at(key, now)
            .map(|entry| entry.is_expired_at(now))
    }

    /// Whether the entry under `key` is read-only, None if there is none.
    pub fn is_readonly(&mut self, key: &str) -> Option<bool> {
        self.read_raw(key).map(|entry| entry.read_only)
    }
}

impl<E: KeyEnumeration, C: Clock> EntryStore<E, C> {
    // == Keys ==
    /// Every key the engine holds, in ascending order.
    ///
    /// Entries are not decoded, so expired keys that have not been read yet
    /// are still listed.
    pub fn keys(&self) -> Vec<String> {
        self.engine.keys().unwrap_or_else(|err| {
            warn!("Key listing failed: {}", err);
            Vec::new()
        })
    }

    // == Get All ==
    /// Values of every live entry, foreign ones included.
    ///
    /// Expired entries met along the way are evicted.
    pub fn get_all(&mut self) -> BTreeMap<String, Value> {
        let now = self.clock.now();
        let mut values = BTreeMap::new();

        for key in self.keys() {
            if let Some(entry) = self.read_at(&key, now) {
                values.insert(key, entry.value);
            }
        }

        values
    }
}
