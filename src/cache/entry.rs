//! Cache Entry Module
//!
//! Defines the logical record kept under one key: the value plus its
//! creation, expiration and write-protection metadata.

use chrono::{DateTime, Utc};
use serde_json::Value;

// == Entry ==
/// A decoded cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// The stored payload
    pub value: Value,
    /// Creation timestamp (Unix seconds), None for foreign entries
    pub created_at: Option<i64>,
    /// Expiration timestamp (Unix seconds), None = no expiration
    pub expires_at: Option<i64>,
    /// Whether normal writes and removals are refused
    pub read_only: bool,
}

impl Entry {
    // == Constructor ==
    /// Creates a fresh entry written at `now`.
    ///
    /// # Arguments
    /// * `value` - The payload to store
    /// * `now` - Current time in Unix seconds
    /// * `ttl_seconds` - Optional lifetime in seconds
    /// * `read_only` - Whether the entry is write-protected
    pub fn new(value: Value, now: i64, ttl_seconds: Option<u64>, read_only: bool) -> Self {
        let expires_at =
            ttl_seconds.map(|ttl| now.saturating_add(i64::try_from(ttl).unwrap_or(i64::MAX)));

        Self {
            value,
            created_at: Some(now),
            expires_at,
            read_only,
        }
    }

    // == Foreign ==
    /// Wraps a raw string that was not written by this crate.
    pub fn foreign(raw: impl Into<String>) -> Self {
        Self {
            value: Value::String(raw.into()),
            created_at: None,
            expires_at: None,
            read_only: false,
        }
    }

    /// Returns true when the entry carries no creation metadata.
    pub fn is_foreign(&self) -> bool {
        self.created_at.is_none()
    }

    // == Is Expired ==
    /// Checks expiration against `now`.
    ///
    /// An entry is expired once `now` is strictly past `expires_at`; at the
    /// exact expiration second it is still readable.
    pub fn is_expired_at(&self, now: i64) -> bool {
        match self.expires_at {
            Some(expires) => expires < now,
            None => false,
        }
    }

    // == Time To Live ==
    /// Remaining lifetime in seconds at `now`.
    ///
    /// # Returns
    /// - `Some(0)` if the expiration time has been reached
    /// - `Some(remaining)` if the entry has a TTL still running
    /// - `None` if the entry never expires
    pub fn ttl_remaining_at(&self, now: i64) -> Option<u64> {
        self.expires_at
            .map(|expires| u64::try_from(expires.saturating_sub(now)).unwrap_or(0))
    }

    /// Creation time as a UTC datetime.
    pub fn created_datetime(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Expiration time as a UTC datetime.
    pub fn expires_datetime(&self) -> Option<DateTime<Utc>> {
        self.expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }
}
