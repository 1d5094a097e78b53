//! Shelf Cache - expiration and read-only metadata for plain key/value storage
//!
//! Wraps any string key/value engine with per-entry TTL and write protection,
//! and serves a store over HTTP.

pub mod api;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;

pub use api::AppState;
pub use cache::{Entry, EntryStore, SetOptions};
pub use config::Config;
pub use engine::{Backend, FileEngine, MemoryEngine, StorageEngine};
