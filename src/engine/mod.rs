//! Storage Engine Module
//!
//! The raw key/value primitive the entry store sits on. Engines only know
//! about opaque strings; expiration and read-only metadata live in the
//! records the store writes into them.

mod file;
mod memory;

use thiserror::Error;

pub use file::FileEngine;
pub use memory::MemoryEngine;

// == Engine Error ==
/// Failure reported by the underlying storage primitive.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The write would push the engine past its byte quota
    #[error("Storage quota exceeded: {needed} bytes needed, limit is {limit}")]
    QuotaExceeded { needed: usize, limit: usize },

    /// Filesystem or other I/O failure
    #[error("Storage I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// The engine refused the operation for another reason
    #[error("Storage engine unavailable: {0}")]
    Unavailable(String),
}

/// Convenience Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

// == Storage Engine ==
/// Capability contract every backing store must provide.
///
/// Removing an absent key is not an error.
pub trait StorageEngine {
    /// Returns the raw string stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> EngineResult<Option<String>>;

    /// Stores `value` under `key`, replacing anything already there.
    fn set(&mut self, key: &str, value: &str) -> EngineResult<()>;

    /// Removes `key`.
    fn remove(&mut self, key: &str) -> EngineResult<()>;

    /// Removes every key held by this engine instance.
    fn clear(&mut self) -> EngineResult<()>;
}

// == Key Enumeration ==
/// Optional capability for engines that can list their key space.
pub trait KeyEnumeration: StorageEngine {
    /// Returns every key currently held, in ascending order.
    fn keys(&self) -> EngineResult<Vec<String>>;
}

impl<E: StorageEngine + ?Sized> StorageEngine for Box<E> {
    fn get(&self, key: &str) -> EngineResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> EngineResult<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> EngineResult<()> {
        (**self).remove(key)
    }

    fn clear(&mut self) -> EngineResult<()> {
        (**self).clear()
    }
}

// == Backend ==
/// Runtime-selected engine, used by the server binary.
#[derive(Debug)]
pub enum Backend {
    Memory(MemoryEngine),
    File(FileEngine),
}

impl Backend {
    /// Short engine name for logs and health output.
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Memory(_) => "memory",
            Backend::File(_) => "file",
        }
    }
}

impl StorageEngine for Backend {
    fn get(&self, key: &str) -> EngineResult<Option<String>> {
        match self {
            Backend::Memory(engine) => engine.get(key),
            Backend::File(engine) => engine.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> EngineResult<()> {
        match self {
            Backend::Memory(engine) => engine.set(key, value),
            Backend::File(engine) => engine.set(key, value),
        }
    }

    fn remove(&mut self, key: &str) -> EngineResult<()> {
        match self {
            Backend::Memory(engine) => engine.remove(key),
            Backend::File(engine) => engine.remove(key),
        }
    }

    fn clear(&mut self) -> EngineResult<()> {
        match self {
            Backend::Memory(engine) => engine.clear(),
            Backend::File(engine) => engine.clear(),
        }
    }
}

impl KeyEnumeration for Backend {
    fn keys(&self) -> EngineResult<Vec<String>> {
        match self {
            Backend::Memory(engine) => engine.keys(),
            Backend::File(engine) => engine.keys(),
        }
    }
}
