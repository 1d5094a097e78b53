//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::engine::{Backend, EngineResult, FileEngine, MemoryEngine};

/// Which storage engine the server wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineKind {
    /// Process-local map, lost on restart
    #[default]
    Memory,
    /// One file per key under `storage_dir`
    File,
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(EngineKind::Memory),
            "file" => Ok(EngineKind::File),
            other => Err(format!("unknown storage engine '{}'", other)),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Storage engine to open
    pub engine: EngineKind,
    /// Directory used by the file engine
    pub storage_dir: PathBuf,
    /// Byte quota for the memory engine, 0 = unlimited
    pub storage_quota: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `STORAGE_ENGINE` - `memory` or `file` (default: memory)
    /// - `STORAGE_DIR` - file engine directory (default: ./shelf-data)
    /// - `STORAGE_QUOTA` - memory engine quota in bytes (default: 5 MiB)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            engine: env::var("STORAGE_ENGINE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.engine),
            storage_dir: env::var("STORAGE_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            storage_quota: env::var("STORAGE_QUOTA")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.storage_quota),
        }
    }

    /// Opens the configured storage engine.
    pub fn open_backend(&self) -> EngineResult<Backend> {
        match self.engine {
            EngineKind::Memory => Ok(Backend::Memory(MemoryEngine::with_quota(
                self.storage_quota,
            ))),
            EngineKind::File => Ok(Backend::File(FileEngine::open(&self.storage_dir)?)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            engine: EngineKind::Memory,
            storage_dir: PathBuf::from("./shelf-data"),
            storage_quota: 5 * 1024 * 1024,
        }
    }
}
