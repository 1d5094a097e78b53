//! File Engine Module
//!
//! Persistent engine storing one record file per key inside a directory.
//!
//! Short keys map to `k` followed by the hex encoding of the key, so any key
//! (including the empty one) becomes a filesystem-safe name. Keys too long
//! for that map to `h` followed by the SHA-256 of the key; those files start
//! with a header line holding the hex-encoded key so enumeration can recover
//! it.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::engine::{EngineResult, KeyEnumeration, StorageEngine};

const RECORD_EXTENSION: &str = "rec";
const TEMP_EXTENSION: &str = "tmp";

const KEY_PREFIX: char = 'k';
const HASHED_PREFIX: char = 'h';

/// Longest key (in bytes) stored under a plain hex name. Keeps
/// `k<hex>.rec` well under the common 255-byte file name limit.
const MAX_PLAIN_KEY_BYTES: usize = 120;

// == File Engine ==
/// Persistent string storage rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileEngine {
    root: PathBuf,
}

/// Where a key lives on disk.
enum RecordName {
    /// File content is the value
    Plain(String),
    /// File content is `<hex key>\n<value>`
    Hashed { name: String, header: String },
}

impl RecordName {
    fn for_key(key: &str) -> Self {
        if key.len() <= MAX_PLAIN_KEY_BYTES {
            return RecordName::Plain(format!("{}{}", KEY_PREFIX, hex::encode(key)));
        }

        let digest = Sha256::digest(key.as_bytes());
        RecordName::Hashed {
            name: format!("{}{}", HASHED_PREFIX, hex::encode(digest)),
            header: hex::encode(key),
        }
    }

    fn file_name(&self) -> &str {
        match self {
            RecordName::Plain(name) | RecordName::Hashed { name, .. } => name.as_str(),
        }
    }
}

impl FileEngine {
    /// Opens (and creates if needed) the storage directory.
    pub fn open(root: impl Into<PathBuf>) -> EngineResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory holding the record files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, name: &RecordName) -> PathBuf {
        self.root
            .join(name.file_name())
            .with_extension(RECORD_EXTENSION)
    }

    /// Files owned by the engine with the given extension.
    fn files_with_extension(&self, extension: &str) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for dir_entry in fs::read_dir(&self.root)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
                continue;
            }
            let owned = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .is_some_and(|stem| stem.starts_with(KEY_PREFIX) || stem.starts_with(HASHED_PREFIX));
            if owned {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Recovers the key stored in a record file.
    fn key_of(&self, path: &Path) -> io::Result<Option<String>> {
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            return Ok(None);
        };

        if stem.starts_with(KEY_PREFIX) {
            return Ok(decode_key(stem));
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err),
        };
        Ok(contents
            .split_once('\n')
            .and_then(|(header, _)| decode_hex_key(header)))
    }
}

/// Writes `contents` through a temp file then renames it over `path`.
/// The temp file never outlives a failed write.
fn write_atomic(path: &Path, contents: &[&[u8]]) -> io::Result<()> {
    let temp_path = path.with_extension(TEMP_EXTENSION);

    let result = write_then_rename(&temp_path, path, contents);
    if result.is_err() {
        if let Err(err) = fs::remove_file(&temp_path) {
            if err.kind() != io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove temp file {}: {}", temp_path.display(), err);
            }
        }
    }
    result
}

fn write_then_rename(temp_path: &Path, path: &Path, contents: &[&[u8]]) -> io::Result<()> {
    let mut file = fs::File::create(temp_path)?;
    for chunk in contents {
        file.write_all(chunk)?;
    }
    file.sync_all()?;
    fs::rename(temp_path, path)
}

impl StorageEngine for FileEngine {
    fn get(&self, key: &str) -> EngineResult<Option<String>> {
        let name = RecordName::for_key(key);
        let contents = match fs::read_to_string(self.record_path(&name)) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        match name {
            RecordName::Plain(_) => Ok(Some(contents)),
            RecordName::Hashed { header, .. } => Ok(contents
                .split_once('\n')
                .filter(|(stored, _)| *stored == header)
                .map(|(_, value)| value.to_string())),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> EngineResult<()> {
        let name = RecordName::for_key(key);
        let path = self.record_path(&name);

        match &name {
            RecordName::Plain(_) => write_atomic(&path, &[value.as_bytes()])?,
            RecordName::Hashed { header, .. } => {
                write_atomic(&path, &[header.as_bytes(), "\n".as_bytes(), value.as_bytes()])?
            }
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> EngineResult<()> {
        match fs::remove_file(self.record_path(&RecordName::for_key(key))) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn clear(&mut self) -> EngineResult<()> {
        let mut files = self.files_with_extension(RECORD_EXTENSION)?;
        // Leftovers from writes interrupted by a crash
        files.extend(self.files_with_extension(TEMP_EXTENSION)?);

        for path in files {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}

impl KeyEnumeration for FileEngine {
    fn keys(&self) -> EngineResult<Vec<String>> {
        let mut keys = Vec::new();
        for path in self.files_with_extension(RECORD_EXTENSION)? {
            if let Some(key) = self.key_of(&path)? {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

// == Key Encoding ==
fn decode_key(name: &str) -> Option<String> {
    decode_hex_key(name.strip_prefix(KEY_PREFIX)?)
}

fn decode_hex_key(encoded: &str) -> Option<String> {
    let bytes = hex::decode(encoded).ok()?;
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn encode_key(key: &str) -> String {
        RecordName::for_key(key).file_name().to_string()
    }

    #[test]
    fn test_key_encoding_roundtrip() {
        for key in ["hello", "a/b\\c", "spaces and ünïcödé", ""] {
            assert_eq!(decode_key(&encode_key(key)).as_deref(), Some(key));
        }
        assert!(decode_key("kabc").is_none());
        assert!(decode_key("kzz").is_none());
        assert!(decode_key("6869").is_none());
    }

    #[test]
    fn test_long_keys_get_fixed_length_names() {
        let plain = encode_key(&"a".repeat(MAX_PLAIN_KEY_BYTES));
        assert!(plain.starts_with(KEY_PREFIX));

        let just_over = encode_key(&"a".repeat(MAX_PLAIN_KEY_BYTES + 1));
        let huge = encode_key(&"b".repeat(10_000));
        assert!(just_over.starts_with(HASHED_PREFIX));
        assert_eq!(just_over.len(), 65);
        assert_eq!(huge.len(), 65);
        assert_ne!(just_over, huge);
    }

    #[test]
    fn test_file_set_get_remove() {
        let dir = TempDir::new().unwrap();
        let mut engine = FileEngine::open(dir.path()).unwrap();

        engine.set("path/like:key", "value").unwrap();
        assert_eq!(
            engine.get("path/like:key").unwrap().as_deref(),
            Some("value")
        );

        engine.remove("path/like:key").unwrap();
        assert!(engine.get("path/like:key").unwrap().is_none());
    }

    #[test]
    fn test_file_long_key_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut engine = FileEngine::open(dir.path()).unwrap();
        let key = "x".repeat(300);
        let value = "{\"0\":\"multi\\nline\",\"1\":1}";

        engine.set(&key, value).unwrap();
        engine.set("short", "s").unwrap();

        assert_eq!(engine.get(&key).unwrap().as_deref(), Some(value));
        assert_eq!(engine.keys().unwrap(), vec![key.clone(), "short".to_string()]);

        engine.set(&key, "replaced").unwrap();
        assert_eq!(engine.get(&key).unwrap().as_deref(), Some("replaced"));

        engine.remove(&key).unwrap();
        assert!(engine.get(&key).unwrap().is_none());
        assert_eq!(engine.keys().unwrap(), vec!["short"]);
    }

    #[test]
    fn test_file_remove_absent_is_ok() {
        let dir = TempDir::new().unwrap();
        let mut engine = FileEngine::open(dir.path()).unwrap();
        assert!(engine.remove("nothing").is_ok());
        assert!(engine.remove(&"n".repeat(500)).is_ok());
    }

    #[test]
    fn test_file_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        {
            let mut engine = FileEngine::open(dir.path()).unwrap();
            engine.set("kept", "yes").unwrap();
        }

        let engine = FileEngine::open(dir.path()).unwrap();
        assert_eq!(engine.get("kept").unwrap().as_deref(), Some("yes"));
    }

    #[test]
    fn test_file_keys_and_clear() {
        let dir = TempDir::new().unwrap();
        let mut engine = FileEngine::open(dir.path()).unwrap();
        engine.set("key2", "b").unwrap();
        engine.set("key1", "a").unwrap();
        // Unrelated files in the directory are ignored
        fs::write(dir.path().join("notes.txt"), "hi").unwrap();
        fs::write(dir.path().join("notes.rec"), "hi").unwrap();

        assert_eq!(engine.keys().unwrap(), vec!["key1", "key2"]);

        engine.clear().unwrap();
        assert!(engine.keys().unwrap().is_empty());
        assert!(dir.path().join("notes.txt").exists());
        assert!(dir.path().join("notes.rec").exists());
    }

    #[test]
    fn test_clear_removes_stale_temp_files() {
        let dir = TempDir::new().unwrap();
        let mut engine = FileEngine::open(dir.path()).unwrap();
        let stale = dir.path().join(format!("{}.{}", encode_key("half"), TEMP_EXTENSION));
        fs::write(&stale, "partial").unwrap();

        engine.clear().unwrap();

        assert!(!stale.exists());
    }

    #[test]
    fn test_failed_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let mut engine = FileEngine::open(dir.path()).unwrap();

        // A non-empty directory where the record should go makes the rename fail
        let record = dir.path().join(format!("{}.{}", encode_key("key"), RECORD_EXTENSION));
        fs::create_dir(&record).unwrap();
        fs::write(record.join("blocker"), "x").unwrap();

        assert!(engine.set("key", "value").is_err());

        let temp = dir.path().join(format!("{}.{}", encode_key("key"), TEMP_EXTENSION));
        assert!(!temp.exists());
    }

    #[test]
    fn test_file_open_creates_directory() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");

        let engine = FileEngine::open(&nested).unwrap();

        assert!(nested.is_dir());
        assert_eq!(engine.root(), nested.as_path());
    }
}
