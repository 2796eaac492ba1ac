//! Persistent snapshot storage for the delivery queue.
//!
//! A snapshot is the ordered list of serialized envelopes. Every backend
//! stores it as one JSON array that replaces the previous snapshot
//! wholesale; last completed save wins.

use crate::{OutboxError, OutboxResult};
use serde_json::value::RawValue;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Key under which key-value backends hold the queue snapshot.
pub const DEFAULT_QUEUE_KEY: &str = "beacon.queue";

/// Durable storage for queue snapshots.
pub trait PersistentStore: Send + Sync {
    /// Replace the stored snapshot with `snapshot`, preserving order.
    fn save(&self, snapshot: &[String]) -> OutboxResult<()>;

    /// Read the stored snapshot. `Ok(None)` means nothing was ever saved.
    fn load(&self) -> OutboxResult<Option<Vec<String>>>;

    /// Stable name of the underlying medium, unique per location.
    fn identity(&self) -> String;
}

/// Encode serialized envelopes as a JSON array of objects.
fn encode_snapshot(snapshot: &[String]) -> OutboxResult<Vec<u8>> {
    let raw = snapshot
        .iter()
        .map(|entry| serde_json::from_str::<&RawValue>(entry))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(serde_json::to_vec(&raw)?)
}

fn decode_snapshot(bytes: &[u8]) -> OutboxResult<Vec<String>> {
    let raw: Vec<Box<RawValue>> = serde_json::from_slice(bytes)?;
    Ok(raw.into_iter().map(|entry| entry.get().to_string()).collect())
}

/// Snapshot kept in a single JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistentStore for FileStore {
    fn save(&self, snapshot: &[String]) -> OutboxResult<()> {
        let bytes = encode_snapshot(snapshot)?;
        write_replacing(&self.path, &bytes)?;
        Ok(())
    }

    fn load(&self) -> OutboxResult<Option<Vec<String>>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        decode_snapshot(&bytes).map(Some)
    }

    fn identity(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

/// Write `content` to a temp sibling, then rename it over `path`.
fn write_replacing(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "snapshot path has no file name"))?;
    let tmp_path = dir.join(format!(".{}.beacon.tmp.{}", file_name, uuid::Uuid::new_v4().simple()));

    let write_result = (|| -> io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    })();

    if write_result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    write_result
}

/// Minimal string key-value storage.
pub trait KeyValueBackend: Send + Sync {
    fn get(&self, key: &str) -> OutboxResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> OutboxResult<()>;

    /// Name distinguishing this backend instance from others.
    fn namespace(&self) -> String;
}

/// Process-local key-value backend. Clones share the same entries.
#[derive(Debug, Clone)]
pub struct MemoryKeyValue {
    id: uuid::Uuid,
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKeyValue {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryKeyValue {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueBackend for MemoryKeyValue {
    fn get(&self, key: &str) -> OutboxResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> OutboxResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn namespace(&self) -> String {
        format!("memory:{}", self.id)
    }
}

/// Key-value backend with one file per key under a directory.
#[derive(Debug, Clone)]
pub struct DirectoryKeyValue {
    dir: PathBuf,
}

impl DirectoryKeyValue {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn key_path(&self, key: &str) -> OutboxResult<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(OutboxError::Store(format!("invalid key: {key:?}")));
        }
        Ok(self.dir.join(key))
    }
}

impl KeyValueBackend for DirectoryKeyValue {
    fn get(&self, key: &str) -> OutboxResult<Option<String>> {
        match fs::read_to_string(self.key_path(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> OutboxResult<()> {
        write_replacing(&self.key_path(key)?, value.as_bytes())?;
        Ok(())
    }

    fn namespace(&self) -> String {
        format!("dir:{}", self.dir.display())
    }
}

/// Snapshot stored as one value in size-bounded key-value storage.
#[derive(Debug, Clone)]
pub struct KeyValueStore<B> {
    backend: B,
    key: String,
    quota_bytes: usize,
}

impl<B: KeyValueBackend> KeyValueStore<B> {
    pub fn new(backend: B, key: impl Into<String>, quota_bytes: usize) -> Self {
        Self {
            backend,
            key: key.into(),
            quota_bytes,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: KeyValueBackend> PersistentStore for KeyValueStore<B> {
    fn save(&self, snapshot: &[String]) -> OutboxResult<()> {
        let bytes = encode_snapshot(snapshot)?;
        if bytes.len() > self.quota_bytes {
            return Err(OutboxError::QuotaExceeded {
                size: bytes.len(),
                quota: self.quota_bytes,
            });
        }
        // encode_snapshot only emits serde_json output, which is UTF-8.
        let value = String::from_utf8(bytes)
            .map_err(|e| OutboxError::Store(format!("snapshot is not UTF-8: {e}")))?;
        self.backend.set(&self.key, &value)
    }

    fn load(&self) -> OutboxResult<Option<Vec<String>>> {
        match self.backend.get(&self.key)? {
            Some(value) => decode_snapshot(value.as_bytes()).map(Some),
            None => Ok(None),
        }
    }

    fn identity(&self) -> String {
        format!("kv:{}:{}", self.backend.namespace(), self.key)
    }
}
