//! File system paths for beacon.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

const BASE_DIR_NAME: &str = ".beacon";
const CONFIG_FILE_NAME: &str = "config.json";
const QUEUE_FILE_NAME: &str = "queue.json";
const KV_DIR_NAME: &str = "kv";
const PLAYER_ID_FILE_NAME: &str = "player_id";
const LOGS_DIR_NAME: &str = "logs";
const LOG_FILE_NAME: &str = "beacon.jsonl";

/// Where beacon keeps its state.
///
/// ```text
/// ~/.beacon/
///   config.json      settings, see Config
///   queue.json       delivery queue snapshot (file store)
///   kv/              one file per key (key-value store)
///   player_id        stable anonymous player UUID
///   logs/beacon.jsonl
/// ```
#[derive(Debug, Clone)]
pub struct Paths {
    base_dir: PathBuf,
}

impl Paths {
    /// Root the layout at `~/.beacon`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir().ok_or(CoreError::NoHomeDir)?;
        Ok(Self::with_base_dir(home.join(BASE_DIR_NAME)))
    }

    /// Root the layout somewhere else (tests, `--base-dir`).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE_NAME)
    }

    pub fn queue_file(&self) -> PathBuf {
        self.base_dir.join(QUEUE_FILE_NAME)
    }

    pub fn kv_dir(&self) -> PathBuf {
        self.base_dir.join(KV_DIR_NAME)
    }

    pub fn player_id_file(&self) -> PathBuf {
        self.base_dir.join(PLAYER_ID_FILE_NAME)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join(LOGS_DIR_NAME)
    }

    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join(LOG_FILE_NAME)
    }

    /// Create the base, key-value and log directories.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        for dir in [self.base_dir.clone(), self.kv_dir(), self.logs_dir()] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_layout_under_base_dir() {
        let base = PathBuf::from("/tmp/test-beacon");
        let paths = Paths::with_base_dir(base.clone());

        assert_eq!(paths.base_dir(), &base);
        assert_eq!(paths.config_file(), base.join("config.json"));
        assert_eq!(paths.queue_file(), base.join("queue.json"));
        assert_eq!(paths.kv_dir(), base.join("kv"));
        assert_eq!(paths.player_id_file(), base.join("player_id"));
        assert_eq!(paths.logs_dir(), base.join("logs"));
        assert_eq!(paths.log_file(), base.join("logs/beacon.jsonl"));
    }

    #[test]
    fn test_new_roots_under_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(Paths::new().unwrap().base_dir(), &home.join(".beacon"));
    }

    #[test]
    fn test_ensure_dirs() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("beacon");
        let paths = Paths::with_base_dir(base.clone());

        paths.ensure_dirs().unwrap();
        assert!(paths.kv_dir().is_dir());
        assert!(paths.logs_dir().is_dir());

        // Second call on existing dirs is fine
        paths.ensure_dirs().unwrap();
    }
}
