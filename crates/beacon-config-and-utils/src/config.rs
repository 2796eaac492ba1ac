//! Configuration management for beacon.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default collector URL (can be overridden at compile time via BEACON_SERVER_URL env var).
pub const DEFAULT_SERVER_URL: &str = match option_env!("BEACON_SERVER_URL") {
    Some(url) => url,
    None => "https://collector.beacon.dev/v1/events",
};

/// Default game identifier stamped on every envelope.
pub const DEFAULT_GAME: &str = "beacon-demo";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default size bound for the key-value store backend (5 MiB).
pub const DEFAULT_KV_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Default per-request timeout for the collector transport.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Persistent store medium used for the delivery queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Single JSON snapshot file.
    File,
    /// Size-bounded key-value storage.
    Kv,
}

impl StoreBackend {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "file" => Some(Self::File),
            "kv" | "keyvalue" | "key-value" => Some(Self::Kv),
            _ => None,
        }
    }
}

impl Default for StoreBackend {
    fn default() -> Self {
        Self::File
    }
}

/// Main beacon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Collector endpoint receiving one envelope per POST.
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Bearer token sent with every request.
    #[serde(default)]
    pub api_key: String,
    /// Game identifier written into every envelope.
    #[serde(default = "default_game")]
    pub game: String,
    /// Queue persistence medium.
    #[serde(default)]
    pub store: StoreBackend,
    /// Byte quota for the key-value backend.
    #[serde(default = "default_kv_quota_bytes")]
    pub kv_quota_bytes: usize,
    /// Transport request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_game() -> String {
    DEFAULT_GAME.to_string()
}

fn default_kv_quota_bytes() -> usize {
    DEFAULT_KV_QUOTA_BYTES
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            server_url: default_server_url(),
            api_key: String::new(),
            game: default_game(),
            store: StoreBackend::default(),
            kv_quota_bytes: DEFAULT_KV_QUOTA_BYTES,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration from the config file (if any), then apply
    /// environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Apply `BEACON_*` overrides using `lookup` to read variables.
    ///
    /// Empty values are ignored. An unknown `BEACON_STORE` value is an error.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> CoreResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(level) = read("BEACON_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(url) = read("BEACON_SERVER_URL") {
            self.server_url = url;
        }
        if let Some(key) = read("BEACON_API_KEY") {
            self.api_key = key;
        }
        if let Some(game) = read("BEACON_GAME") {
            self.game = game;
        }
        if let Some(store) = read("BEACON_STORE") {
            self.store = StoreBackend::parse(&store).ok_or_else(|| {
                CoreError::Config(format!(
                    "BEACON_STORE must be \"file\" or \"kv\", got {store:?}"
                ))
            })?;
        }
        Ok(())
    }

    /// Get the collector URL as a parsed URL.
    pub fn server_url(&self) -> CoreResult<Url> {
        Url::parse(&self.server_url).map_err(CoreError::from)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> CoreResult<()> {
        let url = self.server_url()?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(CoreError::Config(format!(
                "server_url must use http or https, got {}",
                url.scheme()
            )));
        }
        if self.game.trim().is_empty() {
            return Err(CoreError::Config("game must not be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
