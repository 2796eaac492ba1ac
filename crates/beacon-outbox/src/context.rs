//! Device context attached to envelopes at send time.

use serde::{Deserialize, Serialize};

/// Snapshot of the environment the process runs in.
///
/// Collected once per process and shared read-only (`Arc<DeviceContext>`)
/// with the sender. It is never written into the persisted queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceContext {
    /// Operating system (`linux`, `macos`, `windows`, ...).
    pub platform: String,
    /// OS family (`unix`, `windows`).
    pub os_family: String,
    /// CPU architecture.
    pub arch: String,
    /// Logical CPUs available to the process.
    pub cpu_count: usize,
    /// Version of the host application.
    pub app_version: String,
    /// Locale from `LC_ALL`/`LANG`, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Random per-process identifier, distinguishing runs of the same player.
    pub run_id: String,
}

impl DeviceContext {
    /// Collect the context for the current process.
    pub fn collect(app_version: &str) -> Self {
        let locale = ["LC_ALL", "LANG"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty());

        Self {
            platform: std::env::consts::OS.to_string(),
            os_family: std::env::consts::FAMILY.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            cpu_count: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            app_version: app_version.to_string(),
            locale,
            run_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}
