//! Configuration loading and management

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Default bound on a single backend call
const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 500;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket UIs connect to
    pub socket_path: PathBuf,

    /// Socket of the settings/backend service that owns the global listener
    pub backend_socket: PathBuf,

    /// Settings document holding `ptt_key`
    pub settings_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Bound on each pause/resume call to the backend
    pub backend_timeout: Duration,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an environment lookup
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = match lookup("PTT_CAPTURE_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = lookup("HOME").context("HOME environment variable not set")?;
                PathBuf::from(home)
                    .join(".local")
                    .join("share")
                    .join("ptt-capture")
            }
        };

        let path_or = |key: &str, default: &str| {
            lookup(key)
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join(default))
        };

        let socket_path = path_or("PTT_CAPTURE_SOCKET", "capture.sock");
        let backend_socket = path_or("PTT_CAPTURE_BACKEND_SOCKET", "backend.sock");
        let settings_path = path_or("PTT_CAPTURE_SETTINGS", "settings.json");

        let backend_timeout_ms = match lookup("PTT_CAPTURE_BACKEND_TIMEOUT_MS") {
            Some(ms) => ms
                .parse::<u64>()
                .with_context(|| format!("invalid PTT_CAPTURE_BACKEND_TIMEOUT_MS: {ms}"))?,
            None => DEFAULT_BACKEND_TIMEOUT_MS,
        };

        Ok(Self {
            socket_path,
            backend_socket,
            settings_path,
            data_dir,
            backend_timeout: Duration::from_millis(backend_timeout_ms),
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create {}", self.data_dir.display()))?;
        Ok(())
    }
}
