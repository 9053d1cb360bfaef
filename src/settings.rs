//! The application settings document, as far as push-to-talk is concerned
//!
//! Settings belong to the wider application. This daemon reads and writes
//! only `ptt_key`; every other field is carried through untouched.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::events::CaptureEvent;
use crate::hotkey::{display_name_for, HotkeySpec};

fn default_ptt_key() -> String {
    HotkeySpec::default().encode()
}

/// Application settings with the push-to-talk field broken out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Stored trigger; may still be in a legacy form
    #[serde(default = "default_ptt_key")]
    pub ptt_key: String,

    /// Fields owned by the rest of the application
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ptt_key: default_ptt_key(),
            other: Map::new(),
        }
    }
}

impl Settings {
    /// Trigger the global listener should match
    pub fn ptt_key_target(&self) -> HotkeySpec {
        HotkeySpec::resolve(&self.ptt_key)
    }

    /// Label for the stored trigger
    pub fn ptt_display_name(&self) -> String {
        display_name_for(&self.ptt_key)
    }
}

/// Errors reading or writing settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Where settings live
pub trait SettingsStore: Send + Sync {
    /// Load the current settings
    fn load(&self) -> Result<Settings, SettingsError>;

    /// Replace the stored settings
    fn save(&self, settings: &Settings) -> Result<(), SettingsError>;

    /// Store a new trigger, keeping every other field as it is
    fn update_ptt_key(&self, ptt_key: &str) -> Result<Settings, SettingsError> {
        let mut settings = self.load()?;
        settings.ptt_key = ptt_key.to_owned();
        self.save(&settings)?;
        Ok(settings)
    }
}

/// Settings kept in a JSON file
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    /// Store backed by the file at `path`
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_owned(),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    /// A missing or unreadable file yields defaults
    fn load(&self) -> Result<Settings, SettingsError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "no settings file, using defaults");
                return Ok(Settings::default());
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        match serde_json::from_str(&contents) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!(path = ?self.path, error = %e, "settings file is corrupt, using defaults");
                Ok(Settings::default())
            }
        }
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| SettingsError::Io {
                path: parent.to_owned(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = ?self.path, ptt_key = %settings.ptt_key, "settings saved");
        Ok(())
    }
}

/// Save every committed trigger until the event channel closes
///
/// A failed save is logged; the committed value stays in effect in memory.
pub async fn persist_commits(
    mut events: broadcast::Receiver<CaptureEvent>,
    store: Arc<dyn SettingsStore>,
) {
    loop {
        match events.recv().await {
            Ok(CaptureEvent::Committed { ptt_key, .. }) => {
                persist_ptt_key(Arc::clone(&store), ptt_key).await;
            }
            Ok(event) => {
                debug!(%event, "capture event");
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "capture event receiver lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

async fn persist_ptt_key(store: Arc<dyn SettingsStore>, ptt_key: String) {
    let key = ptt_key.clone();
    match tokio::task::spawn_blocking(move || store.update_ptt_key(&key)).await {
        Ok(Ok(_)) => info!(%ptt_key, "push-to-talk trigger saved"),
        Ok(Err(e)) => error!(%ptt_key, error = %e, "failed to save push-to-talk trigger"),
        Err(e) => error!(?e, "settings writer task failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::{ModifierKey, RegularKey};

    #[test]
    fn test_default_uses_current_encoding() {
        let settings = Settings::default();
        assert_eq!(settings.ptt_key, "AltLeft");
        assert_eq!(settings.ptt_display_name(), "Left Option");
    }

    #[test]
    fn test_deserialize_keeps_other_fields() {
        let json = r#"{
            "ptt_key": "left_option",
            "language": "auto",
            "window_opacity": 0.78,
            "recording_mode": "hold"
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.ptt_key, "left_option");
        assert_eq!(settings.other["language"], "auto");
        assert_eq!(settings.other["recording_mode"], "hold");

        let round = serde_json::to_value(&settings).unwrap();
        assert_eq!(round["window_opacity"], 0.78);
        // Legacy values are not rewritten on read
        assert_eq!(round["ptt_key"], "left_option");
    }

    #[test]
    fn test_missing_ptt_key_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"engine":"local"}"#).unwrap();
        assert_eq!(settings.ptt_key, "AltLeft");
    }

    #[test]
    fn test_ptt_key_target() {
        let mut settings = Settings::default();
        settings.ptt_key = "left_control+KeyZ".to_owned();
        assert_eq!(
            settings.ptt_key_target(),
            HotkeySpec::combo(ModifierKey::ControlLeft, RegularKey::KeyZ)
        );
        assert_eq!(settings.ptt_display_name(), "Left Control + Z");
    }

    #[test]
    fn test_file_store_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = FileSettingsStore::new(&path);
        assert_eq!(store.path(), path.as_path());
        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_file_store_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        let store = FileSettingsStore::new(&path);
        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_update_ptt_key_preserves_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let store = FileSettingsStore::new(&path);

        let mut settings = Settings::default();
        settings.ptt_key = "right_command".to_owned();
        settings
            .other
            .insert("groq_api_key".to_owned(), Value::String("gsk_test".to_owned()));
        store.save(&settings).unwrap();

        let updated = store.update_ptt_key("AltLeft+KeyD").unwrap();
        assert_eq!(updated.ptt_key, "AltLeft+KeyD");

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.ptt_key, "AltLeft+KeyD");
        assert_eq!(reloaded.other["groq_api_key"], "gsk_test");
    }

    #[tokio::test]
    async fn test_persist_commits_writes_committed_trigger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"ptt_key":"left_option","language":"auto"}"#).unwrap();
        let store = Arc::new(FileSettingsStore::new(&path));

        let (tx, rx) = broadcast::channel(16);
        let writer = tokio::spawn(persist_commits(rx, store.clone()));
        tx.send(CaptureEvent::CaptureStarted).unwrap();
        tx.send(CaptureEvent::Committed {
            ptt_key: "ShiftLeft+KeyQ".to_owned(),
            display_name: "Left Shift + Q".to_owned(),
        })
        .unwrap();
        tx.send(CaptureEvent::Cancelled {
            ptt_key: "ShiftLeft+KeyQ".to_owned(),
        })
        .unwrap();
        drop(tx);
        writer.await.unwrap();

        let saved = store.load().unwrap();
        assert_eq!(saved.ptt_key, "ShiftLeft+KeyQ");
        assert_eq!(saved.other["language"], "auto");
    }
}
