use std::{fs, path::PathBuf, sync::RwLock};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::audio::AudioState;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct UserSettings {
    audio: AudioState,
}

/// JSON-backed store for user preferences. Only audio preferences persist;
/// session history deliberately does not.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            // A corrupt settings file falls back to defaults rather than
            // blocking startup.
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn audio(&self) -> AudioState {
        self.data
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .audio
    }

    pub fn update_audio(&self, audio: AudioState) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(|e| e.into_inner());
        guard.audio = audio;
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NoiseKind;

    fn temp_settings_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("breathscape-test-{}-{}.json", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = temp_settings_path("missing");
        let store = SettingsStore::new(path).unwrap();
        assert_eq!(store.audio(), AudioState::default());
    }

    #[test]
    fn audio_preferences_round_trip() {
        let path = temp_settings_path("roundtrip");
        let store = SettingsStore::new(path.clone()).unwrap();

        let prefs = AudioState {
            enabled: true,
            noise_enabled: true,
            noise_kind: NoiseKind::Pink,
            bell_volume: 0.6,
            noise_volume: 0.3,
        };
        store.update_audio(prefs).unwrap();

        let reloaded = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(reloaded.audio(), prefs);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let path = temp_settings_path("corrupt");
        fs::write(&path, "{not json").unwrap();
        let store = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(store.audio(), AudioState::default());
        let _ = fs::remove_file(path);
    }
}
