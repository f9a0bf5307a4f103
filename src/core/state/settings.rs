use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Persisted launcher preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LauncherSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<u32>,
    /// Display names for installed versions, keyed by version id.
    #[serde(default)]
    pub version_names: BTreeMap<String, String>,
}

/// Fields of [`LauncherSettings`] to overwrite; `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub username: Option<String>,
    pub memory_mb: Option<u32>,
}

/// `settings.json` in the launcher data directory.
pub struct SettingsStore {
    path: PathBuf,
    current: LauncherSettings,
}

impl SettingsStore {
    /// Read the settings file, creating an empty one when it is missing.
    /// Any failure yields defaults.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = read_or_create(&path);
        Self { path, current }
    }

    pub fn get(&self) -> &LauncherSettings {
        &self.current
    }

    /// Write the current settings. Returns whether it worked.
    pub fn save(&self) -> bool {
        let result = serde_json::to_string_pretty(&self.current)
            .map_err(std::io::Error::other)
            .and_then(|json| {
                if let Some(parent) = self.path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&self.path, json)
            });
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save settings to {:?}: {}", self.path, e);
                false
            }
        }
    }

    /// Apply `patch` on top of the current settings, then save.
    pub fn merge(&mut self, patch: SettingsPatch) -> bool {
        if let Some(username) = patch.username {
            self.current.username = Some(username);
        }
        if let Some(memory_mb) = patch.memory_mb {
            self.current.memory_mb = Some(memory_mb);
        }
        self.save()
    }

    /// Store a display name for `version_id`; a blank name removes it.
    pub fn set_version_display_name(&mut self, version_id: &str, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            self.current.version_names.remove(version_id);
        } else {
            self.current
                .version_names
                .insert(version_id.to_string(), name.to_string());
        }
        self.save()
    }

    pub fn display_name<'a>(&'a self, version_id: &'a str) -> &'a str {
        self.current
            .version_names
            .get(version_id)
            .map(String::as_str)
            .unwrap_or(version_id)
    }
}

fn read_or_create(path: &Path) -> LauncherSettings {
    if !path.exists() {
        debug!("Creating empty settings at {:?}", path);
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = std::fs::write(path, "{}") {
            warn!("Could not create {:?}: {}", path, e);
        }
        return LauncherSettings::default();
    }

    match std::fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring unreadable settings {:?}: {}", path, e);
            LauncherSettings::default()
        }),
        Err(e) => {
            warn!("Could not read {:?}: {}", path, e);
            LauncherSettings::default()
        }
    }
}
