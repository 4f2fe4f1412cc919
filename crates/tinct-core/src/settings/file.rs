//! File-based settings implementation for native platforms.

use super::{Observers, SettingChange, SettingValue, SettingsError, SettingsResult, SettingsStore};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::sync::mpsc::Sender;

/// File-based settings for native platforms.
///
/// Every value lives in one JSON object; each write rewrites the file.
/// Changes made by another process are picked up with [`FileSettings::reload`].
pub struct FileSettings {
    path: PathBuf,
    values: RwLock<HashMap<String, SettingValue>>,
    observers: Observers,
}

impl FileSettings {
    /// Open settings stored at `path`.
    ///
    /// Creates the parent directory if it doesn't exist. A missing file is
    /// an empty store.
    pub fn new(path: PathBuf) -> SettingsResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    SettingsError::Io(format!("Failed to create settings directory: {}", e))
                })?;
            }
        }
        let values = read_values(&path)?;
        Ok(Self { path, values: RwLock::new(values), observers: Observers::default() })
    }

    /// Open settings in the default location.
    ///
    /// On Unix: `~/.config/tinct/settings.json`
    /// On Windows: `%APPDATA%\tinct\settings.json`
    pub fn default_location() -> SettingsResult<Self> {
        let base = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| SettingsError::Io("Could not determine home directory".to_string()))?;

        Self::new(base.join("tinct").join("settings.json"))
    }

    /// Get the settings file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file and notify observers of every key that changed.
    ///
    /// Returns the number of changed keys.
    pub fn reload(&self) -> SettingsResult<usize> {
        let fresh = read_values(&self.path)?;
        let changed: Vec<(String, Option<SettingValue>)> = {
            let mut values = self.values.write().map_err(|e| {
                SettingsError::PersistenceFailed(format!("Lock error: {}", e))
            })?;

            let mut changed: Vec<_> = fresh
                .iter()
                .filter(|(k, v)| values.get(*k) != Some(*v))
                .map(|(k, v)| (k.clone(), Some(v.clone())))
                .collect();
            changed.extend(
                values
                    .keys()
                    .filter(|k| !fresh.contains_key(*k))
                    .map(|k| (k.clone(), None)),
            );

            *values = fresh;
            changed
        };

        for (key, value) in &changed {
            log::debug!("Setting {} changed on disk", key);
            self.observers.notify(key, value.as_ref());
        }
        Ok(changed.len())
    }

    fn write_file(&self, values: &HashMap<String, SettingValue>) -> SettingsResult<()> {
        let json = serde_json::to_string_pretty(values)
            .map_err(|e| SettingsError::Serialization(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| {
            SettingsError::PersistenceFailed(format!(
                "Failed to write {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

fn read_values(path: &Path) -> SettingsResult<HashMap<String, SettingValue>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let json = fs::read_to_string(path)
        .map_err(|e| SettingsError::Io(format!("Failed to read {}: {}", path.display(), e)))?;

    if json.trim().is_empty() {
        return Ok(HashMap::new());
    }

    serde_json::from_str(&json).map_err(|e| {
        SettingsError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
    })
}

impl SettingsStore for FileSettings {
    fn get(&self, key: &str) -> SettingsResult<Option<SettingValue>> {
        let values = self.values.read().map_err(|e| {
            SettingsError::PersistenceFailed(format!("Lock error: {}", e))
        })?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: SettingValue) -> SettingsResult<()> {
        let result = {
            let mut values = self.values.write().map_err(|e| {
                SettingsError::PersistenceFailed(format!("Lock error: {}", e))
            })?;
            values.insert(key.to_string(), value.clone());
            self.write_file(&values)
        };
        self.observers.notify(key, Some(&value));
        result
    }

    fn reset(&self, key: &str) -> SettingsResult<()> {
        let result = {
            let mut values = self.values.write().map_err(|e| {
                SettingsError::PersistenceFailed(format!("Lock error: {}", e))
            })?;
            if values.remove(key).is_none() {
                return Ok(());
            }
            self.write_file(&values)
        };
        self.observers.notify(key, None);
        result
    }

    fn observe(&self, key: &str, sender: Sender<SettingChange>) {
        self.observers.add(key, sender);
    }
}
