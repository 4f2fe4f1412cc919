//! In-memory settings implementation.

use super::{Observers, SettingChange, SettingValue, SettingsError, SettingsResult, SettingsStore};
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::mpsc::Sender;

/// In-memory settings for testing and ephemeral use.
#[derive(Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, SettingValue>>,
    observers: Observers,
}

impl MemorySettings {
    /// Create a new empty settings store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> SettingsResult<Option<SettingValue>> {
        let values = self.values.read().map_err(|e| {
            SettingsError::PersistenceFailed(format!("Lock error: {}", e))
        })?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: SettingValue) -> SettingsResult<()> {
        {
            let mut values = self.values.write().map_err(|e| {
                SettingsError::PersistenceFailed(format!("Lock error: {}", e))
            })?;
            values.insert(key.to_string(), value.clone());
        }
        self.observers.notify(key, Some(&value));
        Ok(())
    }

    fn reset(&self, key: &str) -> SettingsResult<()> {
        let removed = {
            let mut values = self.values.write().map_err(|e| {
                SettingsError::PersistenceFailed(format!("Lock error: {}", e))
            })?;
            values.remove(key).is_some()
        };
        if removed {
            self.observers.notify(key, None);
        }
        Ok(())
    }

    fn observe(&self, key: &str, sender: Sender<SettingChange>) {
        self.observers.add(key, sender);
    }
}
