//! Key/value settings abstraction used to persist palettes and the selected color.

mod bridge;
mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use bridge::{
    CUSTOM_COLORS_KEY,
    DEFAULT_PALETTE_KEY,
    SELECTED_COLOR_KEY,
    SettingsBridge,
    decode_custom_colors,
    decode_selected_color,
    encode_custom_colors,
    encode_selected_color,
};
pub use memory::MemorySettings;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileSettings;

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Settings errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Setting {key} is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// A stored value: primitives, fixed tuples and homogeneous arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingValue {
    Bool(bool),
    Double(f64),
    Text(String),
    Tuple(Vec<SettingValue>),
    Array(Vec<SettingValue>),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[SettingValue]> {
        match self {
            Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[SettingValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// A change notification delivered to observers. `value` is `None` on reset.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingChange {
    pub key: String,
    pub value: Option<SettingValue>,
}

/// Trait for settings backends.
///
/// Writes are last-writer-wins. Observers registered with [`observe`]
/// receive every change to their key, including changes made through the
/// same store. A write's notification is sent before `set` returns.
///
/// [`observe`]: SettingsStore::observe
pub trait SettingsStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> SettingsResult<Option<SettingValue>>;

    /// Write a value.
    fn set(&self, key: &str, value: SettingValue) -> SettingsResult<()>;

    /// Remove a value.
    fn reset(&self, key: &str) -> SettingsResult<()>;

    /// Deliver future changes of `key` to `sender`.
    fn observe(&self, key: &str, sender: Sender<SettingChange>);
}

/// Observer registrations shared by the store implementations.
#[derive(Default)]
pub(crate) struct Observers {
    entries: Mutex<Vec<(String, Sender<SettingChange>)>>,
}

impl Observers {
    pub(crate) fn add(&self, key: &str, sender: Sender<SettingChange>) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push((key.to_string(), sender)),
            Err(e) => log::warn!("Observer lock poisoned, dropping observer for {}: {}", key, e),
        }
    }

    /// Send a change to every observer of `key`, forgetting closed channels.
    pub(crate) fn notify(&self, key: &str, value: Option<&SettingValue>) {
        let Ok(mut entries) = self.entries.lock() else {
            log::warn!("Observer lock poisoned, change to {} not delivered", key);
            return;
        };
        entries.retain(|(observed, sender)| {
            if observed != key {
                return true;
            }
            sender
                .send(SettingChange { key: key.to_string(), value: value.cloned() })
                .is_ok()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn test_value_accessors() {
        let tuple = SettingValue::Tuple(vec![SettingValue::Bool(true), SettingValue::Double(0.5)]);
        let items = tuple.as_tuple().unwrap();
        assert_eq!(items[0].as_bool(), Some(true));
        assert_eq!(items[1].as_double(), Some(0.5));
        assert!(tuple.as_array().is_none());
        assert_eq!(SettingValue::Text("x".into()).as_str(), Some("x"));
    }

    #[test]
    fn test_value_json_shape() {
        let value = SettingValue::Array(vec![SettingValue::Double(1.0)]);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"array":[{"double":1.0}]}"#);
        let back: SettingValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_observers_filter_by_key_and_drop_closed() {
        let observers = Observers::default();
        let (tx, rx) = channel();
        let (closed_tx, closed_rx) = channel();
        observers.add("a", tx);
        observers.add("a", closed_tx);
        drop(closed_rx);

        observers.notify("b", Some(&SettingValue::Bool(true)));
        assert!(rx.try_recv().is_err());

        observers.notify("a", None);
        assert_eq!(rx.try_recv().unwrap(), SettingChange { key: "a".into(), value: None });
        assert_eq!(observers.entries.lock().unwrap().len(), 1);
    }
}
