//! Persisted location preference.
//!
//! The preference is a single string key in a host-provided key/value
//! store. It is absent until the user first chooses, overwritten on each
//! later choice, and removed when the user clears it. Environments without
//! persistent storage read it as absent and ignore writes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Storage key holding the preference.
pub const LOCATION_PREFERENCE_KEY: &str = "location_preference";

/// How the user prefers their location to be acquired.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LocationPreference {
    /// Device geolocation.
    Precise,
    /// IP-derived coarse location.
    Ip,
}

/// Errors from a [`PreferenceStore`].
#[derive(Debug, Error)]
pub enum PreferenceError {
    /// Reading or writing the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not valid TOML.
    #[error("Failed to parse preferences: {0}")]
    Decode(#[from] toml::de::Error),

    /// The preferences could not be serialized.
    #[error("Failed to serialize preferences: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// A string key/value store that survives across sessions.
pub trait PreferenceStore: Send + Sync {
    /// Reads a key.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError`] if the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;

    /// Writes a key, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError`] if the store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError>;

    /// Removes a key. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError`] if the store cannot be written.
    fn remove(&self, key: &str) -> Result<(), PreferenceError>;
}

/// In-process store, lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PreferenceError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// Store backed by a flat TOML table on disk.
///
/// A missing file reads as empty. Keys this store does not own are kept as
/// they are, whatever their type. Writes replace the whole file through a
/// temporary sibling and a rename, and a file that no longer parses is
/// rebuilt from scratch on the next write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Opens the store at [`crate::paths::preferences_path`].
    #[must_use]
    pub fn open_default() -> Self {
        Self::new(crate::paths::preferences_path())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<toml::Table, PreferenceError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(toml::de::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(toml::Table::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, values: &toml::Table) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent() {
            crate::paths::ensure_dir(parent)?;
        }

        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, toml::to_string(values)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut toml::Table)) -> Result<(), PreferenceError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut values = match self.read() {
            Err(PreferenceError::Decode(e)) => {
                log::warn!(
                    "Discarding unreadable preferences at {}: {e}",
                    self.path.display()
                );
                toml::Table::new()
            }
            other => other?,
        };

        f(&mut values);
        self.write(&values)
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self
            .read()?
            .get(key)
            .and_then(toml::Value::as_str)
            .map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.update(|values| {
            values.insert(key.to_string(), toml::Value::String(value.to_string()));
        })
    }

    fn remove(&self, key: &str) -> Result<(), PreferenceError> {
        self.update(|values| {
            values.remove(key);
        })
    }
}

/// Reads and writes the location preference through an optional store.
#[derive(Clone, Default)]
pub struct LocationPreferences {
    store: Option<Arc<dyn PreferenceStore>>,
}

impl LocationPreferences {
    #[must_use]
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Preferences for an environment without persistent storage.
    #[must_use]
    pub const fn unavailable() -> Self {
        Self { store: None }
    }

    /// Preferences persisted in the default preference file.
    #[must_use]
    pub fn open_default() -> Self {
        Self::new(Arc::new(FileStore::open_default()))
    }

    /// Returns the stored preference.
    ///
    /// Absent when nothing is stored, when there is no store, when the store
    /// cannot be read, or when the stored value is not a known token.
    #[must_use]
    pub fn get_location_preference(&self) -> Option<LocationPreference> {
        let store = self.store.as_ref()?;

        let raw = match store.get(LOCATION_PREFERENCE_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("Failed to read location preference: {e}");
                return None;
            }
        };

        match LocationPreference::from_str(&raw) {
            Ok(preference) => Some(preference),
            Err(_) => {
                log::warn!("Ignoring unknown location preference {raw:?}");
                None
            }
        }
    }

    /// Stores `value`, or removes the key when `value` is `None`.
    ///
    /// A no-op without a store.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError`] if the store cannot be written.
    pub fn set_location_preference(
        &self,
        value: Option<LocationPreference>,
    ) -> Result<(), PreferenceError> {
        let Some(store) = self.store.as_ref() else {
            log::debug!("No preference store available, not persisting {value:?}");
            return Ok(());
        };

        match value {
            Some(preference) => {
                log::debug!("Storing location preference {preference}");
                store.set(LOCATION_PREFERENCE_KEY, preference.as_ref())
            }
            None => {
                log::debug!("Clearing location preference");
                store.remove(LOCATION_PREFERENCE_KEY)
            }
        }
    }
}

impl std::fmt::Debug for LocationPreferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationPreferences")
            .field("has_store", &self.store.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> (Arc<MemoryStore>, LocationPreferences) {
        let store = Arc::new(MemoryStore::default());
        let preferences = LocationPreferences::new(store.clone());
        (store, preferences)
    }

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("touch_grass_{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        dir.join("preferences.toml")
    }

    #[test]
    fn round_trips_through_store() {
        let (store, preferences) = memory();
        assert_eq!(preferences.get_location_preference(), None);

        preferences
            .set_location_preference(Some(LocationPreference::Precise))
            .unwrap();
        assert_eq!(
            preferences.get_location_preference(),
            Some(LocationPreference::Precise)
        );
        assert_eq!(
            store.get(LOCATION_PREFERENCE_KEY).unwrap().as_deref(),
            Some("precise")
        );

        preferences
            .set_location_preference(Some(LocationPreference::Ip))
            .unwrap();
        assert_eq!(
            preferences.get_location_preference(),
            Some(LocationPreference::Ip)
        );
    }

    #[test]
    fn clearing_removes_the_key() {
        let (store, preferences) = memory();
        preferences
            .set_location_preference(Some(LocationPreference::Precise))
            .unwrap();

        preferences.set_location_preference(None).unwrap();

        assert_eq!(preferences.get_location_preference(), None);
        assert_eq!(store.get(LOCATION_PREFERENCE_KEY).unwrap(), None);
    }

    #[test]
    fn unknown_value_reads_as_absent() {
        let (store, preferences) = memory();
        store.set(LOCATION_PREFERENCE_KEY, "gps").unwrap();
        assert_eq!(preferences.get_location_preference(), None);
    }

    #[test]
    fn no_store_is_a_no_op() {
        let preferences = LocationPreferences::unavailable();
        assert!(
            preferences
                .set_location_preference(Some(LocationPreference::Ip))
                .is_ok()
        );
        assert_eq!(preferences.get_location_preference(), None);
    }

    #[test]
    fn file_store_persists_across_instances() {
        let path = temp_path("file_store_persists");

        let first = LocationPreferences::new(Arc::new(FileStore::new(path.clone())));
        first
            .set_location_preference(Some(LocationPreference::Precise))
            .unwrap();

        let second = LocationPreferences::new(Arc::new(FileStore::new(path.clone())));
        assert_eq!(
            second.get_location_preference(),
            Some(LocationPreference::Precise)
        );

        second.set_location_preference(None).unwrap();
        assert_eq!(first.get_location_preference(), None);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn file_store_keeps_other_keys() {
        let path = temp_path("file_store_other_keys");
        let store = FileStore::new(path.clone());
        store.set("theme", "dark").unwrap();
        store.set(LOCATION_PREFERENCE_KEY, "ip").unwrap();
        store.remove(LOCATION_PREFERENCE_KEY).unwrap();

        assert_eq!(store.get("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(store.get(LOCATION_PREFERENCE_KEY).unwrap(), None);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupt_file_reads_as_absent() {
        let path = temp_path("file_store_corrupt");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "location_preference = [").unwrap();

        let preferences = LocationPreferences::new(Arc::new(FileStore::new(path.clone())));
        assert_eq!(preferences.get_location_preference(), None);
        assert!(matches!(
            FileStore::new(path.clone()).get(LOCATION_PREFERENCE_KEY),
            Err(PreferenceError::Decode(_))
        ));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupt_file_is_overwritten_on_next_choice() {
        let path = temp_path("file_store_corrupt_overwrite");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "location_preference = [").unwrap();

        let preferences = LocationPreferences::new(Arc::new(FileStore::new(path.clone())));
        preferences
            .set_location_preference(Some(LocationPreference::Ip))
            .unwrap();
        assert_eq!(
            preferences.get_location_preference(),
            Some(LocationPreference::Ip)
        );

        std::fs::write(&path, "location_preference = [").unwrap();
        preferences.set_location_preference(None).unwrap();
        assert_eq!(preferences.get_location_preference(), None);
        assert!(!path.with_extension("toml.tmp").exists());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn non_string_keys_survive_writes() {
        let path = temp_path("file_store_non_string");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "other_setting = 3\n").unwrap();

        let store = FileStore::new(path.clone());
        let preferences = LocationPreferences::new(Arc::new(FileStore::new(path.clone())));
        preferences
            .set_location_preference(Some(LocationPreference::Precise))
            .unwrap();

        assert_eq!(
            preferences.get_location_preference(),
            Some(LocationPreference::Precise)
        );
        assert_eq!(store.get("other_setting").unwrap(), None);

        let contents = std::fs::read_to_string(&path).unwrap();
        let table: toml::Table = toml::de::from_str(&contents).unwrap();
        assert_eq!(table.get("other_setting"), Some(&toml::Value::Integer(3)));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn preference_tokens() {
        assert_eq!(LocationPreference::Precise.as_ref(), "precise");
        assert_eq!(LocationPreference::from_str("ip").unwrap(), LocationPreference::Ip);
    }
}
