use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use crate::models::{Settings, SettingsFile};

const SETTINGS_FILE: &str = "settings.json";
const VALUE_EXTENSION: &str = "json";
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Json(serde_json::Error),
    InvalidKey(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "io error: {err}"),
            StorageError::Json(err) => write!(f, "json error: {err}"),
            StorageError::InvalidKey(key) => write!(f, "invalid storage key: {key:?}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        StorageError::Io(value)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        StorageError::Json(value)
    }
}

pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_dirs(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn load_settings(&self) -> Result<SettingsFile, StorageError> {
        let raw = read_to_string(&self.root.join(SETTINGS_FILE))?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<(), StorageError> {
        let file = SettingsFile {
            schema_version: SCHEMA_VERSION,
            settings: settings.clone(),
        };
        let json = serde_json::to_vec_pretty(&file)?;
        write_atomic(&self.root.join(SETTINGS_FILE), &json)
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.{VALUE_EXTENSION}")))
    }
}

impl KeyValueStore for Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.key_path(key)?;
        match read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(StorageError::Io(err)) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.key_path(key)?;
        write_atomic(&path, value.as_bytes())
    }
}

fn read_to_string(path: &Path) -> Result<String, StorageError> {
    let mut file = File::open(path)?;
    let mut buf = String::new();
    file.read_to_string(&mut buf)?;
    Ok(buf)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let temp_path = path.with_extension("tmp");
    {
        let mut file = File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinates;

    #[test]
    fn memory_store_reads_back_written_values() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get_item("tasks").unwrap(), None);

        store.set_item("tasks", "[]").unwrap();
        store.set_item("tasks", "[1]").unwrap();
        assert_eq!(store.get_item("tasks").unwrap().as_deref(), Some("[1]"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn file_store_missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        assert_eq!(storage.get_item("tasks").unwrap(), None);
    }

    #[test]
    fn file_store_writes_one_file_per_key_without_leftover_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = Storage::new(dir.path().to_path_buf());
        storage.set_item("completedTasks", "[]").unwrap();
        storage.set_item("openSection", "null").unwrap();

        assert!(dir.path().join("completedTasks.json").is_file());
        assert!(dir.path().join("openSection.json").is_file());
        assert!(!dir.path().join("openSection.tmp").exists());
        assert_eq!(
            storage.get_item("openSection").unwrap().as_deref(),
            Some("null")
        );
    }

    #[test]
    fn file_store_rejects_keys_that_escape_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = Storage::new(dir.path().to_path_buf());
        for key in ["", "../tasks", "a/b", "a.b"] {
            assert!(matches!(
                storage.set_item(key, "x"),
                Err(StorageError::InvalidKey(_))
            ));
            assert!(matches!(
                storage.get_item(key),
                Err(StorageError::InvalidKey(_))
            ));
        }
    }

    #[test]
    fn file_store_surfaces_io_errors_other_than_not_found() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("tasks.json")).unwrap();
        let mut storage = Storage::new(dir.path().to_path_buf());
        assert!(matches!(storage.get_item("tasks"), Err(StorageError::Io(_))));
        assert!(storage.set_item("tasks", "[]").is_err());
    }

    #[test]
    fn boxed_store_delegates_to_inner_store() {
        let mut store: Box<dyn KeyValueStore> = Box::new(MemoryStore::new());
        store.set_item("tasks", "[]").unwrap();
        assert_eq!(store.get_item("tasks").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn settings_round_trip_with_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path().join("nested"));
        storage.ensure_dirs().unwrap();
        assert!(storage.load_settings().is_err());

        let settings = Settings {
            location: Some(Coordinates {
                latitude: 51.5,
                longitude: -0.12,
            }),
            locality_language: Some("en".to_string()),
            show_clock: false,
        };
        storage.save_settings(&settings).unwrap();
        let file = storage.load_settings().unwrap();
        assert_eq!(file.schema_version, SCHEMA_VERSION);
        assert_eq!(file.settings, settings);
    }

    #[test]
    fn corrupt_settings_file_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), b"{not json").unwrap();
        let storage = Storage::new(dir.path().to_path_buf());
        assert!(matches!(storage.load_settings(), Err(StorageError::Json(_))));
    }
}
