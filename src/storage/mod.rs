use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Durable storage failed; callers log this and keep going in memory
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// String key-value storage that outlives a single page load
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn erase(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store. Clones share the same entries, so one handle can be
/// inspected while another is owned by a parameter store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
    failing: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails, for exercising fallbacks
    pub fn failing() -> Self {
        Self {
            entries: Arc::default(),
            failing: true,
        }
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        if self.failing {
            return Err(StorageError::Unavailable("storage disabled".to_string()));
        }
        self.entries
            .lock()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn erase(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// Storage kept in a single JSON object file, rewritten on every change
pub struct FileStorage {
    storage_path: PathBuf,
    entries: Map<String, Value>,
}

impl FileStorage {
    const FILE_NAME: &'static str = "storage.json";

    /// Open storage in `storage_path`, creating the directory if needed
    pub fn new(storage_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let storage_path = storage_path.as_ref().to_path_buf();

        if !storage_path.exists() {
            fs::create_dir_all(&storage_path)?;
        }

        let entries = match Self::load_entries(&storage_path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Ignoring unreadable storage in {:?}: {}", storage_path, e);
                Map::new()
            }
        };

        Ok(Self {
            storage_path,
            entries,
        })
    }

    pub fn path(&self) -> PathBuf {
        self.storage_path.join(Self::FILE_NAME)
    }

    fn save_entries(&self) -> Result<(), StorageError> {
        let file = File::create(self.path())?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &self.entries)?;
        writer.flush()?;
        Ok(())
    }

    fn load_entries(storage_path: &Path) -> Result<Map<String, Value>, StorageError> {
        let index_path = storage_path.join(Self::FILE_NAME);

        if !index_path.exists() {
            return Ok(Map::new());
        }

        let file = File::open(index_path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl KeyValueStore for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), Value::String(value.to_string()));
        self.save_entries()
    }

    fn erase(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.save_entries()?;
        }
        Ok(())
    }
}
