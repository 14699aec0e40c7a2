/// Key-value storage for the last query string
use crate::errors::StoreError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Namespaced key holding the last query
pub const LAST_QUERY_KEY: &str = "nasa_image_search.lastQuery";

/// Small storage port injected into the aggregator
pub trait QueryStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-process store, nothing survives a restart
#[derive(Default)]
pub struct MemoryQueryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryQueryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a last query
    pub fn with_last_query(query: &str) -> Self {
        let store = Self::new();
        lock(&store.values).insert(LAST_QUERY_KEY.to_string(), query.to_string());
        store
    }
}

impl QueryStore for MemoryQueryStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        lock(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Critical sections are single map operations; a poisoned map is still whole
fn lock(values: &Mutex<BTreeMap<String, String>>) -> MutexGuard<'_, BTreeMap<String, String>> {
    values.lock().unwrap_or_else(PoisonError::into_inner)
}

/// JSON object on disk, rewritten whole on every `set`
pub struct FileQueryStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileQueryStore {
    /// Open the store, starting empty when the file does not exist yet
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl QueryStore for FileQueryStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let snapshot = {
            let mut values = lock(&self.values);
            values.insert(key.to_string(), value.to_string());
            serde_json::to_vec_pretty(&*values)?
        };

        // Replace atomically via a sibling temp file
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, snapshot)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
