//! String key-value storage used by the local layout backend

pub mod sqlite;

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::Result;

pub use sqlite::SqliteKeyValueStore;

/// Persistent string map, iterated in insertion order
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    fn keys(&self) -> Result<Vec<String>>;

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self.keys()?.into_iter().filter(|k| k.starts_with(prefix)).collect())
    }
}

/// In-process store, lost when dropped
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<IndexMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().shift_remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}

/// Remembers which layout each table showed last
#[derive(Clone)]
pub struct ActiveLayoutPointer {
    store: Arc<dyn KeyValueStore>,
}

impl ActiveLayoutPointer {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn key(table_id: &str) -> String {
        format!("gtable-layout-{}", table_id)
    }

    /// Name of the last active layout of `table_id`
    pub fn get(&self, table_id: &str) -> Result<Option<String>> {
        Ok(self
            .store
            .get(&Self::key(table_id))?
            .filter(|name| !name.is_empty()))
    }

    pub fn set(&self, table_id: &str, layout_name: &str) -> Result<()> {
        self.store.set(&Self::key(table_id), layout_name)
    }

    pub fn clear(&self, table_id: &str) -> Result<()> {
        self.store.remove(&Self::key(table_id))
    }
}
