//! SQLite-backed key-value store

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use super::KeyValueStore;
use crate::Result;

/// Key-value store persisted in a single SQLite table
pub struct SqliteKeyValueStore {
    conn: Mutex<Connection>,
}

impl SqliteKeyValueStore {
    /// Open (or create) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        tracing::debug!("Opened key-value store at {}", path.as_ref().display());
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key   TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        // Updating in place keeps the existing rowid and therefore the key order
        let updated = conn.execute("UPDATE kv_store SET value = ?2 WHERE key = ?1", params![key, value])?;
        if updated == 0 {
            conn.execute("INSERT INTO kv_store (key, value) VALUES (?1, ?2)", params![key, value])?;
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.conn.lock().execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT key FROM kv_store ORDER BY rowid")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(keys)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT key FROM kv_store WHERE substr(key, 1, length(?1)) = ?1 ORDER BY rowid")?;
        let keys = stmt
            .query_map(params![prefix], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layouts.db");

        {
            let store = SqliteKeyValueStore::open(&path).unwrap();
            store.set("gdatagrid.orders.1", "{}").unwrap();
            store.set("gdatagrid.newid", "2").unwrap();
            store.set("gdatagrid.orders.1", "{\"a\":1}").unwrap();
        }

        let store = SqliteKeyValueStore::open(&path).unwrap();
        assert_eq!(store.get("gdatagrid.orders.1").unwrap().as_deref(), Some("{\"a\":1}"));
        assert_eq!(store.keys().unwrap(), vec!["gdatagrid.orders.1", "gdatagrid.newid"]);
    }

    #[test]
    fn test_prefix_and_remove() {
        let store = SqliteKeyValueStore::in_memory().unwrap();
        store.set("a.1", "x").unwrap();
        store.set("b.1", "y").unwrap();
        store.set("a.2", "z").unwrap();
        store.set("a_%", "w").unwrap();

        assert_eq!(store.keys_with_prefix("a.").unwrap(), vec!["a.1", "a.2"]);
        assert_eq!(store.keys_with_prefix("a_").unwrap(), vec!["a_%"]);

        store.remove("a.1").unwrap();
        assert_eq!(store.get("a.1").unwrap(), None);
        assert_eq!(store.keys_with_prefix("a.").unwrap(), vec!["a.2"]);
    }
}
