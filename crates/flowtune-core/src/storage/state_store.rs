//! Namespaced key-value persistence for learned state.
//!
//! Three independent namespaces (bandit, zone, capacity) each map a context
//! key to one JSON blob. The engine is written against the [`StateStore`]
//! trait and injected with a concrete store, so tests run on the in-memory
//! implementation and production runs on SQLite.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;

use super::data_dir;

/// State namespaces, one per learned map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Bandit,
    Zone,
    Capacity,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Bandit => "bandit",
            Namespace::Zone => "zone",
            Namespace::Capacity => "capacity",
        }
    }

    pub const ALL: [Namespace; 3] = [Namespace::Bandit, Namespace::Zone, Namespace::Capacity];
}

/// Durable map of `(namespace, key) -> JSON blob`.
pub trait StateStore {
    /// Fetch the raw blob for a key.
    fn get_raw(&self, ns: Namespace, key: &str) -> Result<Option<String>, StorageError>;

    /// Store the raw blob for a key, overwriting.
    fn put_raw(&self, ns: Namespace, key: &str, value: &str) -> Result<(), StorageError>;

    /// All keys in a namespace.
    fn keys(&self, ns: Namespace) -> Result<Vec<String>, StorageError>;

    /// Drop a whole namespace.
    fn clear(&self, ns: Namespace) -> Result<(), StorageError>;
}

/// Typed accessors layered over the raw trait.
impl<'a> dyn StateStore + 'a {
    pub fn get_json<T: DeserializeOwned>(
        &self,
        ns: Namespace,
        key: &str,
    ) -> Result<Option<T>, StorageError> {
        match self.get_raw(ns, key)? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StorageError::CorruptState {
                    key: format!("{}/{key}", ns.as_str()),
                    message: e.to_string(),
                }),
        }
    }

    pub fn put_json<T: Serialize>(
        &self,
        ns: Namespace,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|e| StorageError::CorruptState {
            key: format!("{}/{key}", ns.as_str()),
            message: e.to_string(),
        })?;
        self.put_raw(ns, key, &raw)
    }
}

/// SQLite-backed store, one `state` table keyed by `(namespace, key)`.
pub struct SqliteStateStore {
    conn: Connection,
}

impl SqliteStateStore {
    /// Open the store at `~/.config/flowtune/state.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))?
            .join("state.db");
        Self::open_at(path)
    }

    /// Open the store at an explicit path.
    pub fn open_at(path: PathBuf) -> Result<Self, StorageError> {
        let conn = Connection::open(&path).map_err(|source| StorageError::OpenFailed {
            path,
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (for tests).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS state (
                namespace TEXT NOT NULL,
                key       TEXT NOT NULL,
                value     TEXT NOT NULL,
                PRIMARY KEY (namespace, key)
            );",
        )
        .map_err(|e| StorageError::MigrationFailed(e.to_string()))?;
        Ok(())
    }
}

impl StateStore for SqliteStateStore {
    fn get_raw(&self, ns: Namespace, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM state WHERE namespace = ?1 AND key = ?2")?;
        let result = stmt.query_row(params![ns.as_str(), key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put_raw(&self, ns: Namespace, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO state (namespace, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(namespace, key) DO UPDATE SET value = excluded.value",
            params![ns.as_str(), key, value],
        )?;
        Ok(())
    }

    fn keys(&self, ns: Namespace) -> Result<Vec<String>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM state WHERE namespace = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![ns.as_str()], |row| row.get::<_, String>(0))?;
        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }

    fn clear(&self, ns: Namespace) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM state WHERE namespace = ?1", params![ns.as_str()])?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStateStore {
    maps: Mutex<HashMap<(Namespace, String), String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn get_raw(&self, ns: Namespace, key: &str) -> Result<Option<String>, StorageError> {
        let maps = self.maps.lock().expect("memory store mutex poisoned");
        Ok(maps.get(&(ns, key.to_string())).cloned())
    }

    fn put_raw(&self, ns: Namespace, key: &str, value: &str) -> Result<(), StorageError> {
        let mut maps = self.maps.lock().expect("memory store mutex poisoned");
        maps.insert((ns, key.to_string()), value.to_string());
        Ok(())
    }

    fn keys(&self, ns: Namespace) -> Result<Vec<String>, StorageError> {
        let maps = self.maps.lock().expect("memory store mutex poisoned");
        let mut keys: Vec<String> = maps
            .keys()
            .filter(|(n, _)| *n == ns)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn clear(&self, ns: Namespace) -> Result<(), StorageError> {
        let mut maps = self.maps.lock().expect("memory store mutex poisoned");
        maps.retain(|(n, _), _| *n != ns);
        Ok(())
    }
}
