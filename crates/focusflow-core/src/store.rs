//! Synchronized key-value persistence.
//!
//! Every stateful domain object owns exactly one named slot holding a JSON
//! document (`settings`, `stats`, `alarm`, `timetable`, ...). The [`Store`]
//! is the sole mutation gateway to durable storage:
//!
//! - values are committed to the in-memory cache first, then persisted
//!   best-effort (storage failures are logged, never fatal)
//! - a commit whose serialized form equals the previous one is dropped
//!   entirely: no write, no change signal
//! - every real commit is broadcast to all live subscribers of that key
//! - [`Store::poll_external`] picks up writes made by other processes
//!   sharing the same database file
//!
//! Backed by a SQLite `kv` table at `~/.config/focusflow/focusflow.db`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

/// Returns `~/.config/focusflow/`, honoring the `FOCUSFLOW_DATA_DIR`
/// override (used by tests and dev setups).
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    let dir = match std::env::var("FOCUSFLOW_DATA_DIR") {
        Ok(custom) => PathBuf::from(custom),
        Err(_) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("focusflow"),
    };
    std::fs::create_dir_all(&dir).map_err(|e| StoreError::DataDir(e.to_string()))?;
    Ok(dir)
}

struct Subscriber {
    key: String,
    tx: Sender<serde_json::Value>,
}

/// Receiving end of change signals for one key.
///
/// Delivery is at-least-once: every commit made while the subscription is
/// live lands in the channel until drained.
pub struct Subscription {
    rx: Receiver<serde_json::Value>,
}

impl Subscription {
    /// Drain all pending change signals, returning the most recent value.
    pub fn latest<T: DeserializeOwned>(&self) -> Option<T> {
        let mut last = None;
        while let Ok(value) = self.rx.try_recv() {
            last = Some(value);
        }
        last.and_then(|value| serde_json::from_value(value).ok())
    }

    /// Take the oldest pending change signal, if any.
    pub fn next<T: DeserializeOwned>(&self) -> Option<T> {
        self.rx
            .try_recv()
            .ok()
            .and_then(|value| serde_json::from_value(value).ok())
    }
}

/// Synchronized key-value store over a SQLite `kv` table.
pub struct Store {
    conn: Connection,
    /// Last committed serialized value per key.
    cache: HashMap<String, String>,
    subscribers: Vec<Subscriber>,
}

impl Store {
    /// Open the store at `~/.config/focusflow/focusflow.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory or database is unavailable.
    pub fn open() -> Result<Self, StoreError> {
        Self::open_at(&data_dir()?.join("focusflow.db"))
    }

    /// Open the store at an explicit path. Processes opening the same path
    /// share storage; see [`Store::poll_external`].
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self {
            conn,
            cache: HashMap::new(),
            subscribers: Vec::new(),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (tests, ephemeral sessions).
    ///
    /// # Errors
    /// Returns an error if SQLite cannot allocate the database.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn,
            cache: HashMap::new(),
            subscribers: Vec::new(),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    fn read_raw(&self, key: &str) -> Option<String> {
        let result = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            });
        match result {
            Ok(value) => Some(value),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "store read failed, treating key as absent");
                None
            }
        }
    }

    /// Best-effort persist. On failure the in-memory cache still holds the
    /// new value, so local readers stay consistent.
    fn write_raw(&self, key: &str, serialized: &str) {
        let result = self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, serialized],
        );
        if let Err(e) = result {
            tracing::warn!(key, error = %e, "store write failed, continuing in-memory only");
        }
    }

    /// Read a value. Returns `None` if the key is absent or its document
    /// cannot be parsed.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let raw = match self.cache.get(key) {
            Some(raw) => raw.clone(),
            None => {
                let raw = self.read_raw(key)?;
                self.cache.insert(key.to_string(), raw.clone());
                raw
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "malformed document in store");
                None
            }
        }
    }

    /// Read a value, seeding the key with a lazily-computed default when it
    /// is absent. Malformed documents fall back to the default without
    /// overwriting what is on disk.
    pub fn get_or_init<T, F>(&mut self, key: &str, default: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> T,
    {
        match self.cache.get(key).cloned().or_else(|| self.read_raw(key)) {
            Some(raw) => {
                self.cache.insert(key.to_string(), raw.clone());
                match serde_json::from_str(&raw) {
                    Ok(value) => value,
                    Err(e) => {
                        tracing::warn!(key, error = %e, "malformed document, using default");
                        default()
                    }
                }
            }
            None => {
                let value = default();
                self.set(key, &value);
                value
            }
        }
    }

    /// Commit a value. No-op when the serialized form is unchanged.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) {
        let serialized = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(key, error = %e, "serialization failed, value not committed");
                return;
            }
        };
        self.commit(key, serialized);
    }

    /// Functional update: `f` receives the latest committed value (or `None`
    /// when the key has never been written) and returns the replacement.
    /// Successive calls within one tick each see the previous result.
    pub fn update<T, F>(&mut self, key: &str, f: F) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(Option<T>) -> T,
    {
        let current = self.get(key);
        let next = f(current);
        self.set(key, &next);
        next
    }

    /// Subscribe to change signals for one key.
    pub fn subscribe(&mut self, key: &str) -> Subscription {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(Subscriber {
            key: key.to_string(),
            tx,
        });
        Subscription { rx }
    }

    /// Re-read every cached key from disk and broadcast the ones another
    /// process changed. Returns the number of changed keys.
    pub fn poll_external(&mut self) -> usize {
        let keys: Vec<String> = self.cache.keys().cloned().collect();
        let mut changed = 0;
        for key in keys {
            if let Some(raw) = self.read_raw(&key) {
                if self.cache.get(&key) != Some(&raw) {
                    self.cache.insert(key.clone(), raw.clone());
                    self.broadcast(&key, &raw);
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Returns true when the value actually changed.
    fn commit(&mut self, key: &str, serialized: String) -> bool {
        let previous = self.cache.get(key).cloned().or_else(|| self.read_raw(key));
        if previous.as_deref() == Some(serialized.as_str()) {
            return false;
        }
        self.cache.insert(key.to_string(), serialized.clone());
        self.write_raw(key, &serialized);
        self.broadcast(key, &serialized);
        true
    }

    fn broadcast(&mut self, key: &str, serialized: &str) {
        let value: serde_json::Value = match serde_json::from_str(serialized) {
            Ok(v) => v,
            Err(_) => return,
        };
        // Drop subscribers whose receiving end is gone.
        self.subscribers
            .retain(|s| s.key != key || s.tx.send(value.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn get_or_init_seeds_default() {
        let mut store = Store::open_memory().unwrap();
        let v: u32 = store.get_or_init("counter", || 7);
        assert_eq!(v, 7);
        assert_eq!(store.get::<u32>("counter"), Some(7));
    }

    #[test]
    fn set_then_get_roundtrip() {
        let mut store = Store::open_memory().unwrap();
        store.set("greeting", &"hello".to_string());
        assert_eq!(store.get::<String>("greeting").as_deref(), Some("hello"));
    }

    #[test]
    fn update_sees_latest_committed_value() {
        let mut store = Store::open_memory().unwrap();
        store.set("n", &1u32);
        store.update("n", |v: Option<u32>| v.unwrap_or(0) + 10);
        store.update("n", |v: Option<u32>| v.unwrap_or(0) * 2);
        assert_eq!(store.get::<u32>("n"), Some(22));
    }

    #[test]
    fn all_subscribers_of_a_key_receive_commits() {
        let mut store = Store::open_memory().unwrap();
        let a = store.subscribe("settings");
        let b = store.subscribe("settings");
        let other = store.subscribe("stats");
        store.set("settings", &42u32);
        assert_eq!(a.latest::<u32>(), Some(42));
        assert_eq!(b.latest::<u32>(), Some(42));
        assert_eq!(other.latest::<u32>(), None);
    }

    #[test]
    fn unchanged_value_short_circuits() {
        let mut store = Store::open_memory().unwrap();
        store.set("k", &"same".to_string());
        let sub = store.subscribe("k");
        store.set("k", &"same".to_string());
        assert!(sub.next::<String>().is_none());
        store.set("k", &"different".to_string());
        assert_eq!(sub.next::<String>().as_deref(), Some("different"));
    }

    #[test]
    fn malformed_document_falls_back_to_default() {
        let mut store = Store::open_memory().unwrap();
        store.write_raw("broken", "{not json");
        let v: u32 = store.get_or_init("broken", || 3);
        assert_eq!(v, 3);
        // The on-disk document is left alone.
        assert_eq!(store.read_raw("broken").as_deref(), Some("{not json"));
    }

    #[test]
    fn poll_external_picks_up_writes_from_another_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.db");
        let mut writer = Store::open_at(&path).unwrap();
        let mut reader = Store::open_at(&path).unwrap();

        // Reader must have the key cached before it can watch it.
        let _: u32 = reader.get_or_init("shared", || 0);
        let sub = reader.subscribe("shared");

        writer.set("shared", &99u32);
        assert_eq!(reader.poll_external(), 1);
        assert_eq!(sub.latest::<u32>(), Some(99));
        assert_eq!(reader.get::<u32>("shared"), Some(99));
    }

    proptest! {
        /// The final persisted value equals the last functional update
        /// applied to the initial default, for any op sequence.
        #[test]
        fn functional_updates_fold(ops in proptest::collection::vec(-1000i64..1000, 1..40)) {
            let mut store = Store::open_memory().unwrap();
            let _sub_a = store.subscribe("acc");
            let _sub_b = store.subscribe("acc");
            let mut expected = 0i64;
            for op in &ops {
                let op = *op;
                store.update("acc", move |v: Option<i64>| v.unwrap_or(0) + op);
                expected += op;
            }
            prop_assert_eq!(store.get::<i64>("acc"), Some(expected));
        }
    }
}
