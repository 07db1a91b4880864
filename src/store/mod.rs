//! Persistent key-value store backed by SQLite.
//!
//! Holds the navigation history log, the settings object and the cloak
//! profile as JSON documents, one row per key.
//!
//! Design:
//! - Each value is read and written whole; there is no partial-field update
//! - Absent or unreadable values load as `None` and the caller substitutes
//!   its default
//! - WAL mode so a second process can read while another writes
//! - In-process only, no external DB server needed

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

// ── Errors ────────────────────────────────────────────────────────

/// Failures writing to the underlying database.
///
/// Reads never produce these: a value that cannot be read is treated as
/// absent.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("could not encode value for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not create data directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ── KvStore ───────────────────────────────────────────────────────

/// Application-scoped key → JSON store.
pub struct KvStore {
    conn: Connection,
}

impl KvStore {
    /// Open (or create) the store.
    ///
    /// If `path` is `None`, uses an in-memory database (useful for tests).
    pub fn open(path: Option<&Path>) -> Result<Self, StoreError> {
        let conn = match path {
            Some(p) => {
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent).map_err(|source| {
                            StoreError::CreateDir {
                                path: parent.to_path_buf(),
                                source,
                            }
                        })?;
                    }
                }
                Connection::open(p)?
            }
            None => Connection::open_in_memory()?,
        };

        let store = Self { conn };
        store.init_schema()?;
        debug!(path = ?path, "opened state store");
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        // journal_mode returns a row, so it can't go through execute_batch
        let _mode: String = self
            .conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_ms INTEGER NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Load and decode the value stored under `key`.
    ///
    /// Returns `None` when the key is absent, the row can't be read, or the
    /// stored JSON doesn't decode as `T`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.get_raw(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "failed to read stored value, using default");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "stored value is corrupt, using default");
                None
            }
        }
    }

    /// Encode `value` as JSON and store it under `key`, replacing any
    /// previous value.
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.set_raw(key, &raw)
    }

    /// Raw JSON text stored under `key`.
    pub fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Store raw text under `key` without validating it.
    pub fn set_raw(&self, key: &str, raw: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_ms) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_ms = excluded.updated_ms",
            params![key, raw, now_epoch_ms()],
        )?;
        Ok(())
    }
}

fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    fn sample() -> Sample {
        Sample {
            name: "alpha".to_string(),
            count: 3,
        }
    }

    #[test]
    fn open_in_memory() {
        let store = KvStore::open(None).unwrap();
        assert_eq!(store.get_raw("anything").unwrap(), None);
    }

    #[test]
    fn load_absent_key_is_none() {
        let store = KvStore::open(None).unwrap();
        assert_eq!(store.load::<Sample>("missing"), None);
    }

    #[test]
    fn save_then_load() {
        let store = KvStore::open(None).unwrap();
        store.save("sample", &sample()).unwrap();
        assert_eq!(store.load::<Sample>("sample"), Some(sample()));
    }

    #[test]
    fn save_replaces_previous_value() {
        let store = KvStore::open(None).unwrap();
        store.save("sample", &sample()).unwrap();
        let updated = Sample {
            name: "beta".to_string(),
            count: 9,
        };
        store.save("sample", &updated).unwrap();
        assert_eq!(store.load::<Sample>("sample"), Some(updated));
    }

    #[test]
    fn corrupt_value_loads_as_none() {
        let store = KvStore::open(None).unwrap();
        store.set_raw("sample", "{not json").unwrap();
        assert_eq!(store.load::<Sample>("sample"), None);
    }

    #[test]
    fn wrong_shape_loads_as_none() {
        let store = KvStore::open(None).unwrap();
        store.set_raw("sample", r#"{"name":"alpha"}"#).unwrap();
        assert_eq!(store.load::<Sample>("sample"), None);
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.db");
        {
            let store = KvStore::open(Some(&path)).unwrap();
            store.save("sample", &sample()).unwrap();
        }
        let store = KvStore::open(Some(&path)).unwrap();
        assert_eq!(store.load::<Sample>("sample"), Some(sample()));
    }
}
