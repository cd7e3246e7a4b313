//! Cache storage trait with SQLite and in-memory implementations.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use super::traits::{CacheEntry, Cacheable};
use crate::db;

/// Trait for cache storage backends.
pub trait CacheStorage: Send + Sync {
  /// Get the entry stored under `key`, expired or not.
  fn get_entry<T: Cacheable>(&self, key: &str) -> Result<Option<CacheEntry<T>>>;

  /// Create the entry, or overwrite payload/timestamps/version of the
  /// existing one in place.
  fn upsert_entry<T: Cacheable>(&self, entry: &CacheEntry<T>) -> Result<()>;
}

/// Raw stored row, payload still serialized.
#[derive(Debug, Clone)]
struct StoredRow {
  payload: Vec<u8>,
  fetched_at: DateTime<Utc>,
  expires_at: DateTime<Utc>,
  version: Option<String>,
}

fn decode_row<T: Cacheable>(key: &str, row: StoredRow) -> Result<CacheEntry<T>> {
  let payload: T = serde_json::from_slice(&row.payload)
    .map_err(|e| eyre!("Failed to deserialize cached {} {}: {}", T::entity_type(), key, e))?;

  Ok(CacheEntry {
    key: key.to_string(),
    payload,
    fetched_at: row.fetched_at,
    expires_at: row.expires_at,
    version: row.version,
  })
}

/// Process-lifetime storage, used when the cache is not persisted.
#[derive(Debug, Default)]
pub struct MemoryStorage {
  rows: Mutex<HashMap<(&'static str, String), StoredRow>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

impl CacheStorage for MemoryStorage {
  fn get_entry<T: Cacheable>(&self, key: &str) -> Result<Option<CacheEntry<T>>> {
    let rows = self
      .rows
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    match rows.get(&(T::entity_type(), key.to_string())) {
      Some(row) => decode_row(key, row.clone()).map(Some),
      None => Ok(None),
    }
  }

  fn upsert_entry<T: Cacheable>(&self, entry: &CacheEntry<T>) -> Result<()> {
    let payload = serde_json::to_vec(&entry.payload)
      .map_err(|e| eyre!("Failed to serialize {}: {}", T::entity_type(), e))?;

    let mut rows = self
      .rows
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    rows.insert(
      (T::entity_type(), entry.key.clone()),
      StoredRow {
        payload,
        fetched_at: entry.fetched_at,
        expires_at: entry.expires_at,
        version: entry.version.clone(),
      },
    );

    Ok(())
  }
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open (or create) the cache database at `path`.
  pub fn open(path: &Path) -> Result<Self> {
    let conn = db::open(path)?;
    Self::with_connection(conn)
  }

  /// Wrap an existing connection, creating the cache tables if needed.
  pub fn with_connection(conn: Connection) -> Result<Self> {
    db::migrate(&conn, CACHE_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  #[cfg(test)]
  fn row_id(&self, entity_type: &str, key: &str) -> Option<i64> {
    let conn = self.conn.lock().unwrap();
    conn
      .query_row(
        "SELECT id FROM cache_entries WHERE entity_type = ? AND cache_key = ?",
        params![entity_type, key],
        |row| row.get(0),
      )
      .optional()
      .unwrap()
  }
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
-- One row per (entity type, key); rows are overwritten in place, never deleted
CREATE TABLE IF NOT EXISTS cache_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_type TEXT NOT NULL,
    cache_key TEXT NOT NULL,
    payload BLOB NOT NULL,
    fetched_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    version TEXT,
    UNIQUE (entity_type, cache_key)
);

CREATE INDEX IF NOT EXISTS idx_cache_entries_expires
    ON cache_entries(entity_type, expires_at);
"#;

impl CacheStorage for SqliteStorage {
  fn get_entry<T: Cacheable>(&self, key: &str) -> Result<Option<CacheEntry<T>>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let row: Option<(Vec<u8>, String, String, Option<String>)> = conn
      .query_row(
        "SELECT payload, fetched_at, expires_at, version FROM cache_entries
         WHERE entity_type = ? AND cache_key = ?",
        params![T::entity_type(), key],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read cache entry {}: {}", key, e))?;

    match row {
      Some((payload, fetched_at, expires_at, version)) => {
        let row = StoredRow {
          payload,
          fetched_at: parse_datetime(&fetched_at)?,
          expires_at: parse_datetime(&expires_at)?,
          version,
        };
        decode_row(key, row).map(Some)
      }
      None => Ok(None),
    }
  }

  fn upsert_entry<T: Cacheable>(&self, entry: &CacheEntry<T>) -> Result<()> {
    let payload = serde_json::to_vec(&entry.payload)
      .map_err(|e| eyre!("Failed to serialize {}: {}", T::entity_type(), e))?;

    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT INTO cache_entries (entity_type, cache_key, payload, fetched_at, expires_at, version)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT (entity_type, cache_key) DO UPDATE SET
           payload = excluded.payload,
           fetched_at = excluded.fetched_at,
           expires_at = excluded.expires_at,
           version = excluded.version",
        params![
          T::entity_type(),
          entry.key,
          payload,
          entry.fetched_at.to_rfc3339(),
          entry.expires_at.to_rfc3339(),
          entry.version,
        ],
      )
      .map_err(|e| eyre!("Failed to store cache entry {}: {}", entry.key, e))?;

    Ok(())
  }
}

/// Parse an RFC 3339 timestamp as written by `upsert_entry`.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}
