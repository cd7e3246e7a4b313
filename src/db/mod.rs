//! SQLite connection helpers shared by the cache and diary stores.

use color_eyre::{eyre::eyre, Result};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Open or create the database at `path`, creating parent directories.
pub fn open(path: &Path) -> Result<Connection> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)
      .map_err(|e| eyre!("Failed to create database directory: {}", e))?;
  }

  Connection::open(path).map_err(|e| eyre!("Failed to open database at {}: {}", path.display(), e))
}

/// Run a schema batch against the connection.
pub fn migrate(conn: &Connection, schema: &str) -> Result<()> {
  conn
    .execute_batch(schema)
    .map_err(|e| eyre!("Failed to run migrations: {}", e))
}

/// Default location for a database file named `file_name`.
pub fn default_path(file_name: &str) -> Result<PathBuf> {
  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join("dietlog").join(file_name))
}
