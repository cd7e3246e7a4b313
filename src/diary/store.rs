//! Diary storage contract and SQLite implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;

use super::types::{clock_time, DiaryEntry, Recipe, RecipeItem};
use crate::db;
use crate::error::NutritionResult;

/// Read access to diary entries and recipes.
#[async_trait]
pub trait DiaryStore: Send + Sync {
  /// Entries for a client with `from <= date <= to`, ordered by date then time.
  async fn list_entries(
    &self,
    client_id: &str,
    from: NaiveDate,
    to: NaiveDate,
  ) -> NutritionResult<Vec<DiaryEntry>>;

  async fn get_entry(&self, entry_id: &str) -> NutritionResult<Option<DiaryEntry>>;

  async fn get_recipe(&self, recipe_id: &str) -> NutritionResult<Option<Recipe>>;
}

/// Schema for diary tables.
const DIARY_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS recipes (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    servings INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS recipe_items (
    recipe_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    food_id TEXT NOT NULL,
    grams REAL NOT NULL,
    name_snapshot TEXT NOT NULL,
    PRIMARY KEY (recipe_id, position),
    FOREIGN KEY (recipe_id) REFERENCES recipes(id) ON DELETE CASCADE
);

-- recipe_id may reference a recipe that no longer exists
CREATE TABLE IF NOT EXISTS diary_entries (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    client_id TEXT NOT NULL,
    date TEXT NOT NULL,
    meal_type TEXT NOT NULL,
    entry_type TEXT NOT NULL,
    food_id TEXT,
    recipe_id TEXT,
    food_name_snapshot TEXT NOT NULL,
    grams REAL NOT NULL,
    time TEXT,
    comment TEXT
);

CREATE INDEX IF NOT EXISTS idx_diary_entries_client_date
    ON diary_entries(client_id, date);
"#;

const ENTRY_COLUMNS: &str = "id, client_id, date, meal_type, entry_type, food_id, recipe_id, \
                             food_name_snapshot, grams, time, comment";

/// SQLite-backed diary.
pub struct SqliteDiaryStore {
  conn: Mutex<Connection>,
}

impl SqliteDiaryStore {
  /// Open (or create) the diary database at `path`.
  pub fn open(path: &Path) -> Result<Self> {
    let conn = db::open(path)?;
    Self::with_connection(conn)
  }

  pub fn with_connection(conn: Connection) -> Result<Self> {
    db::migrate(&conn, DIARY_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Insert an entry, replacing any entry with the same id.
  pub fn insert_entry(&self, entry: &DiaryEntry) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT INTO diary_entries (id, client_id, date, meal_type, entry_type, food_id, recipe_id,
                                    food_name_snapshot, grams, time, comment)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (id) DO UPDATE SET
           client_id = excluded.client_id,
           date = excluded.date,
           meal_type = excluded.meal_type,
           entry_type = excluded.entry_type,
           food_id = excluded.food_id,
           recipe_id = excluded.recipe_id,
           food_name_snapshot = excluded.food_name_snapshot,
           grams = excluded.grams,
           time = excluded.time,
           comment = excluded.comment",
        params![
          entry.id,
          entry.client_id,
          entry.date.to_string(),
          entry.meal_type.as_str(),
          entry.entry_type.as_str(),
          entry.food_id,
          entry.recipe_id,
          entry.food_name_snapshot,
          entry.grams,
          entry.time.as_ref().map(clock_time::format),
          entry.comment,
        ],
      )
      .map_err(|e| eyre!("Failed to store diary entry {}: {}", entry.id, e))?;

    Ok(())
  }

  /// Insert a recipe with its items, replacing any recipe with the same id.
  pub fn insert_recipe(&self, recipe: &Recipe) -> Result<()> {
    let mut conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;

    tx.execute(
      "INSERT INTO recipes (id, name, servings) VALUES (?, ?, ?)
       ON CONFLICT (id) DO UPDATE SET name = excluded.name, servings = excluded.servings",
      params![recipe.id, recipe.name, recipe.servings],
    )
    .map_err(|e| eyre!("Failed to store recipe {}: {}", recipe.id, e))?;

    tx.execute(
      "DELETE FROM recipe_items WHERE recipe_id = ?",
      params![recipe.id],
    )
    .map_err(|e| eyre!("Failed to clear recipe items: {}", e))?;

    for (position, item) in recipe.items.iter().enumerate() {
      tx.execute(
        "INSERT INTO recipe_items (recipe_id, position, food_id, grams, name_snapshot)
         VALUES (?, ?, ?, ?, ?)",
        params![recipe.id, position, item.food_id, item.grams, item.name_snapshot],
      )
      .map_err(|e| eyre!("Failed to store recipe item: {}", e))?;
    }

    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(())
  }

  fn query_entries(&self, client_id: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<DiaryEntry>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let sql = format!(
      "SELECT {} FROM diary_entries
       WHERE client_id = ? AND date >= ? AND date <= ?
       ORDER BY date, time IS NULL, time, seq",
      ENTRY_COLUMNS
    );
    let mut stmt = conn
      .prepare(&sql)
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let rows = stmt
      .query_map(
        params![client_id, from.to_string(), to.to_string()],
        RawEntry::from_row,
      )
      .map_err(|e| eyre!("Failed to query diary entries: {}", e))?;

    let mut entries = Vec::new();
    for row in rows {
      let raw = row.map_err(|e| eyre!("Failed to read diary entry: {}", e))?;
      entries.push(raw.into_entry()?);
    }
    Ok(entries)
  }

  fn query_entry(&self, entry_id: &str) -> Result<Option<DiaryEntry>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let sql = format!("SELECT {} FROM diary_entries WHERE id = ?", ENTRY_COLUMNS);
    let raw = conn
      .query_row(&sql, params![entry_id], RawEntry::from_row)
      .optional()
      .map_err(|e| eyre!("Failed to read diary entry {}: {}", entry_id, e))?;

    raw.map(RawEntry::into_entry).transpose()
  }

  fn query_recipe(&self, recipe_id: &str) -> Result<Option<Recipe>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let header: Option<(String, u32)> = conn
      .query_row(
        "SELECT name, servings FROM recipes WHERE id = ?",
        params![recipe_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read recipe {}: {}", recipe_id, e))?;

    let Some((name, servings)) = header else {
      return Ok(None);
    };

    let mut stmt = conn
      .prepare(
        "SELECT food_id, grams, name_snapshot FROM recipe_items
         WHERE recipe_id = ? ORDER BY position",
      )
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let items = stmt
      .query_map(params![recipe_id], |row| {
        Ok(RecipeItem {
          food_id: row.get(0)?,
          grams: row.get(1)?,
          name_snapshot: row.get(2)?,
        })
      })
      .map_err(|e| eyre!("Failed to query recipe items: {}", e))?
      .collect::<rusqlite::Result<Vec<_>>>()
      .map_err(|e| eyre!("Failed to read recipe item: {}", e))?;

    Ok(Some(Recipe {
      id: recipe_id.to_string(),
      name,
      servings,
      items,
    }))
  }
}

#[async_trait]
impl DiaryStore for SqliteDiaryStore {
  async fn list_entries(
    &self,
    client_id: &str,
    from: NaiveDate,
    to: NaiveDate,
  ) -> NutritionResult<Vec<DiaryEntry>> {
    Ok(self.query_entries(client_id, from, to)?)
  }

  async fn get_entry(&self, entry_id: &str) -> NutritionResult<Option<DiaryEntry>> {
    Ok(self.query_entry(entry_id)?)
  }

  async fn get_recipe(&self, recipe_id: &str) -> NutritionResult<Option<Recipe>> {
    Ok(self.query_recipe(recipe_id)?)
  }
}

/// Entry row with text columns not yet parsed.
struct RawEntry {
  id: String,
  client_id: String,
  date: String,
  meal_type: String,
  entry_type: String,
  food_id: Option<String>,
  recipe_id: Option<String>,
  food_name_snapshot: String,
  grams: f64,
  time: Option<String>,
  comment: Option<String>,
}

impl RawEntry {
  fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id: row.get(0)?,
      client_id: row.get(1)?,
      date: row.get(2)?,
      meal_type: row.get(3)?,
      entry_type: row.get(4)?,
      food_id: row.get(5)?,
      recipe_id: row.get(6)?,
      food_name_snapshot: row.get(7)?,
      grams: row.get(8)?,
      time: row.get(9)?,
      comment: row.get(10)?,
    })
  }

  fn into_entry(self) -> Result<DiaryEntry> {
    let date = self
      .date
      .parse::<NaiveDate>()
      .map_err(|e| eyre!("Invalid date '{}' on entry {}: {}", self.date, self.id, e))?;
    let meal_type = self.meal_type.parse().map_err(|e| eyre!("{}", e))?;
    let entry_type = self.entry_type.parse().map_err(|e| eyre!("{}", e))?;
    let time = match self.time {
      Some(t) => Some(
        clock_time::parse(&t).ok_or_else(|| eyre!("Invalid time '{}' on entry {}", t, self.id))?,
      ),
      None => None,
    };

    Ok(DiaryEntry {
      id: self.id,
      client_id: self.client_id,
      date,
      meal_type,
      entry_type,
      food_id: self.food_id,
      recipe_id: self.recipe_id,
      food_name_snapshot: self.food_name_snapshot,
      grams: self.grams,
      time,
      comment: self.comment,
    })
  }
}
