//! Error types for the nutrition core.
//!
//! Adapters (SQLite storage, config loading, the CLI) work with
//! `color_eyre::Result`; anything a caller of the calculation core has to
//! branch on is a [`NutritionError`] variant.

use crate::livsmedel::UpstreamError;

/// Errors surfaced by lookups and nutrition calculations.
#[derive(Debug, thiserror::Error)]
pub enum NutritionError {
  /// Upstream fetch failed after retries and nothing was cached for the key.
  #[error("upstream food database unavailable for {key}: {source}")]
  UpstreamUnavailable {
    key: String,
    #[source]
    source: UpstreamError,
  },

  #[error("recipe {0} not found")]
  RecipeNotFound(String),

  #[error("diary entry {0} not found")]
  EntryNotFound(String),

  /// The entry's fields do not match its declared type.
  #[error("invalid diary entry {entry_id}: {reason}")]
  InvalidEntry { entry_id: String, reason: String },

  #[error("invalid search query: {0}")]
  InvalidQuery(String),

  /// Cache or diary storage failed to read or write.
  #[error("storage error: {0}")]
  Storage(String),
}

impl NutritionError {
  pub fn invalid_entry(entry_id: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::InvalidEntry {
      entry_id: entry_id.into(),
      reason: reason.into(),
    }
  }
}

// Storage adapters report through eyre; keep the full chain in the message.
impl From<color_eyre::Report> for NutritionError {
  fn from(report: color_eyre::Report) -> Self {
    Self::Storage(format!("{:#}", report))
  }
}

pub type NutritionResult<T> = Result<T, NutritionError>;
