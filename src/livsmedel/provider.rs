//! Contract for the upstream food database.

use async_trait::async_trait;

use super::types::{FoodItem, NutrientPayload, SearchResult};

/// Failure talking to the upstream food database.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("HTTP {status}: {body}")]
  Status { status: u16, body: String },

  #[error("unexpected response body: {0}")]
  Decode(String),

  #[error("service unavailable: {0}")]
  Unavailable(String),
}

impl UpstreamError {
  /// Whether retrying the same request may succeed.
  pub fn is_transient(&self) -> bool {
    match self {
      Self::Transport(e) => !e.is_decode() && !e.is_builder(),
      Self::Status { status, .. } => *status == 429 || *status >= 500,
      Self::Decode(_) => false,
      Self::Unavailable(_) => true,
    }
  }
}

/// Upstream nutrient provider. Network errors are the only expected failures.
#[async_trait]
pub trait NutrientProvider: Send + Sync {
  async fn fetch_food_info(&self, food_id: &str) -> Result<FoodItem, UpstreamError>;

  /// Nutrients per 100 g for a food.
  async fn fetch_nutrients(&self, food_id: &str) -> Result<NutrientPayload, UpstreamError>;

  async fn search_foods(&self, query: &str, limit: u32) -> Result<SearchResult, UpstreamError>;
}
