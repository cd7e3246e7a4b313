//! Retrying lookup client over any nutrient provider.

use std::sync::Arc;

use super::provider::{NutrientProvider, UpstreamError};
use super::retry::RetryPolicy;
use super::types::{FoodItem, NutrientPayload, SearchResult};
use crate::error::{NutritionError, NutritionResult};

/// Shortest search query accepted.
pub const MIN_QUERY_LEN: usize = 2;
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
pub const MAX_SEARCH_LIMIT: u32 = 100;

/// Food lookups with retry on transient failures.
///
/// Searches are best-effort: no retry, and an upstream failure yields an
/// empty result instead of an error.
#[derive(Clone)]
pub struct FoodLookupClient {
  provider: Arc<dyn NutrientProvider>,
  retry: RetryPolicy,
}

impl FoodLookupClient {
  pub fn new(provider: Arc<dyn NutrientProvider>, retry: RetryPolicy) -> Self {
    Self { provider, retry }
  }

  pub async fn fetch(&self, food_id: &str) -> Result<NutrientPayload, UpstreamError> {
    let label = format!("livsmedel/{}/naeringsvaerden", food_id);
    self
      .retry
      .run(&label, || self.provider.fetch_nutrients(food_id))
      .await
  }

  pub async fn fetch_info(&self, food_id: &str) -> Result<FoodItem, UpstreamError> {
    let label = format!("livsmedel/{}", food_id);
    self
      .retry
      .run(&label, || self.provider.fetch_food_info(food_id))
      .await
  }

  pub async fn search(&self, query: &str, limit: Option<u32>) -> NutritionResult<SearchResult> {
    let query = query.trim();
    if query.chars().count() < MIN_QUERY_LEN {
      return Err(NutritionError::InvalidQuery(format!(
        "query must be at least {} characters",
        MIN_QUERY_LEN
      )));
    }

    let limit = limit
      .unwrap_or(DEFAULT_SEARCH_LIMIT)
      .clamp(1, MAX_SEARCH_LIMIT);

    tracing::info!(query, limit, "searching foods");
    match self.provider.search_foods(query, limit).await {
      Ok(result) => Ok(result),
      Err(err) => {
        tracing::warn!(query, error = %err, "food search failed, returning no results");
        Ok(SearchResult::default())
      }
    }
  }
}
