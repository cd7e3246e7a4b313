//! Nutrient lookups with transparent read-through caching.

use async_trait::async_trait;

use crate::cache::{CacheLayer, CacheResult, CacheStorage, StaleStatus};
use crate::error::NutritionResult;
use crate::nutrition::NutrientSource;

use super::lookup::FoodLookupClient;
use super::types::{FoodItem, NutrientPayload, SearchResult};

/// Food database lookups with caching and stale fallback.
///
/// This wraps the retrying [`FoodLookupClient`]: nutrient and food info
/// lookups go through the cache, searches go straight upstream.
#[derive(Clone)]
pub struct NutrientLookupCache<S: CacheStorage> {
  inner: FoodLookupClient,
  cache: CacheLayer<S>,
}

impl<S: CacheStorage> NutrientLookupCache<S> {
  pub fn new(inner: FoodLookupClient, cache: CacheLayer<S>) -> Self {
    Self { inner, cache }
  }

  /// Nutrients per 100 g for a food.
  pub async fn nutrients(&self, food_id: &str) -> NutritionResult<CacheResult<NutrientPayload>> {
    self
      .cache
      .fetch_one(food_id, || self.inner.fetch(food_id))
      .await
  }

  /// Basic info (name, latin name, remarks) for a food.
  pub async fn food_info(&self, food_id: &str) -> NutritionResult<CacheResult<FoodItem>> {
    self
      .cache
      .fetch_one(food_id, || self.inner.fetch_info(food_id))
      .await
  }

  /// Whether the cached nutrients for `food_id` have passed their TTL.
  pub fn is_stale(&self, food_id: &str) -> NutritionResult<StaleStatus> {
    self.cache.stale_status::<NutrientPayload>(food_id)
  }

  /// Food search (not cached).
  pub async fn search(&self, query: &str, limit: Option<u32>) -> NutritionResult<SearchResult> {
    self.inner.search(query, limit).await
  }
}

#[async_trait]
impl<S: CacheStorage> NutrientSource for NutrientLookupCache<S> {
  async fn nutrients(&self, food_id: &str) -> NutritionResult<CacheResult<NutrientPayload>> {
    NutrientLookupCache::nutrients(self, food_id).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheSource, MemoryStorage};
  use crate::clock::{Clock, ManualClock};
  use crate::error::NutritionError;
  use crate::livsmedel::RetryPolicy;
  use crate::test_support::FakeProvider;
  use chrono::{Duration, TimeZone, Utc};
  use std::sync::Arc;

  fn setup() -> (NutrientLookupCache<MemoryStorage>, Arc<FakeProvider>, Arc<ManualClock>) {
    let provider = Arc::new(
      FakeProvider::new().with_food("1001", "Mjölk", &[("Ener", Some(64.0)), ("Prot", Some(3.4))]),
    );
    let clock = Arc::new(ManualClock::new(
      Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
    ));
    let cache = CacheLayer::new(MemoryStorage::new())
      .with_ttl(Duration::days(7))
      .with_clock(clock.clone());
    let lookup = FoodLookupClient::new(provider.clone(), RetryPolicy::immediate(3));
    (NutrientLookupCache::new(lookup, cache), provider, clock)
  }

  #[tokio::test]
  async fn test_hit_after_fetch_skips_upstream() {
    let (cache, provider, _clock) = setup();

    let first = cache.nutrients("1001").await.unwrap();
    let second = cache.nutrients("1001").await.unwrap();

    assert_eq!(first.data, second.data);
    assert_eq!(second.source, CacheSource::CacheFresh);
    assert_eq!(provider.nutrient_calls(), 1);
  }

  #[tokio::test]
  async fn test_stale_payload_when_upstream_down() {
    let (cache, provider, clock) = setup();
    let fetched = cache.nutrients("1001").await.unwrap();

    clock.advance(Duration::days(30));
    provider.set_failing(true);

    let result = cache.nutrients("1001").await.unwrap();
    assert!(result.is_stale());
    assert_eq!(result.data, fetched.data);

    let status = cache.is_stale("1001").unwrap();
    assert!(status.is_stale);
    assert_eq!(status.fetched_at, Some(fetched.fetched_at));
  }

  #[tokio::test]
  async fn test_unreachable_without_cache() {
    let (cache, provider, _clock) = setup();
    provider.set_failing(true);

    let err = cache.nutrients("1001").await.unwrap_err();
    assert!(matches!(err, NutritionError::UpstreamUnavailable { .. }));
  }

  #[tokio::test]
  async fn test_expired_entry_refreshed() {
    let (cache, provider, clock) = setup();
    cache.nutrients("1001").await.unwrap();

    clock.advance(Duration::days(8));
    let result = cache.nutrients("1001").await.unwrap();

    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(result.fetched_at, clock.now());
    assert_eq!(provider.nutrient_calls(), 2);
    assert!(!cache.is_stale("1001").unwrap().is_stale);
  }

  #[tokio::test]
  async fn test_is_stale_never_fetches() {
    let (cache, provider, _clock) = setup();

    let status = cache.is_stale("1001").unwrap();

    assert!(!status.is_stale);
    assert!(status.fetched_at.is_none());
    assert_eq!(provider.nutrient_calls(), 0);
  }

  #[tokio::test]
  async fn test_food_info_cached_separately() {
    let (cache, provider, _clock) = setup();

    let info = cache.food_info("1001").await.unwrap();
    assert_eq!(info.data.name, "Mjölk");
    assert_eq!(provider.nutrient_calls(), 0);

    cache.nutrients("1001").await.unwrap();
    assert_eq!(provider.nutrient_calls(), 1);
  }
}
