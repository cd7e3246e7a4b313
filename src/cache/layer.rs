//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use std::sync::Arc;

use super::storage::CacheStorage;
use super::traits::{CacheEntry, CacheResult, Cacheable, StaleStatus};
use crate::clock::{Clock, SystemClock};
use crate::error::{NutritionError, NutritionResult};
use crate::livsmedel::UpstreamError;

/// Longest TTL the layer accepts, about a century.
pub const MAX_TTL_DAYS: i64 = 36_500;

/// Cache layer that manages caching logic and network fetching.
///
/// This layer sits between the lookup API and the upstream client,
/// providing read-through caching with a TTL and stale fallback.
/// Concurrent refreshes of the same expired key may both hit upstream and
/// both write; the second write simply overwrites the first.
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
  clock: Arc<dyn Clock>,
  /// How long a fetched payload stays fresh
  ttl: Duration,
  /// Upstream API version recorded with every write
  version: Option<String>,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S) -> Self {
    Self {
      storage: Arc::new(storage),
      clock: Arc::new(SystemClock),
      ttl: Duration::days(7),
      version: None,
    }
  }

  /// Set the TTL, capped at [`MAX_TTL_DAYS`].
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl.min(Duration::days(MAX_TTL_DAYS));
    self
  }

  pub fn with_version(mut self, version: impl Into<String>) -> Self {
    self.version = Some(version.into());
    self
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn storage(&self) -> &S {
    &self.storage
  }

  /// Fetch a single payload with read-through caching.
  ///
  /// 1. Check cache - if unexpired, return immediately
  /// 2. If expired/missing, fetch from upstream and write through
  /// 3. On upstream failure, return the expired entry (offline mode)
  /// 4. With nothing cached, the upstream failure becomes `UpstreamUnavailable`
  pub async fn fetch_one<T, F, Fut>(&self, key: &str, fetcher: F) -> NutritionResult<CacheResult<T>>
  where
    T: Cacheable,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
  {
    let cached = self.storage.get_entry::<T>(key)?;
    let now = self.clock.now();

    if let Some(entry) = &cached {
      if !entry.is_expired(now) {
        tracing::debug!(entity = T::entity_type(), key, "cache hit");
        return Ok(CacheResult::from_cache(entry.payload.clone(), entry.fetched_at));
      }
    }

    tracing::info!(entity = T::entity_type(), key, "fetching from upstream");
    match fetcher().await {
      Ok(data) => {
        // The fetch may have taken a while; stamp with the completion time
        let fetched_at = self.clock.now();
        let entry = CacheEntry {
          key: key.to_string(),
          payload: data,
          fetched_at,
          expires_at: fetched_at
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
          version: self.version.clone(),
        };
        self.storage.upsert_entry(&entry)?;
        Ok(CacheResult::from_network(entry.payload, fetched_at))
      }
      Err(err) => match cached {
        Some(entry) => {
          tracing::warn!(
            entity = T::entity_type(),
            key,
            fetched_at = %entry.fetched_at,
            error = %err,
            "upstream failed, serving stale cache"
          );
          Ok(CacheResult::offline(entry.payload, entry.fetched_at))
        }
        None => {
          tracing::error!(entity = T::entity_type(), key, error = %err, "upstream failed, nothing cached");
          Err(NutritionError::UpstreamUnavailable {
            key: key.to_string(),
            source: err,
          })
        }
      },
    }
  }

  /// Report whether the cached copy of `key` has passed its TTL.
  ///
  /// Never fetches. A missing entry reports not-stale with no timestamp.
  pub fn stale_status<T: Cacheable>(&self, key: &str) -> NutritionResult<StaleStatus> {
    let status = match self.storage.get_entry::<T>(key)? {
      Some(entry) => StaleStatus {
        is_stale: entry.is_expired(self.clock.now()),
        fetched_at: Some(entry.fetched_at),
      },
      None => StaleStatus::default(),
    };
    Ok(status)
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      clock: Arc::clone(&self.clock),
      ttl: self.ttl,
      version: self.version.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::storage::MemoryStorage;
  use crate::cache::traits::CacheSource;
  use crate::clock::ManualClock;
  use chrono::TimeZone;
  use serde::{Deserialize, Serialize};
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Payload(u32);

  impl Cacheable for Payload {
    fn entity_type() -> &'static str {
      "payload"
    }
  }

  fn layer() -> (CacheLayer<MemoryStorage>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(
      Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
    ));
    let layer = CacheLayer::new(MemoryStorage::new())
      .with_ttl(Duration::days(7))
      .with_version("1")
      .with_clock(clock.clone());
    (layer, clock)
  }

  fn down() -> UpstreamError {
    UpstreamError::Unavailable("connection refused".to_string())
  }

  #[tokio::test]
  async fn test_second_get_is_a_hit() {
    let (layer, _clock) = layer();
    let calls = AtomicUsize::new(0);

    let first = layer
      .fetch_one("k", || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(Payload(1))
      })
      .await
      .unwrap();
    assert_eq!(first.source, CacheSource::Network);

    let second = layer
      .fetch_one("k", || async {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(Payload(2))
      })
      .await
      .unwrap();

    assert_eq!(second.source, CacheSource::CacheFresh);
    assert_eq!(second.data, Payload(1));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_miss_with_upstream_failure_is_unavailable() {
    let (layer, _clock) = layer();

    let err = layer
      .fetch_one::<Payload, _, _>("k", || async { Err(down()) })
      .await
      .unwrap_err();

    assert!(matches!(err, NutritionError::UpstreamUnavailable { ref key, .. } if key == "k"));
  }

  #[tokio::test]
  async fn test_expired_entry_served_when_upstream_fails() {
    let (layer, clock) = layer();
    let t0 = clock.now();
    layer.fetch_one("k", || async { Ok(Payload(1)) }).await.unwrap();

    clock.advance(Duration::days(8));
    let result = layer
      .fetch_one::<Payload, _, _>("k", || async { Err(down()) })
      .await
      .unwrap();

    assert!(result.is_stale());
    assert_eq!(result.data, Payload(1));
    assert_eq!(result.fetched_at, t0);
  }

  #[tokio::test]
  async fn test_expired_entry_refreshed_when_upstream_succeeds() {
    let (layer, clock) = layer();
    layer.fetch_one("k", || async { Ok(Payload(1)) }).await.unwrap();

    clock.advance(Duration::days(8));
    let refreshed_at = clock.now();
    let result = layer.fetch_one("k", || async { Ok(Payload(2)) }).await.unwrap();

    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(result.data, Payload(2));

    let stored = layer.storage().get_entry::<Payload>("k").unwrap().unwrap();
    assert_eq!(stored.payload, Payload(2));
    assert_eq!(stored.fetched_at, refreshed_at);
    assert_eq!(stored.expires_at, refreshed_at + Duration::days(7));
    assert_eq!(stored.version.as_deref(), Some("1"));
  }

  #[tokio::test]
  async fn test_entry_expires_exactly_at_ttl() {
    let (layer, clock) = layer();
    layer.fetch_one("k", || async { Ok(Payload(1)) }).await.unwrap();

    clock.advance(Duration::days(7) - Duration::seconds(1));
    assert!(!layer.stale_status::<Payload>("k").unwrap().is_stale);

    clock.advance(Duration::seconds(1));
    assert!(layer.stale_status::<Payload>("k").unwrap().is_stale);
  }

  #[tokio::test]
  async fn test_stale_status_without_entry() {
    let (layer, _clock) = layer();
    let status = layer.stale_status::<Payload>("missing").unwrap();
    assert_eq!(status, StaleStatus::default());
  }

  #[tokio::test]
  async fn test_huge_ttl_is_capped() {
    let (layer, clock) = layer();
    let layer = layer.with_ttl(Duration::days(100_000_000));

    layer.fetch_one("k", || async { Ok(Payload(1)) }).await.unwrap();

    let stored = layer.storage().get_entry::<Payload>("k").unwrap().unwrap();
    assert_eq!(stored.expires_at, clock.now() + Duration::days(MAX_TTL_DAYS));

    clock.advance(Duration::days(365 * 50));
    let again = layer.fetch_one("k", || async { Ok(Payload(2)) }).await.unwrap();
    assert_eq!(again.source, CacheSource::CacheFresh);
    assert_eq!(again.data, Payload(1));
  }

  #[tokio::test]
  async fn test_expiry_saturates_at_end_of_calendar() {
    let clock = Arc::new(ManualClock::new(DateTime::<Utc>::MAX_UTC - Duration::days(1)));
    let layer = CacheLayer::new(MemoryStorage::new())
      .with_ttl(Duration::days(7))
      .with_clock(clock.clone());

    let result = layer.fetch_one("k", || async { Ok(Payload(1)) }).await.unwrap();
    assert_eq!(result.source, CacheSource::Network);

    let stored = layer.storage().get_entry::<Payload>("k").unwrap().unwrap();
    assert_eq!(stored.expires_at, DateTime::<Utc>::MAX_UTC);
  }
}
