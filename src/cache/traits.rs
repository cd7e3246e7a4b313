//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// Trait for payloads that can be cached.
///
/// Payloads are stored as JSON, grouped by entity type so that different
/// payload kinds for the same key (e.g. food info and nutrients for one food
/// number) never collide.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned {
  /// Entity type name for storage organization (e.g., "food", "nutrients")
  fn entity_type() -> &'static str;
}

/// A stored cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
  pub key: String,
  pub payload: T,
  pub fetched_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
  /// Upstream API version the payload was fetched with
  pub version: Option<String>,
}

impl<T> CacheEntry<T> {
  /// An entry is expired from its `expires_at` instant onwards.
  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    now >= self.expires_at
  }
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was fetched from upstream
  pub fetched_at: DateTime<Utc>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T, fetched_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      fetched_at,
    }
  }

  /// Create a new cache result from an unexpired cache entry.
  pub fn from_cache(data: T, fetched_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::CacheFresh,
      fetched_at,
    }
  }

  /// Create a new cache result for offline mode.
  pub fn offline(data: T, fetched_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
      fetched_at,
    }
  }

  /// True when an expired entry was served because the refresh failed.
  pub fn is_stale(&self) -> bool {
    self.source == CacheSource::Offline
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, still within its TTL
  CacheFresh,
  /// Upstream unavailable, serving an expired cache entry
  Offline,
}

/// Staleness report for a cached key. Never triggers a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaleStatus {
  pub is_stale: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub fetched_at: Option<DateTime<Utc>>,
}
