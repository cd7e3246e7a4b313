//! Generic caching layer for upstream payloads.
//!
//! This module provides a source-agnostic read-through cache that:
//! - Stores one JSON payload per (entity type, key) with fetch and expiry times
//! - Serves unexpired entries without touching upstream
//! - Refreshes expired or missing entries and overwrites them in place
//! - Serves the expired entry when upstream is unavailable (offline mode)

mod layer;
mod storage;
mod traits;

pub use layer::{CacheLayer, MAX_TTL_DAYS};
pub use storage::{CacheStorage, MemoryStorage, SqliteStorage};
pub use traits::{CacheEntry, CacheResult, CacheSource, Cacheable, StaleStatus};
