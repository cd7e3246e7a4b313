//! Livsmedelsverket food database: HTTP client, retry policy and the
//! read-through nutrient cache built on top of them.

pub mod api_types;
mod cache;
pub mod cached_client;
pub mod client;
pub mod lookup;
pub mod provider;
pub mod retry;
pub mod types;

pub use cached_client::NutrientLookupCache;
pub use client::LivsmedelClient;
pub use lookup::FoodLookupClient;
pub use provider::{NutrientProvider, UpstreamError};
pub use retry::RetryPolicy;
pub use types::{FoodItem, FoodNutrient, NutrientPayload, SearchResult};
