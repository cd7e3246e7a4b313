//! Nutrition calculation: arithmetic on nutrient vectors, expansion of diary
//! entries, and aggregation into meal, day and range summaries.

use async_trait::async_trait;

use crate::cache::CacheResult;
use crate::error::NutritionResult;
use crate::livsmedel::NutrientPayload;

pub mod aggregator;
pub mod arithmetic;
pub mod expander;
pub mod types;

pub use aggregator::NutritionAggregator;
pub use arithmetic::{format_nutrient_value, round_nutrient_value, scale, sum};
pub use expander::EntryExpander;
pub use types::{
  DataFreshness, DayNutrition, EntryNutrition, MealNutrition, NutrientValue, NutrientVector,
  NutritionSummary, RangeNutrition,
};

/// Where the expander gets per-100 g nutrients from.
#[async_trait]
pub trait NutrientSource: Send + Sync {
  async fn nutrients(&self, food_id: &str) -> NutritionResult<CacheResult<NutrientPayload>>;
}
