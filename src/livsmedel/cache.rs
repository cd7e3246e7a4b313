//! Caching implementations for Livsmedelsverket types.

use crate::cache::Cacheable;

use super::types::{FoodItem, NutrientPayload};

impl Cacheable for FoodItem {
  fn entity_type() -> &'static str {
    "food"
  }
}

impl Cacheable for NutrientPayload {
  fn entity_type() -> &'static str {
    "nutrients"
  }
}
