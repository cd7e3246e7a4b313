use serde::{Deserialize, Serialize};

use crate::nutrition::{NutrientValue, NutrientVector};

/// Basic food information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
  pub number: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub latin: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub remarks: Option<String>,
}

/// One nutrient per 100 g of a food
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodNutrient {
  pub name: String,
  pub code: String,
  /// None when the value has not been measured
  pub value: Option<f64>,
  pub unit: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source: Option<String>,
}

/// Nutrient content of a food, per 100 g
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientPayload {
  pub number: String,
  pub name: String,
  pub nutrients: Vec<FoodNutrient>,
}

impl NutrientPayload {
  /// Nutrients per 100 g as a vector keyed by code.
  ///
  /// If upstream lists a code twice, the first occurrence wins.
  pub fn per_100g(&self) -> NutrientVector {
    let mut vector = NutrientVector::new();
    for nutrient in &self.nutrients {
      if vector.contains(&nutrient.code) {
        tracing::warn!(food = %self.number, code = %nutrient.code, "duplicate nutrient code ignored");
        continue;
      }
      vector.insert(NutrientValue {
        code: nutrient.code.clone(),
        name: nutrient.name.clone(),
        value: nutrient.value,
        unit: nutrient.unit.clone(),
      });
    }
    vector
  }
}

/// Food search hits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
  pub items: Vec<FoodItem>,
  pub total: u64,
}
