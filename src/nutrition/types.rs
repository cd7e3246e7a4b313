//! Nutrition result types. Computed on demand, never persisted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::diary::MealType;

/// A nutrient amount. `value: None` means unknown, which is not the same as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientValue {
  pub code: String,
  pub name: String,
  pub value: Option<f64>,
  pub unit: String,
}

/// Nutrient values keyed by code. Serialized as a list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<NutrientValue>", into = "Vec<NutrientValue>")]
pub struct NutrientVector {
  by_code: BTreeMap<String, NutrientValue>,
}

impl NutrientVector {
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert or replace the value for its code.
  pub fn insert(&mut self, value: NutrientValue) {
    self.by_code.insert(value.code.clone(), value);
  }

  pub fn get(&self, code: &str) -> Option<&NutrientValue> {
    self.by_code.get(code)
  }

  pub fn contains(&self, code: &str) -> bool {
    self.by_code.contains_key(code)
  }

  pub fn len(&self) -> usize {
    self.by_code.len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_code.is_empty()
  }

  /// Values in code order.
  pub fn iter(&self) -> impl Iterator<Item = &NutrientValue> {
    self.by_code.values()
  }

  /// Multiply every known value; unknown values stay unknown.
  pub fn scaled(&self, multiplier: f64) -> Self {
    let by_code = self
      .by_code
      .iter()
      .map(|(code, n)| {
        let value = NutrientValue {
          value: n.value.map(|v| v * multiplier),
          ..n.clone()
        };
        (code.clone(), value)
      })
      .collect();
    Self { by_code }
  }
}

/// A code listed twice keeps its first occurrence.
impl From<Vec<NutrientValue>> for NutrientVector {
  fn from(values: Vec<NutrientValue>) -> Self {
    let mut by_code = BTreeMap::new();
    for value in values {
      by_code.entry(value.code.clone()).or_insert(value);
    }
    Self { by_code }
  }
}

impl From<NutrientVector> for Vec<NutrientValue> {
  fn from(vector: NutrientVector) -> Self {
    vector.by_code.into_values().collect()
  }
}

impl FromIterator<NutrientValue> for NutrientVector {
  fn from_iter<I: IntoIterator<Item = NutrientValue>>(iter: I) -> Self {
    Self::from(iter.into_iter().collect::<Vec<_>>())
  }
}

/// Age of the upstream data behind a result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFreshness {
  /// Some lookup was served from an expired cache entry
  pub is_stale: bool,
  /// Oldest upstream fetch among contributing lookups
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub oldest_data_at: Option<DateTime<Utc>>,
}

impl DataFreshness {
  pub fn observed(is_stale: bool, fetched_at: DateTime<Utc>) -> Self {
    Self {
      is_stale,
      oldest_data_at: Some(fetched_at),
    }
  }

  pub fn merge(self, other: Self) -> Self {
    let oldest_data_at = match (self.oldest_data_at, other.oldest_data_at) {
      (Some(a), Some(b)) => Some(a.min(b)),
      (a, b) => a.or(b),
    };
    Self {
      is_stale: self.is_stale || other.is_stale,
      oldest_data_at,
    }
  }
}

impl<'a> FromIterator<&'a DataFreshness> for DataFreshness {
  fn from_iter<I: IntoIterator<Item = &'a DataFreshness>>(iter: I) -> Self {
    iter
      .into_iter()
      .fold(DataFreshness::default(), |acc, f| acc.merge(*f))
  }
}

/// Expanded contribution of one diary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryNutrition {
  pub entry_id: String,
  pub food_name: String,
  pub grams: f64,
  pub nutrients: NutrientVector,
  #[serde(flatten)]
  pub freshness: DataFreshness,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionSummary {
  pub nutrients: NutrientVector,
  pub total_grams: f64,
  pub calculated_at: DateTime<Utc>,
  #[serde(flatten)]
  pub freshness: DataFreshness,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealNutrition {
  pub meal_type: MealType,
  pub entries: Vec<EntryNutrition>,
  pub summary: NutritionSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayNutrition {
  pub date: NaiveDate,
  /// One per meal type, in meal order, empty meals included
  pub meals: Vec<MealNutrition>,
  pub day_summary: NutritionSummary,
}

impl DayNutrition {
  pub fn meal(&self, meal_type: MealType) -> Option<&MealNutrition> {
    self.meals.iter().find(|m| m.meal_type == meal_type)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeNutrition {
  pub from: NaiveDate,
  pub to: NaiveDate,
  pub days: Vec<DayNutrition>,
  pub range_summary: NutritionSummary,
}
