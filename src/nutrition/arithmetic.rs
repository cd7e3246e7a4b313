//! Nutrient scaling and summation.
//!
//! Unknown (`None`) values never turn into zero and zero never turns into
//! unknown:
//! - scaling keeps unknown values unknown
//! - summing a code where every contribution is unknown gives unknown
//! - summing a code with at least one known contribution adds the known ones
//! - a code missing from a vector contributes nothing for that vector

use super::types::{NutrientValue, NutrientVector};

/// Nutrients for `grams` of a food, from its per-100 g values.
pub fn scale(grams: f64, per_100g: &NutrientVector) -> NutrientVector {
  per_100g.scaled(grams / 100.0)
}

/// Merge vectors by code, summing known values.
pub fn sum<'a, I>(vectors: I) -> NutrientVector
where
  I: IntoIterator<Item = &'a NutrientVector>,
{
  let mut total = NutrientVector::new();

  for vector in vectors {
    for nutrient in vector.iter() {
      let merged = match total.get(&nutrient.code) {
        None => nutrient.clone(),
        Some(existing) => NutrientValue {
          value: match (existing.value, nutrient.value) {
            (Some(a), Some(b)) => Some(a + b),
            (a, b) => a.or(b),
          },
          ..existing.clone()
        },
      };
      total.insert(merged);
    }
  }

  total
}

/// Round to `decimals` places; unknown stays unknown.
pub fn round_nutrient_value(value: Option<f64>, decimals: u32) -> Option<f64> {
  let factor = 10f64.powi(decimals as i32);
  value.map(|v| (v * factor).round() / factor)
}

/// One decimal plus unit, or `N/A` when unknown.
pub fn format_nutrient_value(value: Option<f64>, unit: &str) -> String {
  match round_nutrient_value(value, 1) {
    Some(v) => format!("{} {}", v, unit),
    None => "N/A".to_string(),
  }
}
