//! Serde-deserializable types matching Livsmedelsverket API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! of the Swedish field names while keeping domain types focused on
//! application needs.

use serde::Deserialize;

use super::types::{FoodItem, FoodNutrient, NutrientPayload, SearchResult};

// ============================================================================
// Food endpoint: livsmedel/{nummer}
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiFoodItem {
  pub nummer: String,
  pub namn: String,
  pub latin: Option<String>,
  #[serde(rename = "anmaerkningar")]
  pub remarks: Option<String>,
}

impl From<ApiFoodItem> for FoodItem {
  fn from(item: ApiFoodItem) -> Self {
    Self {
      number: item.nummer,
      name: item.namn,
      latin: item.latin,
      remarks: item.remarks,
    }
  }
}

// ============================================================================
// Nutrient endpoint: livsmedel/{nummer}/naeringsvaerden
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiNutrient {
  #[serde(rename = "naeringsaemne")]
  pub name: String,
  #[serde(rename = "kod")]
  pub code: String,
  #[serde(rename = "vaerde")]
  pub value: Option<f64>,
  #[serde(rename = "enhet", default)]
  pub unit: String,
  #[serde(rename = "kaella")]
  pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiNutrientResponse {
  pub nummer: String,
  #[serde(default)]
  pub namn: String,
  #[serde(rename = "naeringsvaerden", default)]
  pub nutrients: Vec<ApiNutrient>,
}

impl From<ApiNutrientResponse> for NutrientPayload {
  fn from(response: ApiNutrientResponse) -> Self {
    Self {
      number: response.nummer,
      name: response.namn,
      nutrients: response
        .nutrients
        .into_iter()
        .map(|n| FoodNutrient {
          name: n.name,
          code: n.code,
          value: n.value,
          unit: n.unit,
          source: n.source,
        })
        .collect(),
    }
  }
}

// ============================================================================
// Search endpoint: sok?q=...&limit=...
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiSearchResponse {
  #[serde(default)]
  pub items: Vec<ApiFoodItem>,
  #[serde(default)]
  pub total: u64,
}

impl From<ApiSearchResponse> for SearchResult {
  fn from(response: ApiSearchResponse) -> Self {
    Self {
      items: response.items.into_iter().map(FoodItem::from).collect(),
      total: response.total,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_nutrient_response_with_unmeasured_value() {
    let json = r#"{
      "nummer": "1001",
      "namn": "Mjölk, standardmjölk, 3% fett",
      "naeringsvaerden": [
        {"naeringsaemne": "Energi (kcal)", "kod": "Ener", "vaerde": 64, "enhet": "kcal"},
        {"naeringsaemne": "Protein", "kod": "Prot", "vaerde": 3.4, "enhet": "g", "kaella": "Analys"},
        {"naeringsaemne": "Vitamin D", "kod": "VitD", "vaerde": null, "enhet": "µg"}
      ]
    }"#;

    let response: ApiNutrientResponse = serde_json::from_str(json).unwrap();
    let payload = NutrientPayload::from(response);

    assert_eq!(payload.number, "1001");
    assert_eq!(payload.nutrients.len(), 3);
    assert_eq!(payload.nutrients[0].value, Some(64.0));
    assert_eq!(payload.nutrients[1].source.as_deref(), Some("Analys"));
    assert_eq!(payload.nutrients[2].value, None);
  }

  #[test]
  fn test_search_response_defaults() {
    let response: ApiSearchResponse = serde_json::from_str("{}").unwrap();
    let result = SearchResult::from(response);
    assert!(result.items.is_empty());
    assert_eq!(result.total, 0);
  }
}
