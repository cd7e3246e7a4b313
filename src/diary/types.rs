use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{NutritionError, NutritionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MealType {
  Breakfast,
  Lunch,
  Dinner,
  Snack,
}

impl MealType {
  /// Every meal type, in the order meals are reported.
  pub const ALL: [MealType; 4] = [
    MealType::Breakfast,
    MealType::Lunch,
    MealType::Dinner,
    MealType::Snack,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      MealType::Breakfast => "BREAKFAST",
      MealType::Lunch => "LUNCH",
      MealType::Dinner => "DINNER",
      MealType::Snack => "SNACK",
    }
  }
}

impl fmt::Display for MealType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for MealType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    MealType::ALL
      .into_iter()
      .find(|m| m.as_str().eq_ignore_ascii_case(s))
      .ok_or_else(|| format!("unknown meal type: {}", s))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
  Food,
  Recipe,
}

impl EntryType {
  pub fn as_str(&self) -> &'static str {
    match self {
      EntryType::Food => "FOOD",
      EntryType::Recipe => "RECIPE",
    }
  }
}

impl FromStr for EntryType {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_uppercase().as_str() {
      "FOOD" => Ok(EntryType::Food),
      "RECIPE" => Ok(EntryType::Recipe),
      _ => Err(format!("unknown entry type: {}", s)),
    }
  }
}

/// A logged diary row as the diary store keeps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
  pub id: String,
  pub client_id: String,
  pub date: NaiveDate,
  pub meal_type: MealType,
  pub entry_type: EntryType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub food_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub recipe_id: Option<String>,
  /// Display name captured when the entry was logged
  #[serde(default)]
  pub food_name_snapshot: String,
  /// Mass in grams for FOOD entries, number of portions for RECIPE entries
  pub grams: f64,
  #[serde(default, with = "clock_time", skip_serializing_if = "Option::is_none")]
  pub time: Option<NaiveTime>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub comment: Option<String>,
}

/// What a diary entry refers to, with the amount spelled out per kind.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryTarget<'a> {
  Food { food_id: &'a str, grams: f64 },
  /// `portions` is the entry's `grams` field
  Recipe { recipe_id: &'a str, portions: f64 },
}

impl DiaryEntry {
  /// Validate the field combination for the entry's type.
  pub fn target(&self) -> NutritionResult<EntryTarget<'_>> {
    if !(self.grams.is_finite() && self.grams > 0.0) {
      return Err(NutritionError::invalid_entry(
        &self.id,
        format!("amount must be positive, got {}", self.grams),
      ));
    }

    match (self.entry_type, self.food_id.as_deref(), self.recipe_id.as_deref()) {
      (EntryType::Food, Some(food_id), None) => Ok(EntryTarget::Food {
        food_id,
        grams: self.grams,
      }),
      (EntryType::Recipe, None, Some(recipe_id)) => Ok(EntryTarget::Recipe {
        recipe_id,
        portions: self.grams,
      }),
      (entry_type, food_id, recipe_id) => Err(NutritionError::invalid_entry(
        &self.id,
        format!(
          "{} entry with foodId={:?} recipeId={:?}",
          entry_type.as_str(),
          food_id,
          recipe_id
        ),
      )),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeItem {
  pub food_id: String,
  pub grams: f64,
  #[serde(default)]
  pub name_snapshot: String,
}

/// A recipe as currently stored. Items are raw foods only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
  pub id: String,
  #[serde(default)]
  pub name: String,
  pub servings: u32,
  pub items: Vec<RecipeItem>,
}

/// `HH:MM` wall-clock times, seconds accepted on input.
pub(crate) mod clock_time {
  use chrono::NaiveTime;
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn parse(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
      .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
      .ok()
  }

  pub fn format(time: &NaiveTime) -> String {
    time.format("%H:%M").to_string()
  }

  pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error> {
    match time {
      Some(t) => serializer.serialize_str(&format(t)),
      None => serializer.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveTime>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
      Some(s) => parse(&s)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid time '{}', expected HH:MM", s))),
      None => Ok(None),
    }
  }
}
