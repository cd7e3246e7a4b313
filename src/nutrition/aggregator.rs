//! Meal, day and range totals over diary entries.

use chrono::NaiveDate;
use futures::future::try_join_all;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::diary::{DiaryEntry, DiaryStore, MealType};
use crate::error::{NutritionError, NutritionResult};

use super::arithmetic::sum;
use super::expander::EntryExpander;
use super::types::{
  DataFreshness, DayNutrition, EntryNutrition, MealNutrition, NutritionSummary, RangeNutrition,
};
use super::NutrientSource;

/// Computes nutrition for a client's diary on demand.
///
/// Every call is all-or-nothing: if any entry fails to expand, the whole
/// day or range fails with that entry's error.
#[derive(Clone)]
pub struct NutritionAggregator {
  diary: Arc<dyn DiaryStore>,
  expander: EntryExpander,
  clock: Arc<dyn Clock>,
}

impl NutritionAggregator {
  pub fn new(diary: Arc<dyn DiaryStore>, source: Arc<dyn NutrientSource>) -> Self {
    Self {
      expander: EntryExpander::new(source, diary.clone()),
      diary,
      clock: Arc::new(SystemClock),
    }
  }

  /// Use a custom clock for `calculated_at` stamps.
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  /// Nutrition for a single diary entry.
  #[tracing::instrument(skip(self))]
  pub async fn calculate_entry(&self, entry_id: &str) -> NutritionResult<EntryNutrition> {
    let entry = self
      .diary
      .get_entry(entry_id)
      .await?
      .ok_or_else(|| NutritionError::EntryNotFound(entry_id.to_string()))?;
    self.expander.expand(&entry).await
  }

  /// Nutrition for one day, broken down by meal.
  #[tracing::instrument(skip(self))]
  pub async fn calculate_day(&self, client_id: &str, date: NaiveDate) -> NutritionResult<DayNutrition> {
    let entries = self.diary.list_entries(client_id, date, date).await?;
    tracing::debug!(entries = entries.len(), "diary entries loaded");

    let meals = try_join_all(MealType::ALL.into_iter().map(|meal_type| {
      let in_meal: Vec<&DiaryEntry> = entries.iter().filter(|e| e.meal_type == meal_type).collect();
      self.calculate_meal(meal_type, in_meal)
    }))
    .await?;

    let day_summary = self.summarize(meals.iter().map(|m| &m.summary));
    Ok(DayNutrition {
      date,
      meals,
      day_summary,
    })
  }

  /// Nutrition for every date in `from..=to`, oldest first.
  ///
  /// An inverted range yields no days and an empty summary.
  #[tracing::instrument(skip(self))]
  pub async fn calculate_range(
    &self,
    client_id: &str,
    from: NaiveDate,
    to: NaiveDate,
  ) -> NutritionResult<RangeNutrition> {
    let mut days = Vec::new();
    for date in from.iter_days().take_while(|d| *d <= to) {
      days.push(self.calculate_day(client_id, date).await?);
    }

    let range_summary = self.summarize(days.iter().map(|d| &d.day_summary));
    Ok(RangeNutrition {
      from,
      to,
      days,
      range_summary,
    })
  }

  async fn calculate_meal(
    &self,
    meal_type: MealType,
    entries: Vec<&DiaryEntry>,
  ) -> NutritionResult<MealNutrition> {
    let entries = try_join_all(entries.into_iter().map(|e| self.expander.expand(e))).await?;

    let summary = NutritionSummary {
      nutrients: sum(entries.iter().map(|e| &e.nutrients)),
      total_grams: entries.iter().map(|e| e.grams).sum(),
      calculated_at: self.clock.now(),
      freshness: entries.iter().map(|e| &e.freshness).collect(),
    };

    Ok(MealNutrition {
      meal_type,
      entries,
      summary,
    })
  }

  fn summarize<'a>(&self, parts: impl Iterator<Item = &'a NutritionSummary> + Clone) -> NutritionSummary {
    NutritionSummary {
      nutrients: sum(parts.clone().map(|s| &s.nutrients)),
      total_grams: parts.clone().map(|s| s.total_grams).sum(),
      calculated_at: self.clock.now(),
      freshness: parts.map(|s| &s.freshness).collect::<DataFreshness>(),
    }
  }
}
