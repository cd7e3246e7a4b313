//! Plain-text rendering of calculation results for the terminal.

use std::fmt;

use crate::cache::StaleStatus;
use crate::livsmedel::{FoodItem, NutrientPayload, SearchResult};
use crate::nutrition::{
  format_nutrient_value, DataFreshness, DayNutrition, EntryNutrition, NutrientVector,
  NutritionSummary, RangeNutrition,
};

const NAME_WIDTH: usize = 32;

fn nutrients(f: &mut fmt::Formatter<'_>, vector: &NutrientVector, indent: &str) -> fmt::Result {
  if vector.is_empty() {
    return writeln!(f, "{}(no nutrients)", indent);
  }
  for n in vector.iter() {
    writeln!(
      f,
      "{}{:<width$} {}",
      indent,
      n.name,
      format_nutrient_value(n.value, &n.unit),
      width = NAME_WIDTH
    )?;
  }
  Ok(())
}

fn freshness(f: &mut fmt::Formatter<'_>, freshness: &DataFreshness, indent: &str) -> fmt::Result {
  if freshness.is_stale {
    match freshness.oldest_data_at {
      Some(at) => writeln!(f, "{}! stale food data, oldest from {}", indent, at.format("%Y-%m-%d %H:%M")),
      None => writeln!(f, "{}! stale food data", indent),
    }
  } else {
    Ok(())
  }
}

fn summary(f: &mut fmt::Formatter<'_>, summary: &NutritionSummary, indent: &str) -> fmt::Result {
  writeln!(f, "{}Total: {} g", indent, summary.total_grams)?;
  freshness(f, &summary.freshness, indent)?;
  nutrients(f, &summary.nutrients, indent)
}

pub struct DayReport<'a>(pub &'a DayNutrition);

impl fmt::Display for DayReport<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let day = self.0;
    writeln!(f, "== {} ==", day.date)?;
    for meal in &day.meals {
      writeln!(f)?;
      writeln!(f, "{} ({} entries)", meal.meal_type, meal.entries.len())?;
      for entry in &meal.entries {
        writeln!(f, "  - {} ({} g) [{}]", entry.food_name, entry.grams, entry.entry_id)?;
      }
      if !meal.entries.is_empty() {
        summary(f, &meal.summary, "    ")?;
      }
    }
    writeln!(f)?;
    writeln!(f, "Day total")?;
    summary(f, &day.day_summary, "  ")
  }
}

pub struct RangeReport<'a>(pub &'a RangeNutrition);

impl fmt::Display for RangeReport<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let range = self.0;
    writeln!(f, "== {} .. {} ({} days) ==", range.from, range.to, range.days.len())?;
    for day in &range.days {
      let energy = day
        .day_summary
        .nutrients
        .get("Ener")
        .map(|n| format_nutrient_value(n.value, &n.unit))
        .unwrap_or_else(|| "N/A".to_string());
      writeln!(f, "  {}  {:>10} g  {}", day.date, day.day_summary.total_grams, energy)?;
    }
    writeln!(f)?;
    writeln!(f, "Range total")?;
    summary(f, &range.range_summary, "  ")
  }
}

pub struct EntryReport<'a>(pub &'a EntryNutrition);

impl fmt::Display for EntryReport<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let entry = self.0;
    writeln!(f, "{} ({} g) [{}]", entry.food_name, entry.grams, entry.entry_id)?;
    freshness(f, &entry.freshness, "  ")?;
    nutrients(f, &entry.nutrients, "  ")
  }
}

pub struct FoodReport<'a> {
  pub payload: &'a NutrientPayload,
  pub status: &'a StaleStatus,
}

impl fmt::Display for FoodReport<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{} [{}], per 100 g", self.payload.name, self.payload.number)?;
    match (self.status.fetched_at, self.status.is_stale) {
      (Some(at), true) => writeln!(f, "  ! cached data expired, fetched {}", at.format("%Y-%m-%d %H:%M"))?,
      (Some(at), false) => writeln!(f, "  fetched {}", at.format("%Y-%m-%d %H:%M"))?,
      (None, _) => {}
    }
    nutrients(f, &self.payload.per_100g(), "  ")
  }
}

pub struct FoodInfoReport<'a>(pub &'a FoodItem);

impl fmt::Display for FoodInfoReport<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let item = self.0;
    writeln!(f, "{} [{}]", item.name, item.number)?;
    if let Some(latin) = &item.latin {
      writeln!(f, "  {}", latin)?;
    }
    if let Some(remarks) = &item.remarks {
      writeln!(f, "  {}", remarks)?;
    }
    Ok(())
  }
}

pub struct SearchReport<'a>(pub &'a SearchResult);

impl fmt::Display for SearchReport<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let result = self.0;
    writeln!(f, "{} of {} matches", result.items.len(), result.total)?;
    for item in &result.items {
      writeln!(f, "  {:>6}  {}", item.number, item.name)?;
    }
    Ok(())
  }
}
