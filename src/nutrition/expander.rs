//! Turns a diary entry into its nutrient contribution.

use futures::future::try_join_all;
use std::sync::Arc;

use crate::diary::{DiaryEntry, DiaryStore, EntryTarget};
use crate::error::{NutritionError, NutritionResult};

use super::arithmetic::{scale, sum};
use super::types::{DataFreshness, EntryNutrition, NutrientVector};
use super::NutrientSource;

/// Expands FOOD and RECIPE entries into nutrient vectors.
///
/// Recipes are read from the diary store at calculation time, so editing a
/// recipe changes the nutrition of every entry that refers to it.
#[derive(Clone)]
pub struct EntryExpander {
  source: Arc<dyn NutrientSource>,
  diary: Arc<dyn DiaryStore>,
}

impl EntryExpander {
  pub fn new(source: Arc<dyn NutrientSource>, diary: Arc<dyn DiaryStore>) -> Self {
    Self { source, diary }
  }

  pub async fn expand(&self, entry: &DiaryEntry) -> NutritionResult<EntryNutrition> {
    let (nutrients, freshness) = match entry.target()? {
      EntryTarget::Food { food_id, grams } => self.food(food_id, grams).await?,
      EntryTarget::Recipe {
        recipe_id,
        portions,
      } => self.recipe(&entry.id, recipe_id, portions).await?,
    };

    Ok(EntryNutrition {
      entry_id: entry.id.clone(),
      food_name: entry.food_name_snapshot.clone(),
      grams: entry.grams,
      nutrients,
      freshness,
    })
  }

  async fn food(&self, food_id: &str, grams: f64) -> NutritionResult<(NutrientVector, DataFreshness)> {
    let lookup = self.source.nutrients(food_id).await?;
    let freshness = DataFreshness::observed(lookup.is_stale(), lookup.fetched_at);
    Ok((scale(grams, &lookup.data.per_100g()), freshness))
  }

  async fn recipe(
    &self,
    entry_id: &str,
    recipe_id: &str,
    portions: f64,
  ) -> NutritionResult<(NutrientVector, DataFreshness)> {
    let recipe = self
      .diary
      .get_recipe(recipe_id)
      .await?
      .ok_or_else(|| NutritionError::RecipeNotFound(recipe_id.to_string()))?;

    if recipe.servings == 0 {
      return Err(NutritionError::invalid_entry(
        entry_id,
        format!("recipe {} has zero servings", recipe_id),
      ));
    }

    if let Some(item) = recipe
      .items
      .iter()
      .find(|item| !(item.grams.is_finite() && item.grams > 0.0))
    {
      return Err(NutritionError::invalid_entry(
        entry_id,
        format!(
          "recipe {} item {} has amount {}, must be positive",
          recipe_id, item.food_id, item.grams
        ),
      ));
    }

    let items = try_join_all(
      recipe
        .items
        .iter()
        .map(|item| self.food(&item.food_id, item.grams)),
    )
    .await?;

    let whole = sum(items.iter().map(|(nutrients, _)| nutrients));
    let freshness: DataFreshness = items.iter().map(|(_, freshness)| freshness).collect();

    Ok((whole.scaled(portions / recipe.servings as f64), freshness))
  }
}
