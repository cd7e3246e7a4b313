//! In-memory fakes shared by unit tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::cache::{CacheLayer, MemoryStorage};
use crate::clock::ManualClock;
use crate::diary::{DiaryEntry, DiaryStore, EntryType, MealType, Recipe, RecipeItem};
use crate::error::NutritionResult;
use crate::livsmedel::{
  FoodItem, FoodLookupClient, FoodNutrient, NutrientLookupCache, NutrientPayload,
  NutrientProvider, RetryPolicy, SearchResult, UpstreamError,
};

/// Scripted upstream food database.
#[derive(Default)]
pub struct FakeProvider {
  foods: HashMap<String, (FoodItem, Vec<FoodNutrient>)>,
  failing: AtomicBool,
  nutrient_calls: AtomicUsize,
  last_search_limit: Mutex<Option<u32>>,
}

impl FakeProvider {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_food(mut self, id: &str, name: &str, nutrients: &[(&str, Option<f64>)]) -> Self {
    let item = FoodItem {
      number: id.to_string(),
      name: name.to_string(),
      latin: None,
      remarks: None,
    };
    let nutrients = nutrients
      .iter()
      .map(|(code, value)| FoodNutrient {
        name: code.to_string(),
        code: code.to_string(),
        value: *value,
        unit: if *code == "Ener" { "kcal" } else { "g" }.to_string(),
        source: None,
      })
      .collect();
    self.foods.insert(id.to_string(), (item, nutrients));
    self
  }

  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  /// Number of `fetch_nutrients` calls, including failed ones.
  pub fn nutrient_calls(&self) -> usize {
    self.nutrient_calls.load(Ordering::SeqCst)
  }

  pub fn last_search_limit(&self) -> Option<u32> {
    *self.last_search_limit.lock().unwrap()
  }

  fn check_up(&self) -> Result<(), UpstreamError> {
    if self.failing.load(Ordering::SeqCst) {
      Err(UpstreamError::Unavailable("fake provider is down".to_string()))
    } else {
      Ok(())
    }
  }

  fn food(&self, food_id: &str) -> Result<&(FoodItem, Vec<FoodNutrient>), UpstreamError> {
    self.foods.get(food_id).ok_or_else(|| UpstreamError::Status {
      status: 404,
      body: format!("no food {}", food_id),
    })
  }
}

#[async_trait]
impl NutrientProvider for FakeProvider {
  async fn fetch_food_info(&self, food_id: &str) -> Result<FoodItem, UpstreamError> {
    self.check_up()?;
    Ok(self.food(food_id)?.0.clone())
  }

  async fn fetch_nutrients(&self, food_id: &str) -> Result<NutrientPayload, UpstreamError> {
    self.nutrient_calls.fetch_add(1, Ordering::SeqCst);
    self.check_up()?;
    let (item, nutrients) = self.food(food_id)?;
    Ok(NutrientPayload {
      number: item.number.clone(),
      name: item.name.clone(),
      nutrients: nutrients.clone(),
    })
  }

  async fn search_foods(&self, query: &str, limit: u32) -> Result<SearchResult, UpstreamError> {
    *self.last_search_limit.lock().unwrap() = Some(limit);
    self.check_up()?;

    let query = query.to_lowercase();
    let mut items: Vec<FoodItem> = self
      .foods
      .values()
      .filter(|(item, _)| item.name.to_lowercase().contains(&query))
      .map(|(item, _)| item.clone())
      .collect();
    items.sort_by(|a, b| a.number.cmp(&b.number));
    let total = items.len() as u64;
    items.truncate(limit as usize);

    Ok(SearchResult { items, total })
  }
}

/// Cached lookups over a fake provider, no retry delay.
pub fn lookup_cache(
  provider: Arc<FakeProvider>,
  clock: Arc<ManualClock>,
) -> NutrientLookupCache<MemoryStorage> {
  let cache = CacheLayer::new(MemoryStorage::new()).with_clock(clock);
  NutrientLookupCache::new(FoodLookupClient::new(provider, RetryPolicy::immediate(0)), cache)
}

/// Diary store held in memory.
#[derive(Default)]
pub struct MemoryDiary {
  entries: Mutex<Vec<DiaryEntry>>,
  recipes: Mutex<HashMap<String, Recipe>>,
}

impl MemoryDiary {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_entry(&self, entry: DiaryEntry) {
    self.entries.lock().unwrap().push(entry);
  }

  pub fn add_recipe(&self, recipe: Recipe) {
    self.recipes.lock().unwrap().insert(recipe.id.clone(), recipe);
  }
}

#[async_trait]
impl DiaryStore for MemoryDiary {
  async fn list_entries(
    &self,
    client_id: &str,
    from: NaiveDate,
    to: NaiveDate,
  ) -> NutritionResult<Vec<DiaryEntry>> {
    let mut entries: Vec<DiaryEntry> = self
      .entries
      .lock()
      .unwrap()
      .iter()
      .filter(|e| e.client_id == client_id && e.date >= from && e.date <= to)
      .cloned()
      .collect();
    entries.sort_by_key(|e| (e.date, e.time.is_none(), e.time));
    Ok(entries)
  }

  async fn get_entry(&self, id: &str) -> NutritionResult<Option<DiaryEntry>> {
    Ok(self.entries.lock().unwrap().iter().find(|e| e.id == id).cloned())
  }

  async fn get_recipe(&self, id: &str) -> NutritionResult<Option<Recipe>> {
    Ok(self.recipes.lock().unwrap().get(id).cloned())
  }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn food_entry(id: &str, date: NaiveDate, meal_type: MealType, food_id: &str, grams: f64) -> DiaryEntry {
  DiaryEntry {
    id: id.to_string(),
    client_id: "client-1".to_string(),
    date,
    meal_type,
    entry_type: EntryType::Food,
    food_id: Some(food_id.to_string()),
    recipe_id: None,
    food_name_snapshot: format!("food {}", food_id),
    grams,
    time: None,
    comment: None,
  }
}

pub fn recipe_entry(
  id: &str,
  date: NaiveDate,
  meal_type: MealType,
  recipe_id: &str,
  portions: f64,
) -> DiaryEntry {
  DiaryEntry {
    entry_type: EntryType::Recipe,
    food_id: None,
    recipe_id: Some(recipe_id.to_string()),
    food_name_snapshot: format!("recipe {}", recipe_id),
    grams: portions,
    ..food_entry(id, date, meal_type, "", portions)
  }
}

pub fn recipe(id: &str, servings: u32, items: &[(&str, f64)]) -> Recipe {
  Recipe {
    id: id.to_string(),
    name: format!("recipe {}", id),
    servings,
    items: items
      .iter()
      .map(|(food_id, grams)| RecipeItem {
        food_id: food_id.to_string(),
        grams: *grams,
        name_snapshot: String::new(),
      })
      .collect(),
  }
}
