//! Diary entries and recipes, as read by the nutrition core.

mod store;
mod types;

pub use store::{DiaryStore, SqliteDiaryStore};
pub use types::{DiaryEntry, EntryTarget, EntryType, MealType, Recipe, RecipeItem};
