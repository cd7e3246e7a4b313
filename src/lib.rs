//! Nutrition intake calculation for food diaries, backed by the
//! Livsmedelsverket food database.

pub mod cache;
pub mod clock;
pub mod config;
pub mod db;
pub mod diary;
pub mod error;
pub mod livsmedel;
pub mod logging;
pub mod nutrition;
pub mod report;

#[cfg(test)]
mod test_support;

pub use error::{NutritionError, NutritionResult};
