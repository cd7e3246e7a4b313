use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dietlog::cache::{CacheLayer, CacheStorage, MemoryStorage, SqliteStorage};
use dietlog::config::Config;
use dietlog::diary::{DiaryEntry, Recipe, SqliteDiaryStore};
use dietlog::livsmedel::{FoodLookupClient, LivsmedelClient, NutrientLookupCache};
use dietlog::nutrition::NutritionAggregator;
use dietlog::report;

#[derive(Parser, Debug)]
#[command(name = "dietlog")]
#[command(about = "Nutrition totals for food diaries, using the Livsmedelsverket food database")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/dietlog/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Print results as JSON
  #[arg(long)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Nutrition for one day, per meal
  Day {
    #[arg(long)]
    client: String,
    #[arg(long)]
    date: NaiveDate,
  },
  /// Nutrition for every day in an inclusive date range
  Range {
    #[arg(long)]
    client: String,
    #[arg(long)]
    from: NaiveDate,
    #[arg(long)]
    to: NaiveDate,
  },
  /// Nutrition for a single diary entry
  Entry { id: String },
  /// Nutrients per 100 g for a food
  Food { id: String },
  /// Basic information about a food
  Info { id: String },
  /// Search the food database by name
  Search {
    query: String,
    #[arg(short, long)]
    limit: Option<u32>,
  },
  /// Load recipes and diary entries from a YAML file
  Import { file: PathBuf },
}

/// Layout of an import file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DiaryFile {
  recipes: Vec<Recipe>,
  entries: Vec<DiaryEntry>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  let _log_guard = dietlog::logging::init(&config.log)?;

  let diary = Arc::new(SqliteDiaryStore::open(&config.diary.resolved_path()?)?);

  if config.cache.persistent {
    let storage = SqliteStorage::open(&config.cache.resolved_path()?)?;
    run(args, &config, storage, diary).await
  } else {
    run(args, &config, MemoryStorage::new(), diary).await
  }
}

async fn run<S: CacheStorage + 'static>(
  args: Args,
  config: &Config,
  storage: S,
  diary: Arc<SqliteDiaryStore>,
) -> Result<()> {
  let client = LivsmedelClient::new(&config.livsmedelsverket)?;
  let lookup = FoodLookupClient::new(Arc::new(client), config.livsmedelsverket.retry_policy());
  let cache = CacheLayer::new(storage)
    .with_ttl(config.cache.ttl())
    .with_version(config.cache.api_version.clone());
  let foods = Arc::new(NutrientLookupCache::new(lookup, cache));
  let aggregator = NutritionAggregator::new(diary.clone(), foods.clone());

  let json = args.json;
  match args.command {
    Command::Day { client, date } => {
      let day = aggregator.calculate_day(&client, date).await?;
      emit(json, &day, report::DayReport(&day))
    }
    Command::Range { client, from, to } => {
      let range = aggregator.calculate_range(&client, from, to).await?;
      emit(json, &range, report::RangeReport(&range))
    }
    Command::Entry { id } => {
      let entry = aggregator.calculate_entry(&id).await?;
      emit(json, &entry, report::EntryReport(&entry))
    }
    Command::Food { id } => {
      let result = foods.nutrients(&id).await?;
      let status = foods.is_stale(&id)?;
      let body = serde_json::json!({
        "food": &result.data,
        "source": result.source,
        "_cache": &status,
      });
      emit(
        json,
        &body,
        report::FoodReport {
          payload: &result.data,
          status: &status,
        },
      )
    }
    Command::Info { id } => {
      let result = foods.food_info(&id).await?;
      emit(json, &result.data, report::FoodInfoReport(&result.data))
    }
    Command::Search { query, limit } => {
      let result = foods.search(&query, limit).await?;
      emit(json, &result, report::SearchReport(&result))
    }
    Command::Import { file } => import(&diary, &file),
  }
}

fn import(diary: &SqliteDiaryStore, path: &Path) -> Result<()> {
  let contents = std::fs::read_to_string(path)
    .map_err(|e| eyre!("Failed to read diary file {}: {}", path.display(), e))?;
  let file: DiaryFile = serde_yaml::from_str(&contents)
    .map_err(|e| eyre!("Failed to parse diary file {}: {}", path.display(), e))?;

  for recipe in &file.recipes {
    diary.insert_recipe(recipe)?;
  }
  for entry in &file.entries {
    diary.insert_entry(entry)?;
  }

  tracing::info!(
    recipes = file.recipes.len(),
    entries = file.entries.len(),
    "diary file imported"
  );
  println!(
    "Imported {} recipes and {} entries",
    file.recipes.len(),
    file.entries.len()
  );
  Ok(())
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl Display) -> Result<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(value)?);
  } else {
    print!("{}", text);
  }
  Ok(())
}
