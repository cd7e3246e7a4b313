use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::config::LivsmedelConfig;
use crate::livsmedel::api_types::{ApiFoodItem, ApiNutrientResponse, ApiSearchResponse};
use crate::livsmedel::provider::{NutrientProvider, UpstreamError};
use crate::livsmedel::types::{FoodItem, NutrientPayload, SearchResult};

/// Livsmedelsverket food database HTTP client.
///
/// Issues exactly one request per call; retrying is the caller's business.
#[derive(Clone)]
pub struct LivsmedelClient {
  http: reqwest::Client,
  base_url: Url,
}

impl LivsmedelClient {
  pub fn new(config: &LivsmedelConfig) -> Result<Self> {
    let base_url = Url::parse(config.url.trim_end_matches('/'))
      .map_err(|e| eyre!("Invalid food database URL {}: {}", config.url, e))?;
    if base_url.cannot_be_a_base() {
      return Err(eyre!("Invalid food database URL {}: not a base URL", config.url));
    }

    let http = reqwest::Client::builder()
      .timeout(Duration::from_millis(config.timeout_ms))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base_url })
  }

  /// Base URL with `segments` appended, each percent-encoded as one segment.
  fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| UpstreamError::Decode(format!("{} cannot take a path", self.base_url)))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, UpstreamError> {
    let response = self
      .http
      .get(url)
      .header("Content-Type", "application/json")
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(UpstreamError::Status {
        status: status.as_u16(),
        body,
      });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string()))
  }
}

#[async_trait]
impl NutrientProvider for LivsmedelClient {
  async fn fetch_food_info(&self, food_id: &str) -> Result<FoodItem, UpstreamError> {
    let url = self.endpoint(&["livsmedel", food_id])?;
    let item: ApiFoodItem = self.get_json(url).await?;
    Ok(item.into())
  }

  async fn fetch_nutrients(&self, food_id: &str) -> Result<NutrientPayload, UpstreamError> {
    let url = self.endpoint(&["livsmedel", food_id, "naeringsvaerden"])?;
    let response: ApiNutrientResponse = self.get_json(url).await?;
    Ok(response.into())
  }

  async fn search_foods(&self, query: &str, limit: u32) -> Result<SearchResult, UpstreamError> {
    let mut url = self.endpoint(&["sok"])?;
    url
      .query_pairs_mut()
      .append_pair("q", query)
      .append_pair("limit", &limit.to_string());

    let response: ApiSearchResponse = self.get_json(url).await?;
    Ok(response.into())
  }
}
