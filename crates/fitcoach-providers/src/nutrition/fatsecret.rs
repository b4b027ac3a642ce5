//! FatSecret adapter — first source in the nutrition cascade.
//!
//! Uses `foods.search` and extracts macros from the `food_description`
//! string, which FatSecret formats as
//! `"Per 100g - Calories: 250kcal | Fat: 5.00g | Carbs: 30.00g | Protein: 10.00g"`.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, error};

use fitcoach_core::config::ProviderConfig;
use fitcoach_core::types::{FoodNutrition, FoodQuery, NutritionFacts};

use crate::traits::{ProviderAdapter, ProviderError, ProviderResult};

const DEFAULT_API_BASE: &str = "https://platform.fatsecret.com/rest/server.api";

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchResponse {
    foods: Option<Foods>,
}

#[derive(Debug, Deserialize)]
struct Foods {
    #[serde(default)]
    food: FoodList,
}

/// FatSecret returns a single object for one match and an array otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FoodList {
    Many(Vec<FatSecretFood>),
    One(Box<FatSecretFood>),
}

impl Default for FoodList {
    fn default() -> Self {
        FoodList::Many(Vec::new())
    }
}

impl FoodList {
    fn into_first(self) -> Option<FatSecretFood> {
        match self {
            FoodList::Many(foods) => foods.into_iter().next(),
            FoodList::One(food) => Some(*food),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FatSecretFood {
    food_name: String,
    #[serde(default)]
    food_description: Option<String>,
}

// ─────────────────────────────────────────────
// Description parsing
// ─────────────────────────────────────────────

/// Parse the leading decimal number of a string ("250kcal" → 250.0).
fn leading_number(s: &str) -> Option<f64> {
    let trimmed = s.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit() && c != '.' && c != '-')
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}

/// Extract one `"Label: <value><unit>"` segment from the description.
fn parse_nutrient(description: &str, label: &str) -> Option<f64> {
    let needle = format!("{}:", label.to_lowercase());
    description.split('|').find_map(|part| {
        let part_lower = part.to_lowercase();
        let idx = part_lower.find(&needle)?;
        leading_number(&part[idx + needle.len()..])
    })
}

/// Reference portion weight from the `"Per 100g - …"` prefix; FatSecret
/// defaults to 100 g when the prefix is missing or unparseable.
fn parse_reference_weight(description: &str) -> f64 {
    let lower = description.trim_start().to_lowercase();
    lower
        .strip_prefix("per ")
        .and_then(leading_number)
        .unwrap_or(100.0)
}

fn facts_from_description(name: &str, description: &str) -> NutritionFacts {
    NutritionFacts::basic(
        name,
        parse_nutrient(description, "Calories").unwrap_or(0.0),
        parse_nutrient(description, "Protein").unwrap_or(0.0),
        parse_nutrient(description, "Carbs").unwrap_or(0.0),
        parse_nutrient(description, "Fat").unwrap_or(0.0),
        parse_reference_weight(description),
        "FatSecret",
    )
}

// ─────────────────────────────────────────────
// FatSecretAdapter
// ─────────────────────────────────────────────

pub struct FatSecretAdapter {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl FatSecretAdapter {
    pub fn new(config: &ProviderConfig) -> Self {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        FatSecretAdapter {
            client,
            api_base,
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for FatSecretAdapter {
    type Payload = FoodQuery;
    type Value = FoodNutrition;

    fn name(&self) -> &str {
        "FatSecret"
    }

    fn model(&self) -> &str {
        "foods.search"
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn invoke(
        &self,
        query: &FoodQuery,
    ) -> Result<ProviderResult<FoodNutrition>, ProviderError> {
        let start = Instant::now();

        debug!(food = %query.name, weight = query.weight_g, "FatSecret search");

        let response = self
            .client
            .get(&self.api_base)
            .bearer_auth(&self.api_key)
            .query(&[
                ("method", "foods.search"),
                ("search_expression", query.name.as_str()),
                ("format", "json"),
                ("max_results", "1"),
            ])
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "FatSecret request failed");
                ProviderError::Invocation(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "FatSecret API error");
            return Err(ProviderError::Invocation(format!("API error {status}")));
        }

        let search: SearchResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse FatSecret response");
            ProviderError::Invocation(format!("malformed response: {e}"))
        })?;

        let food = search
            .foods
            .and_then(|f| f.food.into_first())
            .ok_or(ProviderError::NotFound)?;

        let description = food.food_description.as_deref().unwrap_or("");
        let facts =
            facts_from_description(&food.food_name, description).scale_to_weight(query.weight_g);

        debug!("FatSecret result: {}", facts.summary());

        Ok(ProviderResult {
            value: facts.into(),
            provider: "FatSecret".to_string(),
            model: "foods.search".to_string(),
            tokens_used: None,
            cost_usd: None,
            latency: start.elapsed(),
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
