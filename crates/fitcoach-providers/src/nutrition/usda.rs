//! USDA FoodData Central adapter — second source in the nutrition cascade.
//!
//! Searches `/foods/search` and maps FDC nutrient IDs onto the unified
//! facts shape. FDC reports values per 100 g.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, error};

use fitcoach_core::config::ProviderConfig;
use fitcoach_core::types::{FoodNutrition, FoodQuery, NutritionFacts};

use crate::traits::{ProviderAdapter, ProviderError, ProviderResult};

const DEFAULT_API_BASE: &str = "https://api.nal.usda.gov/fdc/v1";

// FDC nutrient IDs.
const NUTRIENT_ENERGY_KCAL: u32 = 1008;
const NUTRIENT_PROTEIN: u32 = 1003;
const NUTRIENT_FAT: u32 = 1004;
const NUTRIENT_CARBS: u32 = 1005;
const NUTRIENT_FIBER: u32 = 1079;
const NUTRIENT_SUGAR: u32 = 2000;
const NUTRIENT_SODIUM: u32 = 1093;

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<FdcFood>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FdcFood {
    description: String,
    #[serde(default)]
    food_nutrients: Vec<FdcNutrient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FdcNutrient {
    nutrient_id: u32,
    #[serde(default)]
    value: Option<f64>,
}

impl FdcFood {
    fn nutrient(&self, id: u32) -> Option<f64> {
        self.food_nutrients
            .iter()
            .find(|n| n.nutrient_id == id)
            .and_then(|n| n.value)
    }

    /// Facts per the FDC reference portion of 100 g.
    fn to_facts(&self) -> NutritionFacts {
        let mut facts = NutritionFacts::basic(
            &self.description,
            self.nutrient(NUTRIENT_ENERGY_KCAL).unwrap_or(0.0),
            self.nutrient(NUTRIENT_PROTEIN).unwrap_or(0.0),
            self.nutrient(NUTRIENT_CARBS).unwrap_or(0.0),
            self.nutrient(NUTRIENT_FAT).unwrap_or(0.0),
            100.0,
            "USDA",
        );
        facts.fiber = self.nutrient(NUTRIENT_FIBER);
        facts.sugar = self.nutrient(NUTRIENT_SUGAR);
        facts.sodium = self.nutrient(NUTRIENT_SODIUM);
        facts
    }
}

// ─────────────────────────────────────────────
// UsdaAdapter
// ─────────────────────────────────────────────

pub struct UsdaAdapter {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl UsdaAdapter {
    pub fn new(config: &ProviderConfig) -> Self {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        UsdaAdapter {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn search_url(&self) -> String {
        format!("{}/foods/search", self.api_base)
    }
}

#[async_trait]
impl ProviderAdapter for UsdaAdapter {
    type Payload = FoodQuery;
    type Value = FoodNutrition;

    fn name(&self) -> &str {
        "USDA"
    }

    fn model(&self) -> &str {
        "fdc-search"
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn invoke(
        &self,
        query: &FoodQuery,
    ) -> Result<ProviderResult<FoodNutrition>, ProviderError> {
        let start = Instant::now();

        debug!(food = %query.name, weight = query.weight_g, "USDA search");

        let response = self
            .client
            .get(self.search_url())
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("query", query.name.as_str()),
                ("pageSize", "1"),
            ])
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "USDA request failed");
                ProviderError::Invocation(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "USDA API error");
            return Err(ProviderError::Invocation(format!("API error {status}")));
        }

        let search: SearchResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse USDA response");
            ProviderError::Invocation(format!("malformed response: {e}"))
        })?;

        let food = search.foods.into_iter().next().ok_or(ProviderError::NotFound)?;
        let facts = food.to_facts().scale_to_weight(query.weight_g);

        debug!("USDA result: {}", facts.summary());

        Ok(ProviderResult {
            value: facts.into(),
            provider: "USDA".to_string(),
            model: "fdc-search".to_string(),
            tokens_used: None,
            cost_usd: None,
            latency: start.elapsed(),
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_config(api_key: &str, api_base: &str) -> ProviderConfig {
        ProviderConfig {
            api_key: api_key.to_string(),
            api_base: Some(api_base.to_string()),
            model: None,
        }
    }

    fn banana_body() -> serde_json::Value {
        serde_json::json!({
            "totalHits": 1,
            "foods": [{
                "fdcId": 173944,
                "description": "Bananas, raw",
                "foodNutrients": [
                    { "nutrientId": 1008, "value": 89.0 },
                    { "nutrientId": 1003, "value": 1.1 },
                    { "nutrientId": 1004, "value": 0.3 },
                    { "nutrientId": 1005, "value": 22.8 },
                    { "nutrientId": 1079, "value": 2.6 },
                    { "nutrientId": 2000, "value": 12.2 },
                    { "nutrientId": 1093, "value": 1.0 }
                ]
            }]
        })
    }

    #[tokio::test]
    async fn test_search_maps_nutrient_ids() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/foods/search"))
            .and(query_param("query", "banana"))
            .and(query_param("api_key", "demo-key"))
            .and(query_param("pageSize", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(banana_body()))
            .mount(&mock_server)
            .await;

        let adapter = UsdaAdapter::new(&make_config("demo-key", &mock_server.uri()));
        let result = adapter.invoke(&FoodQuery::new("banana", 100.0)).await.unwrap();

        let facts = result.value.nutrition;
        assert_eq!(facts.name, "Bananas, raw");
        assert_eq!(facts.calories, 89.0);
        assert_eq!(facts.protein, 1.1);
        assert_eq!(facts.carbohydrates, 22.8);
        assert_eq!(facts.fiber, Some(2.6));
        assert_eq!(facts.sugar, Some(12.2));
        assert_eq!(facts.sodium, Some(1.0));
        assert_eq!(facts.source, "USDA");
    }

    #[tokio::test]
    async fn test_search_scales_to_requested_weight() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/foods/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(banana_body()))
            .mount(&mock_server)
            .await;

        let adapter = UsdaAdapter::new(&make_config("demo-key", &mock_server.uri()));
        let result = adapter.invoke(&FoodQuery::new("banana", 50.0)).await.unwrap();

        let facts = result.value.nutrition;
        assert_eq!(facts.calories, 44.5);
        assert_eq!(facts.fiber, Some(1.3));
        assert_eq!(facts.weight, 50.0);
    }

    #[tokio::test]
    async fn test_missing_nutrients_default_but_optionals_stay_absent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/foods/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "foods": [{
                    "fdcId": 1,
                    "description": "Mystery food",
                    "foodNutrients": [
                        { "nutrientId": 1008, "value": 100.0 }
                    ]
                }]
            })))
            .mount(&mock_server)
            .await;

        let adapter = UsdaAdapter::new(&make_config("demo-key", &mock_server.uri()));
        let result = adapter.invoke(&FoodQuery::new("mystery", 100.0)).await.unwrap();

        let facts = result.value.nutrition;
        assert_eq!(facts.calories, 100.0);
        // Required macros default to zero when FDC omits them.
        assert_eq!(facts.protein, 0.0);
        // Optional micronutrients stay absent, not zero.
        assert_eq!(facts.fiber, None);
        assert_eq!(facts.sodium, None);
    }

    #[tokio::test]
    async fn test_empty_results_is_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/foods/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "totalHits": 0,
                "foods": []
            })))
            .mount(&mock_server)
            .await;

        let adapter = UsdaAdapter::new(&make_config("demo-key", &mock_server.uri()));
        let err = adapter
            .invoke(&FoodQuery::new("nonexistent_food_xyz", 100.0))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotFound));
    }

    #[tokio::test]
    async fn test_rate_limit_is_invocation_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/foods/search"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let adapter = UsdaAdapter::new(&make_config("demo-key", &mock_server.uri()));
        let err = adapter.invoke(&FoodQuery::new("banana", 100.0)).await.unwrap_err();
        assert!(matches!(err, ProviderError::Invocation(_)));
    }

    #[tokio::test]
    async fn test_unavailable_without_key() {
        let adapter = UsdaAdapter::new(&ProviderConfig::default());
        assert!(!adapter.is_available().await);
    }
}
