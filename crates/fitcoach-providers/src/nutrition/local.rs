//! Built-in nutrition table — last source in the cascade.
//!
//! A small per-100g table of common foods so basic lookups keep working when
//! both external APIs are down or unconfigured. Always available, needs no
//! network and no key.

use async_trait::async_trait;
use std::time::Instant;
use tracing::debug;

use fitcoach_core::types::{FoodNutrition, FoodQuery, NutritionFacts};

use crate::traits::{ProviderAdapter, ProviderError, ProviderResult};

/// One table row, per 100 g.
struct LocalFood {
    name: &'static str,
    calories: f64,
    protein: f64,
    carbohydrates: f64,
    fat: f64,
    fiber: Option<f64>,
    sugar: Option<f64>,
    sodium: Option<f64>,
}

#[allow(clippy::too_many_arguments)]
const fn row(
    name: &'static str,
    calories: f64,
    protein: f64,
    carbohydrates: f64,
    fat: f64,
    fiber: Option<f64>,
    sugar: Option<f64>,
    sodium: Option<f64>,
) -> LocalFood {
    LocalFood {
        name,
        calories,
        protein,
        carbohydrates,
        fat,
        fiber,
        sugar,
        sodium,
    }
}

#[rustfmt::skip]
static FOODS: &[LocalFood] = &[
    row("apple",          52.0,  0.3, 14.0,  0.2, Some(2.4), Some(10.4), None),
    row("banana",         89.0,  1.1, 22.8,  0.3, Some(2.6), Some(12.2), None),
    row("chicken breast", 165.0, 31.0,  0.0,  3.6, None,      None,      Some(74.0)),
    row("buckwheat",      343.0, 13.3, 71.5,  3.4, None,      None,      None),
    row("oatmeal",        68.0,   2.4, 12.0,  1.4, Some(1.7), None,      None),
    row("rice",           130.0,  2.7, 28.2,  0.3, None,      None,      None),
    row("egg",            155.0, 13.0,  1.1, 11.0, None,      None,      Some(124.0)),
    row("cottage cheese", 98.0,  11.0,  3.4,  4.3, None,      None,      None),
    row("salmon",         208.0, 20.0,  0.0, 13.0, None,      None,      Some(59.0)),
    row("beef",           250.0, 26.0,  0.0, 15.0, None,      None,      None),
    row("potato",         77.0,   2.0, 17.0,  0.1, Some(2.1), None,      None),
    row("tomato",         18.0,   0.9,  3.9,  0.2, Some(1.2), Some(2.6), None),
    row("cucumber",       15.0,   0.7,  3.6,  0.1, None,      None,      None),
    row("bread",          265.0,  9.0, 49.0,  3.2, Some(2.7), None,      Some(491.0)),
    row("milk",           42.0,   3.4,  5.0,  1.0, None,      Some(5.0), None),
    row("yogurt",         59.0,  10.0,  3.6,  0.4, None,      Some(3.6), None),
];

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Exact match first, then the longest table name contained in the query
/// ("grilled chicken breast" resolves to "chicken breast").
fn find_food(name: &str) -> Option<&'static LocalFood> {
    let normalized = normalize(name);

    if let Some(food) = FOODS.iter().find(|f| f.name == normalized) {
        return Some(food);
    }

    FOODS
        .iter()
        .filter(|f| normalized.contains(f.name))
        .max_by_key(|f| f.name.len())
}

impl LocalFood {
    fn to_facts(&self) -> NutritionFacts {
        let mut facts = NutritionFacts::basic(
            self.name,
            self.calories,
            self.protein,
            self.carbohydrates,
            self.fat,
            100.0,
            "local",
        );
        facts.fiber = self.fiber;
        facts.sugar = self.sugar;
        facts.sodium = self.sodium;
        facts
    }
}

// ─────────────────────────────────────────────
// LocalFoodsAdapter
// ─────────────────────────────────────────────

#[derive(Default)]
pub struct LocalFoodsAdapter;

impl LocalFoodsAdapter {
    pub fn new() -> Self {
        LocalFoodsAdapter
    }
}

#[async_trait]
impl ProviderAdapter for LocalFoodsAdapter {
    type Payload = FoodQuery;
    type Value = FoodNutrition;

    fn name(&self) -> &str {
        "LocalFoods"
    }

    fn model(&self) -> &str {
        "builtin-table"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn invoke(
        &self,
        query: &FoodQuery,
    ) -> Result<ProviderResult<FoodNutrition>, ProviderError> {
        let start = Instant::now();

        let food = find_food(&query.name).ok_or(ProviderError::NotFound)?;
        let facts = food.to_facts().scale_to_weight(query.weight_g);

        debug!("Local table result: {}", facts.summary());

        Ok(ProviderResult {
            value: facts.into(),
            provider: "LocalFoods".to_string(),
            model: "builtin-table".to_string(),
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

    #[tokio::test]
    async fn test_always_available() {
        assert!(LocalFoodsAdapter::new().is_available().await);
    }

    #[tokio::test]
    async fn test_exact_match_scaled() {
        let adapter = LocalFoodsAdapter::new();
        let result = adapter
            .invoke(&FoodQuery::new("chicken breast", 200.0))
            .await
            .unwrap();

        let facts = result.value.nutrition;
        assert_eq!(facts.calories, 330.0);
        assert_eq!(facts.protein, 62.0);
        assert_eq!(facts.weight, 200.0);
        assert_eq!(facts.source, "local");
    }

    #[tokio::test]
    async fn test_match_is_case_insensitive_and_trimmed() {
        let adapter = LocalFoodsAdapter::new();
        let result = adapter.invoke(&FoodQuery::new("  Banana ", 100.0)).await.unwrap();
        assert_eq!(result.value.nutrition.calories, 89.0);
    }

    #[tokio::test]
    async fn test_substring_match_picks_longest_name() {
        let adapter = LocalFoodsAdapter::new();
        let result = adapter
            .invoke(&FoodQuery::new("grilled chicken breast", 100.0))
            .await
            .unwrap();
        // "chicken breast", not some shorter accidental substring.
        assert_eq!(result.value.nutrition.name, "chicken breast");
    }

    #[tokio::test]
    async fn test_unknown_food_is_not_found() {
        let adapter = LocalFoodsAdapter::new();
        let err = adapter
            .invoke(&FoodQuery::new("nonexistent_food_xyz", 100.0))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotFound));
    }

    #[tokio::test]
    async fn test_optionals_present_only_where_tabulated() {
        let adapter = LocalFoodsAdapter::new();

        let apple = adapter.invoke(&FoodQuery::new("apple", 100.0)).await.unwrap();
        assert_eq!(apple.value.nutrition.fiber, Some(2.4));
        assert_eq!(apple.value.nutrition.sodium, None);

        let rice = adapter.invoke(&FoodQuery::new("rice", 100.0)).await.unwrap();
        assert_eq!(rice.value.nutrition.fiber, None);
    }
}
