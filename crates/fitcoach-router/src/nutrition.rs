//! Nutrition lookup facade — the FatSecret → USDA → built-in cascade.
//!
//! One global route: nutrition facts for a food do not vary per user, so
//! results are cached under a shared namespace with a 24 h TTL. The
//! built-in table closes the cascade, which makes the service available
//! even with no API key configured at all.

use anyhow::Result;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use fitcoach_core::cache::CacheStore;
use fitcoach_core::config::Config;
use fitcoach_core::types::{Envelope, FoodNutrition, FoodQuery};
use fitcoach_providers::{
    FatSecretAdapter, LocalFoodsAdapter, ProviderAdapter, ProviderChain, UsdaAdapter,
};

use crate::router::{CachePolicy, Router, RouterBuilder};

type NutritionAdapter = Arc<dyn ProviderAdapter<Payload = FoodQuery, Value = FoodNutrition>>;

const CACHE_PREFIX: &str = "nutrition:global";
const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// The single nutrition route. Lookups are global, never per-user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct GlobalLookup;

impl fmt::Display for GlobalLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("nutrition")
    }
}

/// Looks up nutrition facts through the source cascade, cache-first.
pub struct NutritionService {
    router: Arc<Router<GlobalLookup, FoodQuery, FoodNutrition>>,
}

impl NutritionService {
    pub fn from_config(config: &Config, cache: Arc<dyn CacheStore>) -> Result<Self> {
        let adapters: Vec<NutritionAdapter> = vec![
            Arc::new(FatSecretAdapter::new(&config.nutrition.fatsecret)),
            Arc::new(UsdaAdapter::new(&config.nutrition.usda)),
            Arc::new(LocalFoodsAdapter::new()),
        ];

        let router = RouterBuilder::new()
            .cache(cache)
            .route(
                GlobalLookup,
                ProviderChain::new(adapters)?,
                CachePolicy::new(CACHE_PREFIX, CACHE_TTL),
            )
            .build();

        Ok(NutritionService {
            router: Arc::new(router),
        })
    }

    /// Facts for `weight_g` grams of a food, from the first source that has
    /// it.
    ///
    /// `user_id` identifies the originator for the logs; lookups and their
    /// cache entries are global across users.
    pub async fn lookup(
        &self,
        name: &str,
        weight_g: f64,
        user_id: Option<i64>,
    ) -> Envelope<FoodNutrition> {
        info!(food = name, weight_g, user_id, "Nutrition lookup");
        self.router
            .handle(GlobalLookup, &FoodQuery::new(name, weight_g))
            .await
    }

    /// Source names in cascade order.
    pub fn sources(&self) -> Vec<&str> {
        self.router
            .chain(GlobalLookup)
            .map(|chain| chain.providers())
            .unwrap_or_default()
    }

    /// Whether any source can answer. Always true in practice — the built-in
    /// table needs no configuration.
    pub async fn is_any_source_available(&self) -> bool {
        match self.router.chain(GlobalLookup) {
            Some(chain) => chain.any_available().await,
            None => false,
        }
    }

    /// Drop every cached nutrition entry. Returns the number deleted.
    pub async fn clear_cache(&self) -> u64 {
        self.router.purge("nutrition:").await
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
