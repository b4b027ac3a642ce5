//! Configuration — typed schema plus JSON/env loader.

pub mod loader;
pub mod schema;

pub use loader::{load_config, save_config};
pub use schema::{AiProvidersConfig, CacheConfig, Config, NutritionProvidersConfig, ProviderConfig};
