//! Nutrition-data adapters.
//!
//! Every adapter, regardless of backend, yields the same unified
//! `NutritionFacts` shape, already scaled to the requested portion weight.
//! Optional nutrient fields a backend does not report stay absent.

mod fatsecret;
mod local;
mod usda;

pub use fatsecret::FatSecretAdapter;
pub use local::LocalFoodsAdapter;
pub use usda::UsdaAdapter;
