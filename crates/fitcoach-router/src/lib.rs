//! Request routing for the fitcoach backend.
//!
//! The [`router::Router`] is the single entry point for a request category:
//! it consults the cache, walks the category's provider chain on a miss, and
//! always returns a caller-ready [`fitcoach_core::types::Envelope`]. The
//! [`ai::AiRouterService`] and [`nutrition::NutritionService`] facades wire
//! concrete chains and cache policies from configuration.

pub mod ai;
pub mod nutrition;
pub mod router;

pub use ai::AiRouterService;
pub use nutrition::NutritionService;
pub use router::{CachePolicy, Fingerprint, Router, RouterBuilder};
