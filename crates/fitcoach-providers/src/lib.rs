//! Provider layer for fitcoach — one adapter per external backend, plus the
//! ordered fallback chain that traverses them.
//!
//! # Architecture
//!
//! - [`traits::ProviderAdapter`] — trait every backend implements
//!   (`is_available` pre-flight + `invoke`)
//! - [`chain::ProviderChain`] — cheapest-capable-first traversal with
//!   fallback on failure
//! - [`llm`] — OpenAI-compatible chat adapters (DeepSeek, Gemini, OpenAI)
//! - [`nutrition`] — food-data adapters (FatSecret, USDA, built-in table)

pub mod chain;
pub mod llm;
pub mod nutrition;
pub mod traits;

pub use chain::{ChainError, EmptyChain, ProviderChain};
pub use llm::{ChatAdapter, LlmSpec, DEEPSEEK, GEMINI, OPENAI};
pub use nutrition::{FatSecretAdapter, LocalFoodsAdapter, UsdaAdapter};
pub use traits::{ProviderAdapter, ProviderError, ProviderResult};
