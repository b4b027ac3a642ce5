//! Core building blocks for the fitcoach backend.
//!
//! # Architecture
//!
//! - [`types`] — request payloads, the response [`types::Envelope`], and the
//!   unified [`types::NutritionFacts`] shape shared by every nutrition backend
//! - [`cache`] — the [`cache::CacheStore`] capability plus in-memory, no-op
//!   and Redis implementations
//! - [`config`] — typed configuration, loaded from JSON + env vars
//! - [`logging`] — tracing subscriber setup

pub mod cache;
pub mod config;
pub mod logging;
pub mod types;

pub use cache::{CacheError, CacheStore, MemoryCache, NoopCache};
pub use types::{AiCategory, AiPrompt, AiReply, Envelope, ErrorCode, FoodQuery, NutritionFacts};
