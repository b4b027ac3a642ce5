//! AI routing facade — categories, chains and cache TTLs wired from config.
//!
//! Chain order encodes cost: analysis categories start at DeepSeek (the
//! cheapest tier), advice and chat start at Gemini Flash, and complex
//! queries go straight to OpenAI. Every chain ends in OpenAI so a single
//! configured key keeps the whole service answering.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use fitcoach_core::cache::CacheStore;
use fitcoach_core::config::Config;
use fitcoach_core::types::{AiCategory, AiPrompt, AiReply, Envelope};
use fitcoach_providers::{
    ChatAdapter, ProviderAdapter, ProviderChain, DEEPSEEK, GEMINI, OPENAI,
};

use crate::router::{CachePolicy, Router, RouterBuilder};

type LlmAdapter = Arc<dyn ProviderAdapter<Payload = AiPrompt, Value = AiReply>>;

const CACHE_PREFIX: &str = "ai:cache";

/// How long results of one category stay valid.
///
/// Stable analyses (a food is a food) keep long TTLs; progress analysis and
/// chat go stale quickly because the underlying user data moves.
fn cache_ttl(category: AiCategory) -> Duration {
    match category {
        AiCategory::FoodAnalysis => Duration::from_secs(30 * 60),
        AiCategory::NutritionAdvice => Duration::from_secs(2 * 60 * 60),
        AiCategory::ProgressAnalysis => Duration::from_secs(15 * 60),
        AiCategory::WorkoutPlanning => Duration::from_secs(6 * 60 * 60),
        AiCategory::ChatResponse => Duration::from_secs(5 * 60),
        AiCategory::ComplexQuery => Duration::from_secs(60 * 60),
    }
}

fn policy_for(category: AiCategory) -> CachePolicy {
    CachePolicy::new(format!("{CACHE_PREFIX}:{category}"), cache_ttl(category))
}

fn chain_for(
    category: AiCategory,
    deepseek: &LlmAdapter,
    gemini: &LlmAdapter,
    openai: &LlmAdapter,
) -> Result<ProviderChain<AiPrompt, AiReply>> {
    let adapters: Vec<LlmAdapter> = match category {
        AiCategory::FoodAnalysis | AiCategory::ProgressAnalysis => {
            vec![deepseek.clone(), gemini.clone(), openai.clone()]
        }
        AiCategory::NutritionAdvice | AiCategory::WorkoutPlanning | AiCategory::ChatResponse => {
            vec![gemini.clone(), openai.clone()]
        }
        AiCategory::ComplexQuery => vec![openai.clone()],
    };
    Ok(ProviderChain::new(adapters)?)
}

/// Routes AI requests to LLM providers with category-aware caching.
pub struct AiRouterService {
    router: Arc<Router<AiCategory, AiPrompt, AiReply>>,
}

impl AiRouterService {
    /// Wire every category's chain and cache policy from configuration.
    /// Unconfigured providers stay in their chain slots and are skipped at
    /// request time.
    pub fn from_config(config: &Config, cache: Arc<dyn CacheStore>) -> Result<Self> {
        let deepseek: LlmAdapter = Arc::new(ChatAdapter::new(&config.ai.deepseek, &DEEPSEEK));
        let gemini: LlmAdapter = Arc::new(ChatAdapter::new(&config.ai.gemini, &GEMINI));
        let openai: LlmAdapter = Arc::new(ChatAdapter::new(&config.ai.openai, &OPENAI));

        let mut builder = RouterBuilder::new().cache(cache);
        for &category in AiCategory::all() {
            builder = builder.route(
                category,
                chain_for(category, &deepseek, &gemini, &openai)?,
                policy_for(category),
            );
        }

        Ok(AiRouterService {
            router: Arc::new(builder.build()),
        })
    }

    /// Route one prompt through cache and the category's chain.
    ///
    /// `user_id` identifies the originator for the logs; it never affects
    /// routing or cache identity.
    pub async fn process(
        &self,
        category: AiCategory,
        prompt: AiPrompt,
        user_id: Option<i64>,
    ) -> Envelope<AiReply> {
        info!(%category, user_id, content_len = prompt.content.len(), "AI request");
        self.router.handle(category, &prompt).await
    }

    /// Fire-and-forget variant for handlers that deliver the reply
    /// out-of-band.
    pub fn process_detached(
        &self,
        category: AiCategory,
        prompt: AiPrompt,
        user_id: Option<i64>,
    ) -> JoinHandle<Envelope<AiReply>> {
        info!(%category, user_id, content_len = prompt.content.len(), "AI request (detached)");
        self.router.spawn(category, prompt)
    }

    /// Whether any provider in the category's chain is currently usable.
    pub async fn is_available(&self, category: AiCategory) -> bool {
        match self.router.chain(category) {
            Some(chain) => chain.any_available().await,
            None => false,
        }
    }

    /// Provider names serving a category, in fallback order.
    pub fn providers(&self, category: AiCategory) -> Vec<&str> {
        self.router
            .chain(category)
            .map(|chain| chain.providers())
            .unwrap_or_default()
    }

    /// Drop every cached AI response, all categories. Returns the number of
    /// deleted entries.
    pub async fn clear_cache(&self) -> u64 {
        self.router.purge(&format!("{CACHE_PREFIX}:")).await
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
