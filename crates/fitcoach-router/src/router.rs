//! The generic router — cache-aside lookup in front of a provider chain.
//!
//! One router instance holds the route table for a family of request
//! categories sharing a payload and result shape. Every request flows
//! through [`Router::handle`], which always returns an envelope: cache
//! trouble degrades to a miss, chain failure becomes a generic error
//! envelope, and `processing_time_ms` is stamped on every path.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use fitcoach_core::cache::{CacheStore, NoopCache};
use fitcoach_core::types::{AiPrompt, Envelope, ErrorCode, FoodQuery};
use fitcoach_providers::{ChainError, ProviderChain};

/// User-facing messages. Generic on purpose: provider identities and error
/// details belong in the logs, not in client responses.
const UNAVAILABLE_MESSAGE: &str = "Temporarily unavailable. Please try again later.";
const NOT_FOUND_MESSAGE: &str = "No data found for this request.";
const INTERNAL_MESSAGE: &str = "Internal error. Please try again later.";

// ─────────────────────────────────────────────
// Fingerprint
// ─────────────────────────────────────────────

/// Deterministic cache identity of a request payload.
///
/// Two payloads with the same fingerprint are served the same cached result,
/// so the fingerprint must capture everything that affects the answer.
pub trait Fingerprint {
    fn fingerprint(&self) -> String;
}

/// Free-text prompts are hashed: keys stay bounded regardless of prompt
/// length. Whitespace is trimmed before hashing; case is preserved, since
/// casing can change what an LLM answers. The optional context is folded in
/// ahead of the content (with a separator byte, so the split point stays
/// unambiguous) — it becomes the system message, so it changes the answer
/// and must change the key.
impl Fingerprint for AiPrompt {
    fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        if let Some(context) = &self.context {
            hasher.update(context.trim().as_bytes());
            hasher.update([0u8]);
        }
        hasher.update(self.content.trim().as_bytes());
        let digest = hasher.finalize();
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Food lookups key on the normalized name plus portion weight, kept
/// readable for cache inspection.
impl Fingerprint for FoodQuery {
    fn fingerprint(&self) -> String {
        format!(
            "{}:{}",
            self.name.trim().to_lowercase(),
            format_weight(self.weight_g)
        )
    }
}

/// Integral weights print without the fractional part ("150", not "150.0").
fn format_weight(weight_g: f64) -> String {
    if weight_g.fract() == 0.0 {
        format!("{}", weight_g as i64)
    } else {
        format!("{weight_g}")
    }
}

// ─────────────────────────────────────────────
// CachePolicy
// ─────────────────────────────────────────────

/// Where and for how long results of one category are cached.
#[derive(Clone, Debug)]
pub struct CachePolicy {
    /// Key prefix, also the unit of targeted invalidation.
    pub prefix: String,
    pub ttl: Duration,
}

impl CachePolicy {
    pub fn new(prefix: impl Into<String>, ttl: Duration) -> Self {
        CachePolicy {
            prefix: prefix.into(),
            ttl,
        }
    }

    /// Full cache key for one request fingerprint.
    pub fn key(&self, fingerprint: &str) -> String {
        format!("{}:{}", self.prefix, fingerprint)
    }
}

/// What gets cached: the payload plus enough provider metadata to rebuild a
/// faithful envelope on a hit. Internal format, versioned only by shape —
/// an undecodable entry is discarded as a miss.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry<V> {
    payload: V,
    provider: String,
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tokens_used: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cost_usd: Option<f64>,
}

// ─────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────

struct Route<P, V> {
    chain: ProviderChain<P, V>,
    policy: CachePolicy,
}

/// Routes requests of category `C` through cache and provider chain.
/// Immutable after construction; shared behind an `Arc`.
pub struct Router<C, P, V> {
    routes: HashMap<C, Route<P, V>>,
    cache: Arc<dyn CacheStore>,
}

/// Builder for [`Router`]. A router without an explicit cache runs on the
/// no-op store.
pub struct RouterBuilder<C, P, V> {
    routes: HashMap<C, Route<P, V>>,
    cache: Option<Arc<dyn CacheStore>>,
}

impl<C, P, V> Default for RouterBuilder<C, P, V>
where
    C: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C, P, V> RouterBuilder<C, P, V>
where
    C: Eq + Hash,
{
    pub fn new() -> Self {
        RouterBuilder {
            routes: HashMap::new(),
            cache: None,
        }
    }

    pub fn cache(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(store);
        self
    }

    pub fn route(mut self, category: C, chain: ProviderChain<P, V>, policy: CachePolicy) -> Self {
        self.routes.insert(category, Route { chain, policy });
        self
    }

    pub fn build(self) -> Router<C, P, V> {
        Router {
            routes: self.routes,
            cache: self.cache.unwrap_or_else(|| Arc::new(NoopCache)),
        }
    }
}

impl<C, P, V> Router<C, P, V>
where
    C: Copy + Eq + Hash + fmt::Display,
    P: Send + Sync,
    V: Send,
{
    /// Route one request: cache first, provider chain on a miss.
    ///
    /// Never fails — every outcome is an envelope, with the total processing
    /// time stamped on success and failure alike.
    pub async fn handle(&self, category: C, payload: &P) -> Envelope<V>
    where
        P: Fingerprint,
        V: Serialize + DeserializeOwned,
    {
        let start = Instant::now();
        let envelope = self.dispatch(category, payload).await;
        envelope.with_processing_time(start.elapsed().as_millis() as u64)
    }

    async fn dispatch(&self, category: C, payload: &P) -> Envelope<V>
    where
        P: Fingerprint,
        V: Serialize + DeserializeOwned,
    {
        let Some(route) = self.routes.get(&category) else {
            error!(%category, "No route configured for category");
            return Envelope::failure(ErrorCode::Internal, INTERNAL_MESSAGE);
        };

        let key = route.policy.key(&payload.fingerprint());

        if let Some(entry) = self.cached_entry(&key).await {
            debug!(%category, key, "Cache hit");
            return Envelope::success(entry.payload, entry.provider, entry.model)
                .with_usage(entry.tokens_used, entry.cost_usd)
                .mark_cached();
        }

        match route.chain.execute(payload).await {
            Ok(result) => {
                let entry = CacheEntry {
                    payload: result.value,
                    provider: result.provider,
                    model: result.model,
                    tokens_used: result.tokens_used,
                    cost_usd: result.cost_usd,
                };
                self.store_entry(&key, route.policy.ttl, &entry).await;
                Envelope::success(entry.payload, entry.provider, entry.model)
                    .with_usage(entry.tokens_used, entry.cost_usd)
            }
            Err(err @ ChainError::NotFound { .. }) => {
                info!(%category, %err, "No data in any source");
                Envelope::failure(ErrorCode::NotFound, NOT_FOUND_MESSAGE)
            }
            Err(err) => {
                error!(%category, %err, "Provider chain exhausted");
                Envelope::failure(ErrorCode::ChainExhausted, UNAVAILABLE_MESSAGE)
            }
        }
    }

    /// Fire-and-forget variant for callers that answer out-of-band (bot
    /// handlers replying to chat messages).
    pub fn spawn(self: &Arc<Self>, category: C, payload: P) -> JoinHandle<Envelope<V>>
    where
        C: Send + Sync + 'static,
        P: Fingerprint + Send + Sync + 'static,
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let router = Arc::clone(self);
        tokio::spawn(async move { router.handle(category, &payload).await })
    }

    /// The provider chain serving one category, if routed.
    pub fn chain(&self, category: C) -> Option<&ProviderChain<P, V>> {
        self.routes.get(&category).map(|route| &route.chain)
    }

    /// Drop every cached entry under a key prefix. Returns the number of
    /// deleted entries; a failing cache deletes nothing and is logged.
    pub async fn purge(&self, prefix: &str) -> u64 {
        match self.cache.delete_by_prefix(prefix).await {
            Ok(deleted) => {
                info!(prefix, deleted, "Cache purged");
                deleted
            }
            Err(e) => {
                warn!(prefix, error = %e, "Cache purge failed");
                0
            }
        }
    }

    async fn cached_entry(&self, key: &str) -> Option<CacheEntry<V>>
    where
        V: DeserializeOwned,
    {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(key, error = %e, "Discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => None,
            // Cache trouble is a miss, never a request failure.
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    async fn store_entry(&self, key: &str, ttl: Duration, entry: &CacheEntry<V>)
    where
        V: Serialize,
    {
        match serde_json::to_string(entry) {
            Ok(raw) => {
                if let Err(e) = self.cache.set(key, &raw, ttl).await {
                    warn!(key, error = %e, "Cache write failed");
                }
            }
            Err(e) => warn!(key, error = %e, "Failed to encode cache entry"),
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
