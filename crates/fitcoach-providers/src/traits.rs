//! Provider adapter trait — the core abstraction over external backends.
//!
//! Every backend (an LLM vendor or a nutrition-data vendor) implements this
//! trait. "Not configured" is expressed as `is_available() == false`, never
//! as a nullable service handle, so call sites carry no null checks.

use async_trait::async_trait;
use std::time::Duration;

/// One successful unit of work from one provider invocation.
///
/// Produced once per `invoke` and never mutated; the router wraps it into the
/// caller-visible envelope.
#[derive(Clone, Debug)]
pub struct ProviderResult<T> {
    /// The unified result payload for this request category.
    pub value: T,
    /// Display name of the provider that produced it.
    pub provider: String,
    /// Model or dataset identity within the provider.
    pub model: String,
    /// Total tokens consumed, where the backend reports usage.
    pub tokens_used: Option<u32>,
    /// Estimated monetary cost of the call.
    pub cost_usd: Option<f64>,
    /// Wall-clock duration of the backend call.
    pub latency: Duration,
}

/// Failure modes of a single adapter invocation.
///
/// Retry is never done inside the adapter — trying the next provider is the
/// chain's job, so adapters only classify and report.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The backend is not configured or its readiness probe failed.
    #[error("provider not configured or unreachable")]
    Unavailable,
    /// The backend call itself failed (network, auth, malformed response).
    #[error("invocation failed: {0}")]
    Invocation(String),
    /// The backend answered normally but has no data for the request.
    #[error("no data found")]
    NotFound,
}

/// A single external backend capable of fulfilling one request category.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Request payload this adapter consumes.
    type Payload: Send + Sync;
    /// Unified result shape this adapter produces.
    type Value: Send;

    /// Display name, used in logs and result metadata.
    fn name(&self) -> &str;

    /// Model or dataset identity, used in result metadata.
    fn model(&self) -> &str;

    /// Cheap readiness pre-flight. Must not perform the unit of work; a
    /// local check (key configured) is enough.
    async fn is_available(&self) -> bool;

    /// Execute the unit of work against the backend.
    async fn invoke(
        &self,
        payload: &Self::Payload,
    ) -> Result<ProviderResult<Self::Value>, ProviderError>;
}
