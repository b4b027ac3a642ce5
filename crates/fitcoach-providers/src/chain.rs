//! Provider chain — ordered fallback traversal over adapters.
//!
//! Priority order is fixed at configuration time and encodes "cheapest
//! capable provider first". Fallback is an explicit, typed branch of the
//! traversal, not exception-driven control flow.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::traits::{ProviderAdapter, ProviderError, ProviderResult};

/// Configuring a chain with no adapters is a programming error and fails at
/// startup, never at request time.
#[derive(Debug, thiserror::Error)]
#[error("provider chain must contain at least one adapter")]
pub struct EmptyChain;

/// One attempted adapter and why it did not produce a result.
#[derive(Clone, Debug)]
pub struct Attempt {
    pub provider: String,
    pub reason: String,
}

/// Failure of an entire chain traversal.
///
/// `Exhausted` means providers themselves failed or were unavailable;
/// `NotFound` means every invoked provider answered normally but none had
/// data. The two are logged and surfaced differently.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// Every adapter failed or was unavailable. Carries the full attempt
    /// list so logs show that the cascade, not one provider, failed.
    #[error("all providers failed: {}", summarize_attempts(.attempts))]
    Exhausted { attempts: Vec<Attempt> },
    /// Every invoked adapter reported "no data found".
    #[error("no data found in any source (asked: {})", .providers.join(", "))]
    NotFound { providers: Vec<String> },
}

fn summarize_attempts(attempts: &[Attempt]) -> String {
    attempts
        .iter()
        .map(|a| format!("{} ({})", a.provider, a.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Ordered, non-empty list of adapters for one request category.
/// Immutable after construction.
pub struct ProviderChain<P, V> {
    adapters: Vec<Arc<dyn ProviderAdapter<Payload = P, Value = V>>>,
}

impl<P, V> ProviderChain<P, V>
where
    P: Send + Sync,
    V: Send,
{
    /// Build a chain, rejecting an empty adapter list.
    pub fn new(
        adapters: Vec<Arc<dyn ProviderAdapter<Payload = P, Value = V>>>,
    ) -> Result<Self, EmptyChain> {
        if adapters.is_empty() {
            return Err(EmptyChain);
        }
        Ok(ProviderChain { adapters })
    }

    /// Adapter display names, in priority order.
    pub fn providers(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Whether at least one adapter currently reports itself available.
    pub async fn any_available(&self) -> bool {
        for adapter in &self.adapters {
            if adapter.is_available().await {
                return true;
            }
        }
        false
    }

    /// Traverse adapters strictly in priority order.
    ///
    /// Unavailable adapters are skipped without invocation; a failed
    /// invocation is logged at WARN with the adapter identity and the
    /// traversal continues. The first success is returned immediately —
    /// priority order already encodes preference, so no later adapter is
    /// consulted.
    pub async fn execute(&self, payload: &P) -> Result<ProviderResult<V>, ChainError> {
        let mut attempts: Vec<Attempt> = Vec::new();
        let mut no_data: Vec<String> = Vec::new();
        let mut hard_failure = false;

        for adapter in &self.adapters {
            let name = adapter.name();

            if !adapter.is_available().await {
                debug!(provider = name, "Provider unavailable, skipping");
                attempts.push(Attempt {
                    provider: name.to_string(),
                    reason: "unavailable".to_string(),
                });
                continue;
            }

            match adapter.invoke(payload).await {
                Ok(result) => {
                    info!(
                        provider = name,
                        latency_ms = result.latency.as_millis() as u64,
                        fallbacks = attempts.len(),
                        "Provider succeeded"
                    );
                    return Ok(result);
                }
                Err(ProviderError::NotFound) => {
                    debug!(provider = name, "Provider has no data, trying next source");
                    no_data.push(name.to_string());
                    attempts.push(Attempt {
                        provider: name.to_string(),
                        reason: "no data".to_string(),
                    });
                }
                Err(e) => {
                    warn!(provider = name, error = %e, "Provider failed, falling back");
                    hard_failure = true;
                    attempts.push(Attempt {
                        provider: name.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        // Classification: a NotFound cascade means the sources worked and
        // genuinely had nothing; any hard failure (or nothing invoked at
        // all) makes the traversal an exhaustion instead.
        if !no_data.is_empty() && !hard_failure {
            Err(ChainError::NotFound { providers: no_data })
        } else {
            Err(ChainError::Exhausted { attempts })
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
