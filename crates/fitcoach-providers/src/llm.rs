//! OpenAI-compatible chat adapters for the AI routing chains.
//!
//! One generic [`ChatAdapter`] covers every LLM backend that speaks the
//! `/chat/completions` protocol; a static [`LlmSpec`] per vendor supplies
//! endpoint, default model, and per-token pricing for the cost estimate
//! attached to each result.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error};

use fitcoach_core::config::ProviderConfig;
use fitcoach_core::types::{AiPrompt, AiReply};

use crate::traits::{ProviderAdapter, ProviderError, ProviderResult};

// ─────────────────────────────────────────────
// LlmSpec — static metadata for one vendor
// ─────────────────────────────────────────────

/// Static specification for one LLM vendor.
#[derive(Clone, Debug)]
pub struct LlmSpec {
    /// Internal name (config section key).
    pub name: &'static str,
    /// Human-readable name for logs and result metadata.
    pub display_name: &'static str,
    /// Default API base URL for the OpenAI-compatible endpoint.
    pub default_api_base: &'static str,
    /// Default model identifier.
    pub default_model: &'static str,
    /// Price per one million tokens, for the cost estimate.
    pub usd_per_1m_tokens: f64,
}

/// DeepSeek — cheapest tier, first in the analysis chains.
pub static DEEPSEEK: LlmSpec = LlmSpec {
    name: "deepseek",
    display_name: "DeepSeek",
    default_api_base: "https://api.deepseek.com/v1",
    default_model: "deepseek-chat",
    usd_per_1m_tokens: 0.14,
};

/// Gemini Flash via its OpenAI-compatible endpoint — advice/chat tier.
pub static GEMINI: LlmSpec = LlmSpec {
    name: "gemini",
    display_name: "Gemini",
    default_api_base: "https://generativelanguage.googleapis.com/v1beta/openai",
    default_model: "gemini-2.0-flash",
    usd_per_1m_tokens: 0.075,
};

/// OpenAI — the expensive last resort, reserved for complex queries and the
/// tail of every fallback chain.
pub static OPENAI: LlmSpec = LlmSpec {
    name: "openai",
    display_name: "OpenAI",
    default_api_base: "https://api.openai.com/v1",
    default_model: "gpt-4o",
    usd_per_1m_tokens: 30.0,
};

// ─────────────────────────────────────────────
// Wire types (OpenAI chat completions subset)
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

// ─────────────────────────────────────────────
// ChatAdapter
// ─────────────────────────────────────────────

/// Generic adapter for any OpenAI-compatible chat endpoint.
pub struct ChatAdapter {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    spec: &'static LlmSpec,
}

impl std::fmt::Debug for ChatAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatAdapter")
            .field("provider", &self.spec.display_name)
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl ChatAdapter {
    /// Create an adapter from a provider config and vendor spec.
    pub fn new(config: &ProviderConfig, spec: &'static LlmSpec) -> Self {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| spec.default_api_base.to_string());
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| spec.default_model.to_string());

        // Interactive call: the adapter bounds its own external call, the
        // chain and router impose no timeout of their own.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        ChatAdapter {
            client,
            api_base,
            api_key: config.api_key.clone(),
            model,
            spec,
        }
    }

    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }

    fn estimate_cost(&self, total_tokens: u32) -> f64 {
        total_tokens as f64 * self.spec.usd_per_1m_tokens / 1_000_000.0
    }
}

#[async_trait]
impl ProviderAdapter for ChatAdapter {
    type Payload = AiPrompt;
    type Value = AiReply;

    fn name(&self) -> &str {
        self.spec.display_name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn invoke(
        &self,
        payload: &AiPrompt,
    ) -> Result<ProviderResult<AiReply>, ProviderError> {
        let start = Instant::now();

        let mut messages = Vec::with_capacity(2);
        if let Some(context) = &payload.context {
            messages.push(ChatMessage {
                role: "system",
                content: context.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: payload.content.clone(),
        });

        let body = ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: 2048,
            temperature: 0.7,
        };

        debug!(
            provider = self.spec.display_name,
            model = %self.model,
            content_len = payload.content.len(),
            "Calling LLM"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = self.spec.display_name, error = %e, "HTTP request failed");
                ProviderError::Invocation(format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            error!(
                provider = self.spec.display_name,
                status = %status,
                body = %error_text,
                "API error"
            );
            return Err(ProviderError::Invocation(format!("API error {status}")));
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            error!(provider = self.spec.display_name, error = %e, "Failed to parse LLM response");
            ProviderError::Invocation(format!("malformed response: {e}"))
        })?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ProviderError::Invocation("empty completion".to_string()))?;

        let tokens_used = chat.usage.map(|u| u.total_tokens);

        Ok(ProviderResult {
            value: AiReply::new(content),
            provider: self.spec.display_name.to_string(),
            model: self.model.clone(),
            tokens_used,
            cost_usd: tokens_used.map(|t| self.estimate_cost(t)),
            latency: start.elapsed(),
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_config(api_key: &str, api_base: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            api_key: api_key.to_string(),
            api_base: api_base.map(String::from),
            model: None,
        }
    }

    // ── Unit tests ──

    #[test]
    fn test_completions_url_trailing_slash() {
        let config = make_config("key", Some("https://api.deepseek.com/v1/"));
        let adapter = ChatAdapter::new(&config, &DEEPSEEK);
        assert_eq!(
            adapter.completions_url(),
            "https://api.deepseek.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_defaults_from_spec() {
        let config = make_config("key", None);
        let adapter = ChatAdapter::new(&config, &GEMINI);
        assert_eq!(adapter.model(), "gemini-2.0-flash");
        assert_eq!(adapter.name(), "Gemini");
        assert!(adapter.api_base.contains("generativelanguage"));
    }

    #[test]
    fn test_model_override_from_config() {
        let mut config = make_config("key", None);
        config.model = Some("gpt-4o-mini".to_string());
        let adapter = ChatAdapter::new(&config, &OPENAI);
        assert_eq!(adapter.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_cost_estimate_uses_spec_pricing() {
        let adapter = ChatAdapter::new(&make_config("key", None), &DEEPSEEK);
        // 1M tokens at DeepSeek pricing is $0.14.
        assert!((adapter.estimate_cost(1_000_000) - 0.14).abs() < 1e-9);
        assert!((adapter.estimate_cost(10_000) - 0.0014).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unavailable_without_key() {
        let adapter = ChatAdapter::new(&make_config("", None), &OPENAI);
        assert!(!adapter.is_available().await);

        let adapter = ChatAdapter::new(&make_config("sk-1", None), &OPENAI);
        assert!(adapter.is_available().await);
    }

    // ── Integration tests with mock server ──

    #[tokio::test]
    async fn test_invoke_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key-123"))
            .and(body_partial_json(serde_json::json!({
                "model": "deepseek-chat"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-test",
                "choices": [{
                    "message": { "content": "Grilled chicken: ~165 kcal per 100g." },
                    "finish_reason": "stop"
                }],
                "usage": {
                    "prompt_tokens": 20,
                    "completion_tokens": 12,
                    "total_tokens": 32
                }
            })))
            .mount(&mock_server)
            .await;

        let config = make_config("test-key-123", Some(&mock_server.uri()));
        let adapter = ChatAdapter::new(&config, &DEEPSEEK);

        let prompt = AiPrompt::with_context("grilled chicken breast", "Meal photo analysis");
        let result = adapter.invoke(&prompt).await.unwrap();

        assert_eq!(result.value.content, "Grilled chicken: ~165 kcal per 100g.");
        assert_eq!(result.provider, "DeepSeek");
        assert_eq!(result.model, "deepseek-chat");
        assert_eq!(result.tokens_used, Some(32));
        let cost = result.cost_usd.unwrap();
        assert!((cost - 32.0 * 0.14 / 1_000_000.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_invoke_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "Rate limit exceeded" }
            })))
            .mount(&mock_server)
            .await;

        let config = make_config("key", Some(&mock_server.uri()));
        let adapter = ChatAdapter::new(&config, &OPENAI);

        let err = adapter.invoke(&AiPrompt::new("hello")).await.unwrap_err();
        match err {
            ProviderError::Invocation(msg) => assert!(msg.contains("429")),
            other => panic!("expected Invocation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invoke_network_error() {
        // Point to a port that's not listening
        let config = make_config("key", Some("http://127.0.0.1:1"));
        let adapter = ChatAdapter::new(&config, &GEMINI);

        let err = adapter.invoke(&AiPrompt::new("hello")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Invocation(_)));
    }

    #[tokio::test]
    async fn test_invoke_empty_completion_is_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "" } }],
                "usage": null
            })))
            .mount(&mock_server)
            .await;

        let config = make_config("key", Some(&mock_server.uri()));
        let adapter = ChatAdapter::new(&config, &DEEPSEEK);

        let err = adapter.invoke(&AiPrompt::new("hello")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Invocation(_)));
    }

    #[tokio::test]
    async fn test_invoke_without_usage_has_no_cost() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "ok" } }],
                "usage": null
            })))
            .mount(&mock_server)
            .await;

        let config = make_config("key", Some(&mock_server.uri()));
        let adapter = ChatAdapter::new(&config, &OPENAI);

        let result = adapter.invoke(&AiPrompt::new("hello")).await.unwrap();
        assert_eq!(result.tokens_used, None);
        assert_eq!(result.cost_usd, None);
    }
}
