//! Configuration schema.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! A provider with an empty API key is not an error — it is simply
//! unavailable and its chain position is skipped at request time.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub ai: AiProvidersConfig,
    pub nutrition: NutritionProvidersConfig,
    pub cache: CacheConfig,
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Connection settings for a single external backend.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for authentication.
    #[serde(default)]
    pub api_key: String,
    /// Custom API base URL (overrides the backend default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Model identifier override (AI backends only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ProviderConfig {
    /// Whether this backend has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// LLM backends, one slot per provider in the routing chains.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiProvidersConfig {
    #[serde(default)]
    pub deepseek: ProviderConfig,
    #[serde(default)]
    pub gemini: ProviderConfig,
    #[serde(default)]
    pub openai: ProviderConfig,
}

/// Nutrition data backends. The built-in food table needs no configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NutritionProvidersConfig {
    #[serde(default)]
    pub fatsecret: ProviderConfig,
    #[serde(default)]
    pub usda: ProviderConfig,
}

// ─────────────────────────────────────────────
// Cache
// ─────────────────────────────────────────────

/// Cache backend settings. No URL means no cache — a valid deployment mode.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheConfig {
    /// Redis URL (e.g. `redis://127.0.0.1:6379`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_no_providers() {
        let config = Config::default();
        assert!(!config.ai.deepseek.is_configured());
        assert!(!config.ai.gemini.is_configured());
        assert!(!config.nutrition.fatsecret.is_configured());
        assert!(config.cache.url.is_none());
    }

    #[test]
    fn test_provider_configured_by_key() {
        let provider = ProviderConfig {
            api_key: "sk-test".to_string(),
            ..Default::default()
        };
        assert!(provider.is_configured());
    }

    #[test]
    fn test_camel_case_keys() {
        let config: Config = serde_json::from_str(
            r#"{
                "ai": { "deepseek": { "apiKey": "ds-1", "apiBase": "https://proxy.io/v1" } },
                "cache": { "url": "redis://localhost" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.ai.deepseek.api_key, "ds-1");
        assert_eq!(config.ai.deepseek.api_base.as_deref(), Some("https://proxy.io/v1"));
        assert_eq!(config.cache.url.as_deref(), Some("redis://localhost"));
    }
}
