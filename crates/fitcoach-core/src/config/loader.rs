//! Config loader — reads a JSON config file and merges env var overrides.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file (`FITCOACH_CONFIG` or `./config.json`)
//! 3. Environment variables `FITCOACH_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::{Config, ProviderConfig};

/// Default config file path: `$FITCOACH_CONFIG` or `./config.json`.
pub fn get_config_path() -> PathBuf {
    std::env::var("FITCOACH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.json"))
}

/// Load configuration from the given path (or the default) + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be
/// parsed — a missing config is not a startup failure.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    load_config_from_path(&config_path)
}

fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `FITCOACH_<SECTION>__<FIELD>` (double underscore as
/// delimiter).
///
/// Supported overrides:
/// - `FITCOACH_AI__<NAME>__API_KEY` → `ai.<name>.api_key`
/// - `FITCOACH_AI__<NAME>__API_BASE` → `ai.<name>.api_base`
/// - `FITCOACH_AI__<NAME>__MODEL` → `ai.<name>.model`
/// - `FITCOACH_NUTRITION__<NAME>__API_KEY` / `__API_BASE`
/// - `FITCOACH_CACHE__URL` → `cache.url`
fn apply_env_overrides(mut config: Config) -> Config {
    apply_provider_env(&mut config.ai.deepseek, "AI", "DEEPSEEK");
    apply_provider_env(&mut config.ai.gemini, "AI", "GEMINI");
    apply_provider_env(&mut config.ai.openai, "AI", "OPENAI");
    apply_provider_env(&mut config.nutrition.fatsecret, "NUTRITION", "FATSECRET");
    apply_provider_env(&mut config.nutrition.usda, "NUTRITION", "USDA");

    if let Ok(val) = std::env::var("FITCOACH_CACHE__URL") {
        config.cache.url = Some(val);
    }

    config
}

fn apply_provider_env(provider: &mut ProviderConfig, section: &str, name: &str) {
    if let Ok(val) = std::env::var(format!("FITCOACH_{section}__{name}__API_KEY")) {
        provider.api_key = val;
    }
    if let Ok(val) = std::env::var(format!("FITCOACH_{section}__{name}__API_BASE")) {
        provider.api_base = Some(val);
    }
    if let Ok(val) = std::env::var(format!("FITCOACH_{section}__{name}__MODEL")) {
        provider.model = Some(val);
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_missing_file() {
        let config = load_config_from_path(Path::new("/nonexistent/path/config.json"));
        assert!(!config.ai.deepseek.is_configured());
        assert!(config.cache.url.is_none());
    }

    #[test]
    fn test_load_valid_json() {
        let file = write_temp_json(
            r#"{
                "ai": {
                    "deepseek": { "apiKey": "ds-123" },
                    "openai": { "apiKey": "sk-456", "model": "gpt-4o-mini" }
                },
                "nutrition": {
                    "usda": { "apiKey": "usda-789" }
                }
            }"#,
        );

        let config = load_config_from_path(file.path());
        assert_eq!(config.ai.deepseek.api_key, "ds-123");
        assert_eq!(config.ai.openai.model.as_deref(), Some("gpt-4o-mini"));
        assert!(config.nutrition.usda.is_configured());
        // Untouched sections keep defaults
        assert!(!config.ai.gemini.is_configured());
    }

    #[test]
    fn test_load_invalid_json_returns_defaults() {
        let file = write_temp_json("not valid json {{{");
        let config = load_config_from_path(file.path());
        assert!(!config.ai.openai.is_configured());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.ai.gemini.api_key = "gm-test".to_string();
        config.cache.url = Some("redis://localhost:6379".to_string());

        save_config(&config, Some(&path)).unwrap();

        let reloaded = load_config_from_path(&path);
        assert_eq!(reloaded.ai.gemini.api_key, "gm-test");
        assert_eq!(reloaded.cache.url.as_deref(), Some("redis://localhost:6379"));
    }

    #[test]
    fn test_env_override_provider_key() {
        std::env::set_var("FITCOACH_AI__DEEPSEEK__API_KEY", "ds-env");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.ai.deepseek.api_key, "ds-env");
        std::env::remove_var("FITCOACH_AI__DEEPSEEK__API_KEY");
    }

    #[test]
    fn test_env_override_cache_url() {
        std::env::set_var("FITCOACH_CACHE__URL", "redis://cache:6379");
        let config = apply_env_overrides(Config::default());
        assert_eq!(config.cache.url.as_deref(), Some("redis://cache:6379"));
        std::env::remove_var("FITCOACH_CACHE__URL");
    }

    #[test]
    fn test_saved_json_uses_camel_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.nutrition.fatsecret.api_base = Some("https://platform.fatsecret.com".to_string());
        save_config(&config, Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert!(raw["nutrition"]["fatsecret"].get("apiBase").is_some());
        assert!(raw["nutrition"]["fatsecret"].get("api_base").is_none());
    }
}
