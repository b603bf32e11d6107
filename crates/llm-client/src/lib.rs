pub mod anthropic;
pub mod error;
pub mod gemini;
pub mod json;
pub mod provider;

pub use anthropic::AnthropicClient;
pub use error::{LlmError, LlmResult};
pub use gemini::GeminiClient;
pub use json::{extract_json_object, parse_json_reply};
pub use provider::{generate_with_timeout, TextGenerator};

use std::sync::Arc;
use std::time::Duration;

/// Per-request model timeout when `LLM_TIMEOUT_SECS` is unset
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Which hosted model family to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProviderKind {
    Gemini,
    Anthropic,
}

impl LlmProviderKind {
    fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "gemini" | "google" => Some(Self::Gemini),
            "anthropic" | "claude" => Some(Self::Anthropic),
            _ => None,
        }
    }

    fn key_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-1.5-flash",
            Self::Anthropic => "claude-3-5-haiku-latest",
        }
    }
}

/// Configuration for the text-generation collaborator
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl LlmConfig {
    pub fn new(provider: LlmProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: provider.default_model().to_string(),
            base_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read config from the process environment.
    ///
    /// Returns `None` when the selected provider has no API key, which callers
    /// treat as "run without a model".
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`LlmConfig::from_env`] but with an injectable variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match lookup("LLM_PROVIDER") {
            Some(name) => match LlmProviderKind::parse(&name) {
                Some(kind) => kind,
                None => {
                    tracing::warn!("Unknown LLM_PROVIDER '{}', running without a model", name);
                    return None;
                }
            },
            None => LlmProviderKind::Gemini,
        };

        let api_key = lookup(provider.key_var()).filter(|k| !k.trim().is_empty());
        let Some(api_key) = api_key else {
            tracing::warn!("{} not found, AI features will be limited", provider.key_var());
            return None;
        };

        let timeout = lookup("LLM_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Some(Self {
            provider,
            api_key,
            model: lookup("LLM_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            base_url: lookup("LLM_BASE_URL"),
            timeout: Duration::from_secs(timeout),
        })
    }
}

/// Build the HTTP-backed generator for a config
pub fn build_generator(config: &LlmConfig) -> LlmResult<Arc<dyn TextGenerator>> {
    let generator: Arc<dyn TextGenerator> = match config.provider {
        LlmProviderKind::Gemini => Arc::new(GeminiClient::from_config(config)?),
        LlmProviderKind::Anthropic => Arc::new(AnthropicClient::from_config(config)?),
    };
    tracing::debug!("Using {} text generator ({})", generator.backend_name(), config.model);
    Ok(generator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_to_gemini() {
        let config = LlmConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "abc")])).unwrap();
        assert_eq!(config.provider, LlmProviderKind::Gemini);
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_missing_key_disables_model() {
        assert!(LlmConfig::from_lookup(lookup_from(&[])).is_none());
        assert!(LlmConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "  ")])).is_none());
        // Key for the wrong provider doesn't count
        assert!(LlmConfig::from_lookup(lookup_from(&[
            ("LLM_PROVIDER", "anthropic"),
            ("GEMINI_API_KEY", "abc"),
        ]))
        .is_none());
    }

    #[test]
    fn test_anthropic_overrides() {
        let config = LlmConfig::from_lookup(lookup_from(&[
            ("LLM_PROVIDER", "Claude"),
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("LLM_MODEL", "claude-sonnet-4-20250514"),
            ("LLM_TIMEOUT_SECS", "3"),
            ("LLM_BASE_URL", "http://localhost:9000"),
        ]))
        .unwrap();
        assert_eq!(config.provider, LlmProviderKind::Anthropic);
        assert_eq!(config.model, "claude-sonnet-4-20250514");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn test_bad_timeout_falls_back_to_default() {
        let config = LlmConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "abc"),
            ("LLM_TIMEOUT_SECS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_unknown_provider() {
        assert!(LlmConfig::from_lookup(lookup_from(&[
            ("LLM_PROVIDER", "mystery"),
            ("GEMINI_API_KEY", "abc"),
        ]))
        .is_none());
    }
}
