// src/models/providers/mod.rs

use crate::models::PromptMessage;
use async_trait::async_trait;
use clap::ValueEnum;
use serde::Deserialize;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub mod claude;
pub mod gemini;
pub mod ollama;
mod selector;

pub use selector::ProviderSelector;

#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Sends the messages as one non-streamed completion and returns the answer text.
    async fn complete(
        &self,
        messages: &[PromptMessage],
        model: &ModelConfig,
    ) -> Result<String, Box<dyn Error + Send + Sync>>;

    fn name(&self) -> &'static str;
}

#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[clap(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini API (requires GEMINI_API_KEY)
    #[default]
    Gemini,
    /// Anthropic Claude API (requires ANTHROPIC_API_KEY)
    Claude,
    /// Self-hosted Ollama
    Ollama,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    /// Base URL override; required in practice only for Ollama.
    pub host: Option<String>,
    /// Name of the environment variable holding the credential.
    pub api_key_env: Option<String>,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl ProviderConfig {
    pub fn resolve_api_key(&mut self) {
        let var = self
            .api_key_env
            .clone()
            .or_else(|| ProviderSelector::default_api_key_env(self.kind).map(str::to_string));
        self.api_key = var
            .and_then(|name| std::env::var(name).ok())
            .filter(|key| !key.trim().is_empty());
    }
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Falls back to the provider default when empty.
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

pub fn create_provider(
    config: &ProviderConfig,
    timeout: Duration,
) -> Result<Arc<dyn ModelProvider>, Box<dyn Error + Send + Sync>> {
    let provider: Arc<dyn ModelProvider> = match config.kind {
        ProviderKind::Gemini => Arc::new(gemini::GeminiProvider::new(config, timeout)?),
        ProviderKind::Claude => Arc::new(claude::ClaudeProvider::new(config, timeout)?),
        ProviderKind::Ollama => Arc::new(ollama::OllamaProvider::new(config, timeout)?),
    };
    info!("Using {} provider", provider.name());
    Ok(provider)
}

/// Builds the shared HTTP client every provider uses.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// Turns a non-success response into an error carrying status and body.
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, Box<dyn Error + Send + Sync>> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::error!(%status, "{} request failed", provider);
    Err(format!("{} request failed with status {}: {}", provider, status, body.trim()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_providers_need_a_key() {
        for kind in [ProviderKind::Gemini, ProviderKind::Claude] {
            let config = ProviderConfig {
                kind,
                ..Default::default()
            };
            let err = create_provider(&config, Duration::from_secs(1))
                .err()
                .expect("provider without key must fail");
            assert!(err.to_string().contains("API key"));
        }
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let config = ProviderConfig {
            kind: ProviderKind::Ollama,
            ..Default::default()
        };
        let provider = create_provider(&config, Duration::from_secs(1)).unwrap();
        assert_eq!(provider.name(), "Ollama");
    }

    #[test]
    fn test_resolve_api_key_from_custom_var() {
        std::env::set_var("IMPUTER_TEST_CUSTOM_KEY", "secret");
        let mut config = ProviderConfig {
            kind: ProviderKind::Claude,
            api_key_env: Some("IMPUTER_TEST_CUSTOM_KEY".to_string()),
            ..Default::default()
        };
        config.resolve_api_key();
        assert_eq!(config.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        std::env::set_var("IMPUTER_TEST_BLANK_KEY", "  ");
        let mut config = ProviderConfig {
            kind: ProviderKind::Gemini,
            api_key_env: Some("IMPUTER_TEST_BLANK_KEY".to_string()),
            ..Default::default()
        };
        config.resolve_api_key();
        assert!(config.api_key.is_none());
    }
}
