use super::{ModelConfig, ProviderKind};

pub struct ProviderSelector;

impl ProviderSelector {
    pub fn default_model(kind: ProviderKind) -> &'static str {
        match kind {
            ProviderKind::Gemini => "gemini-1.5-flash",
            ProviderKind::Claude => "claude-3-5-haiku-latest",
            ProviderKind::Ollama => "llama3.1",
        }
    }

    pub fn default_api_key_env(kind: ProviderKind) -> Option<&'static str> {
        match kind {
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::Claude => Some("ANTHROPIC_API_KEY"),
            ProviderKind::Ollama => None,
        }
    }

    // Configured name wins, otherwise the provider default
    pub fn get_model_name(config: &ModelConfig, kind: ProviderKind) -> String {
        if config.name.trim().is_empty() {
            Self::default_model(kind).to_string()
        } else {
            config.name.trim().to_string()
        }
    }
}
