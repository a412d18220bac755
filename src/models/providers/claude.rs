// src/models/providers/claude.rs

use super::{
    check_status, http_client, ModelConfig, ModelProvider, ProviderConfig, ProviderKind,
    ProviderSelector,
};
use crate::models::{joined_content, PromptMessage, Role};
use async_trait::async_trait;
use serde::Serialize;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, info};

const CLAUDE_API_BASE_URL: &str = "https://api.anthropic.com";

pub struct ClaudeProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    system: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

impl ClaudeProvider {
    pub fn new(
        config: &ProviderConfig,
        timeout: Duration,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let api_key = config
            .api_key
            .clone()
            .ok_or("Claude API key not set (ANTHROPIC_API_KEY)")?;
        Ok(Self {
            client: http_client(timeout)?,
            base_url: config
                .host
                .clone()
                .unwrap_or_else(|| CLAUDE_API_BASE_URL.to_string()),
            api_key,
        })
    }
}

fn build_request(messages: &[PromptMessage], config: &ModelConfig) -> ClaudeRequest {
    ClaudeRequest {
        model: ProviderSelector::get_model_name(config, ProviderKind::Claude),
        system: joined_content(messages, Role::System),
        messages: vec![Message {
            role: "user".to_string(),
            content: joined_content(messages, Role::User),
        }],
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    }
}

fn response_text(response_json: &serde_json::Value) -> Result<String, Box<dyn Error + Send + Sync>> {
    let content = response_json["content"][0]["text"]
        .as_str()
        .ok_or("Invalid response format from Claude API")?;
    if content.trim().is_empty() {
        return Err("Empty response from Claude".into());
    }
    Ok(content.to_string())
}

#[async_trait]
impl ModelProvider for ClaudeProvider {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        config: &ModelConfig,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        let request = build_request(messages, config);
        debug!("Generating response with Claude model {}", request.model);

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url.trim_end_matches('/')))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await?;
        let response = check_status(self.name(), response).await?;

        let response_json: serde_json::Value = response.json().await?;
        let content = response_text(&response_json)?;

        info!("Successfully received response from Claude API");
        Ok(content)
    }

    fn name(&self) -> &'static str {
        "Claude"
    }
}
