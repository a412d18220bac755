use super::{
    check_status, http_client, ModelConfig, ModelProvider, ProviderConfig, ProviderKind,
    ProviderSelector,
};
use crate::models::{PromptMessage, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info};

const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

pub struct OllamaProvider {
    client: reqwest::Client,
    host: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: Options,
}

#[derive(Serialize)]
struct ChatMessage {
    role: Role,
    content: String,
}

#[derive(Serialize)]
struct Options {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: String,
}

impl OllamaProvider {
    pub fn new(
        config: &ProviderConfig,
        timeout: Duration,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(Self {
            client: http_client(timeout)?,
            host: config
                .host
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string()),
        })
    }
}

fn build_request(messages: &[PromptMessage], config: &ModelConfig) -> ChatRequest {
    ChatRequest {
        model: ProviderSelector::get_model_name(config, ProviderKind::Ollama),
        messages: messages
            .iter()
            .map(|m| ChatMessage {
                role: m.role,
                content: m.content.clone(),
            })
            .collect(),
        stream: false,
        options: Options {
            temperature: config.temperature,
            num_predict: config.max_tokens,
        },
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        config: &ModelConfig,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        let request = build_request(messages, config);

        debug!("Sending request to Ollama API with model {}", request.model);
        let response = self
            .client
            .post(format!("{}/api/chat", self.host.trim_end_matches('/')))
            .json(&request)
            .send()
            .await?;
        let response = check_status(self.name(), response).await?;

        let response_obj = response.json::<ChatResponse>().await?;

        if response_obj.message.content.trim().is_empty() {
            error!("Received empty response from Ollama");
            return Err("Empty response from Ollama".into());
        }

        info!("Successfully received response from Ollama");
        Ok(response_obj.message.content)
    }

    fn name(&self) -> &'static str {
        "Ollama"
    }
}
