// src/models/providers/gemini.rs

use super::{
    check_status, http_client, ModelConfig, ModelProvider, ProviderConfig, ProviderKind,
    ProviderSelector,
};
use crate::models::{joined_content, PromptMessage, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;
use tracing::{debug, info};

const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback", default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
    #[serde(rename = "finishReason", default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason", default)]
    block_reason: Option<String>,
}

impl GeminiProvider {
    pub fn new(
        config: &ProviderConfig,
        timeout: Duration,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let api_key = config
            .api_key
            .clone()
            .ok_or("Gemini API key not set (GEMINI_API_KEY)")?;
        Ok(Self {
            client: http_client(timeout)?,
            base_url: config
                .host
                .clone()
                .unwrap_or_else(|| GEMINI_API_BASE_URL.to_string()),
            api_key,
        })
    }
}

fn build_request(messages: &[PromptMessage], config: &ModelConfig) -> GenerateContentRequest {
    let system = joined_content(messages, Role::System);
    GenerateContentRequest {
        system_instruction: (!system.is_empty()).then(|| Content {
            role: None,
            parts: vec![Part { text: Some(system) }],
        }),
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(joined_content(messages, Role::User)),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: config.temperature,
            max_output_tokens: config.max_tokens,
        },
    }
}

fn response_text(response: GenerateContentResponse) -> Result<String, Box<dyn Error + Send + Sync>> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(format!("Gemini blocked the prompt: {}", reason).into());
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or("Gemini returned no candidates")?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        return Err(format!("Empty response from Gemini (finish reason: {})", reason).into());
    }
    Ok(text)
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        config: &ModelConfig,
    ) -> Result<String, Box<dyn Error + Send + Sync>> {
        let model_name = ProviderSelector::get_model_name(config, ProviderKind::Gemini);
        debug!("Generating response with Gemini model {}", model_name);

        let request = build_request(messages, config);
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model_name
        );

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;
        let response = check_status(self.name(), response).await?;

        let text = response_text(response.json::<GenerateContentResponse>().await?)?;
        info!("Successfully received response from Gemini API");
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "Gemini"
    }
}
