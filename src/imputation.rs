use crate::error::ImputeError;
use crate::json_helper::extract_first_json_object;
use crate::models::config::ExtractionMode;
use crate::models::providers::{ModelConfig, ModelProvider};
use crate::models::ImputationRequest;
use crate::prompts::PromptManager;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Outcome of one imputation. Exactly one branch is ever produced.
#[derive(Debug)]
pub enum ImputationResult {
    Text(String),
    Structured(Map<String, Value>),
    Failed(ImputeError),
}

impl ImputationResult {
    /// The value placed under `imputed_data` when the result is sent as a 200.
    pub fn into_payload(self) -> Value {
        match self {
            ImputationResult::Text(text) => Value::String(text),
            ImputationResult::Structured(map) => Value::Object(map),
            ImputationResult::Failed(err) => json!({ "error": err.to_string() }),
        }
    }
}

pub struct ImputationHandler {
    provider: Arc<dyn ModelProvider>,
    model: ModelConfig,
    prompts: PromptManager,
    mode: ExtractionMode,
    timeout: Duration,
}

impl ImputationHandler {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        model: ModelConfig,
        prompts: PromptManager,
        mode: ExtractionMode,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            model,
            prompts,
            mode,
            timeout,
        }
    }

    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    pub async fn handle(&self, request: &ImputationRequest) -> ImputationResult {
        info!(
            fields = request.all_field_info.len(),
            missing = request.input_data.values().filter(|v| v.is_null()).count(),
            "Starting imputation"
        );

        let messages = match self.prompts.format_imputation(request) {
            Ok(messages) => messages,
            Err(e) => {
                error!(error = %e, "Prompt rendering failed");
                return ImputationResult::Failed(ImputeError::PromptRender(e.to_string()));
            }
        };
        debug!("Rendered prompt: {:?}", messages);

        let call = self.provider.complete(&messages, &self.model);
        let response = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                error!(provider = self.provider.name(), error = %e, "Model invocation failed");
                return ImputationResult::Failed(ImputeError::ModelInvocation(e.to_string()));
            }
            Err(_) => {
                error!(provider = self.provider.name(), "Model invocation timed out");
                return ImputationResult::Failed(ImputeError::Timeout(self.timeout));
            }
        };
        debug!("Raw LLM response:\n{}", response);

        match self.mode {
            ExtractionMode::Raw => ImputationResult::Text(response),
            ExtractionMode::Json => match extract_first_json_object(response.trim()) {
                Ok(map) => {
                    info!("Imputation completed");
                    ImputationResult::Structured(map)
                }
                Err(e) => {
                    warn!(error = %e, "Could not extract JSON from model response");
                    ImputationResult::Failed(ImputeError::ResponseParse(e.to_string()))
                }
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::PromptMessage;
    use async_trait::async_trait;
    use std::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider double: answers with a fixed text, an error, or sleeps.
    pub(crate) struct StubProvider {
        pub answer: Result<String, String>,
        pub delay: Duration,
        pub calls: AtomicUsize,
    }

    impl StubProvider {
        pub(crate) fn answering(text: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(text.to_string()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Err(message.to_string()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok("{}".to_string()),
                delay,
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ModelProvider for StubProvider {
        async fn complete(
            &self,
            _messages: &[PromptMessage],
            _model: &ModelConfig,
        ) -> Result<String, Box<dyn Error + Send + Sync>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.answer.clone().map_err(Into::into)
        }

        fn name(&self) -> &'static str {
            "Stub"
        }
    }

    pub(crate) fn handler(provider: Arc<StubProvider>, mode: ExtractionMode) -> ImputationHandler {
        ImputationHandler::new(
            provider,
            ModelConfig::default(),
            PromptManager::default(),
            mode,
            Duration::from_millis(200),
        )
    }

    fn request() -> ImputationRequest {
        serde_json::from_value(json!({
            "input_data": {"name": "Ana", "age": null},
            "all_field_info": {"name": "string", "age": "integer"},
            "format_instructions": "JSON"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_json_mode_returns_structured_record() {
        let provider = StubProvider::answering(r#"{"name": "Ana", "age": 29}"#);
        let result = handler(provider.clone(), ExtractionMode::Json)
            .handle(&request())
            .await;
        assert_eq!(result.into_payload(), json!({"name": "Ana", "age": 29}));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_json_mode_discards_prose() {
        let provider =
            StubProvider::answering("  Sure! Here is the result: {\"age\": 34, \"city\": \"Paris\"}\n");
        let result = handler(provider, ExtractionMode::Json).handle(&request()).await;
        assert!(matches!(result, ImputationResult::Structured(_)));
        assert_eq!(result.into_payload(), json!({"age": 34, "city": "Paris"}));
    }

    #[tokio::test]
    async fn test_json_mode_without_object_is_error_payload() {
        let provider = StubProvider::answering("I cannot determine this.");
        let result = handler(provider, ExtractionMode::Json).handle(&request()).await;
        assert!(matches!(result, ImputationResult::Failed(ImputeError::ResponseParse(_))));
        let payload = result.into_payload();
        let message = payload["error"].as_str().unwrap();
        assert!(message.starts_with("Failed to parse JSON from LLM response"));
    }

    #[tokio::test]
    async fn test_raw_mode_returns_text_verbatim() {
        let text = "  name: Ana\n  age: 29  ";
        let provider = StubProvider::answering(text);
        let result = handler(provider, ExtractionMode::Raw).handle(&request()).await;
        assert_eq!(result.into_payload(), Value::String(text.to_string()));
    }

    #[tokio::test]
    async fn test_model_failure_becomes_error_payload() {
        let provider = StubProvider::failing("API key not valid");
        let result = handler(provider, ExtractionMode::Json).handle(&request()).await;
        assert!(matches!(result, ImputationResult::Failed(ImputeError::ModelInvocation(_))));
        assert_eq!(result.into_payload(), json!({"error": "API key not valid"}));
    }

    #[tokio::test]
    async fn test_slow_model_times_out() {
        let provider = StubProvider::slow(Duration::from_secs(5));
        let result = handler(provider, ExtractionMode::Json).handle(&request()).await;
        assert!(matches!(result, ImputationResult::Failed(ImputeError::Timeout(_))));
        let payload = result.into_payload();
        assert!(payload["error"].as_str().unwrap().contains("timed out"));
    }
}
