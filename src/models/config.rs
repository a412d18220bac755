use crate::models::providers::{ModelConfig, ProviderConfig, ProviderKind};
use clap::ValueEnum;
use serde::Deserialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_timeout_secs() -> u64 {
    60
}

/// How the model's answer is turned into `imputed_data`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[clap(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Return the model text verbatim
    Raw,
    /// Parse the first JSON object out of the model text
    #[default]
    Json,
}

/// Where a failed or timed-out model call is reported.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// 200 with `{"error": ...}` inside `imputed_data`
    #[default]
    Embed,
    /// 502 for provider failures, 504 for timeouts
    BadGateway,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImputationConfig {
    #[serde(default)]
    pub mode: ExtractionMode,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub on_model_failure: FailurePolicy,
    pub prompts_file: Option<PathBuf>,
}

impl Default for ImputationConfig {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::default(),
            timeout_secs: default_timeout_secs(),
            on_model_failure: FailurePolicy::default(),
            prompts_file: None,
        }
    }
}

impl ImputationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub imputation: ImputationConfig,
}

impl Config {
    pub fn from_yaml(raw: &str) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Applies `IMPUTER_HOST` / `IMPUTER_PORT` and resolves the provider credential.
    pub fn apply_env(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if let Ok(host) = std::env::var("IMPUTER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("IMPUTER_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| format!("Invalid IMPUTER_PORT '{}': {}", port, e))?;
        }
        self.provider.resolve_api_key();
        Ok(())
    }

    /// Switches to another provider. A model name picked for the old provider is dropped.
    pub fn override_provider(&mut self, kind: ProviderKind) {
        if self.provider.kind != kind {
            self.model.name.clear();
            self.provider.host = None;
        }
        self.provider.kind = kind;
        self.provider.api_key_env = None;
        self.provider.resolve_api_key();
    }

    pub fn validate(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        if self.imputation.timeout_secs == 0 {
            return Err("imputation.timeout_secs must be greater than 0".into());
        }
        Ok(())
    }
}

pub async fn load_config(path: &Path) -> Result<Config, Box<dyn Error + Send + Sync>> {
    let mut config = if tokio::fs::try_exists(path).await? {
        let config_str = tokio::fs::read_to_string(path).await?;
        debug!("Config file content length: {}", config_str.len());
        Config::from_yaml(&config_str)?
    } else {
        warn!("Config file {} not found, using defaults", path.display());
        Config::from_yaml("{}")?
    };

    config.apply_env()?;
    config.validate()?;

    info!(
        provider = ?config.provider.kind,
        mode = ?config.imputation.mode,
        timeout_secs = config.imputation.timeout_secs,
        "Configuration loaded"
    );
    Ok(config)
}
