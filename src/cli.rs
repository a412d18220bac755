// src/cli.rs
use clap::Parser;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use crate::imputation::ImputationHandler;
use crate::models::config::ExtractionMode;
use crate::models::providers::ProviderKind;
use crate::models::{ImputationRequest, ImputeResponse};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// JSON request file to impute once (if not provided, starts the HTTP server)
    pub input: Option<PathBuf>,

    /// Configuration file
    #[arg(long, default_value = "config.yaml", value_name = "PATH")]
    pub config: PathBuf,

    /// Override the configured LLM provider
    #[arg(long, value_enum, value_name = "TYPE")]
    pub provider: Option<ProviderKind>,

    /// Override how the model answer is returned
    #[arg(long, value_enum, value_name = "MODE")]
    pub mode: Option<ExtractionMode>,

    /// Maximum log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    pub log_level: Level,
}

pub async fn read_request(path: &Path) -> Result<ImputationRequest, Box<dyn Error + Send + Sync>> {
    let raw = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&raw)
        .map_err(|e| format!("Invalid request in {}: {}", path.display(), e).into())
}

pub async fn handle_cli(
    input: &Path,
    handler: &ImputationHandler,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let request = read_request(input).await?;
    info!("Imputing request from {}", input.display());

    let result = handler.handle(&request).await;
    let response = ImputeResponse {
        imputed_data: result.into_payload(),
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_input_means_server() {
        let cli = Cli::parse_from(["imputer"]);
        assert!(cli.input.is_none());
        assert_eq!(cli.config, PathBuf::from("config.yaml"));
        assert!(cli.provider.is_none());
        assert_eq!(cli.log_level, Level::INFO);
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "imputer",
            "record.json",
            "--provider",
            "ollama",
            "--mode",
            "raw",
        ]);
        assert_eq!(cli.input, Some(PathBuf::from("record.json")));
        assert_eq!(cli.provider, Some(ProviderKind::Ollama));
        assert_eq!(cli.mode, Some(ExtractionMode::Raw));
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        assert!(Cli::try_parse_from(["imputer", "--provider", "openai"]).is_err());
    }

    #[tokio::test]
    async fn test_read_request_reports_path() {
        let path = std::env::temp_dir().join("imputer-cli-invalid-request.json");
        tokio::fs::write(&path, r#"{"input_data": {}}"#).await.unwrap();
        let err = read_request(&path).await.unwrap_err();
        assert!(err.to_string().contains("imputer-cli-invalid-request.json"));
        tokio::fs::remove_file(&path).await.ok();
    }
}
