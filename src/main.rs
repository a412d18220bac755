mod cli;
mod error;
mod http_server;
mod imputation;
mod impute_service;
mod json_helper;
mod models;
mod prompts;

use clap::Parser;
use cli::{handle_cli, Cli};
use imputation::ImputationHandler;
use impute_service::ImputeService;
use models::config::load_config;
use models::providers::create_provider;
use prompts::PromptManager;
use std::error::Error;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .init();

    info!("Starting application");

    let mut config = load_config(&cli.config).await?;

    if let Some(kind) = cli.provider {
        config.override_provider(kind);
    }
    if let Some(mode) = cli.mode {
        config.imputation.mode = mode;
    }

    let prompts = match &config.imputation.prompts_file {
        Some(path) => PromptManager::from_file(path).await?,
        None => PromptManager::default(),
    };

    let timeout = config.imputation.timeout();
    let provider = create_provider(&config.provider, timeout)?;
    let handler = ImputationHandler::new(
        provider,
        config.model.clone(),
        prompts,
        config.imputation.mode,
        timeout,
    );
    info!(mode = ?handler.mode(), "Imputation handler ready");

    match cli.input {
        Some(input) => handle_cli(&input, &handler).await,
        None => {
            let service = ImputeService::new(handler, config.imputation.on_model_failure);
            http_server::start_impute_http_server(&config.server.addr(), service).await
        }
    }
}
