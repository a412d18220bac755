use crate::impute_service::{impute, ImputeService};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::error::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(service: ImputeService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any)
        .expose_headers(Any);

    Router::new()
        .route("/api/impute", post(impute))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service)
}

pub async fn start_impute_http_server(
    addr: &str,
    service: ImputeService,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!("Port already in use. Please stop other instances first.");
            }
            return Err(e.into());
        }
    };
    info!("Starting imputation HTTP server on {}", listener.local_addr()?);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down imputation server...");
        })
        .await?;
    Ok(())
}
