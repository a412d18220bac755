use crate::error::ApiError;
use crate::imputation::{ImputationHandler, ImputationResult};
use crate::models::config::FailurePolicy;
use crate::models::{ImputationRequest, ImputeResponse};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use http::HeaderMap;
use std::sync::Arc;
use tracing::Instrument;

#[derive(Clone)]
pub struct ImputeService {
    pub handler: Arc<ImputationHandler>,
    pub on_model_failure: FailurePolicy,
}

impl ImputeService {
    pub fn new(handler: ImputationHandler, on_model_failure: FailurePolicy) -> Self {
        Self {
            handler: Arc::new(handler),
            on_model_failure,
        }
    }

    // Helper function to extract client_id from headers
    fn get_client_id(headers: &HeaderMap) -> String {
        headers
            .get("client-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown-client")
            .to_string()
    }

    /// Picks the response for a handler outcome under the configured failure policy.
    pub fn respond(&self, result: ImputationResult) -> Result<ImputeResponse, ApiError> {
        match (result, self.on_model_failure) {
            (ImputationResult::Failed(err), FailurePolicy::BadGateway) if !err.is_parse() => {
                Err(err.into())
            }
            (result, _) => Ok(ImputeResponse {
                imputed_data: result.into_payload(),
            }),
        }
    }
}

/// `POST /api/impute`
pub async fn impute(
    State(service): State<ImputeService>,
    headers: HeaderMap,
    payload: Result<Json<ImputationRequest>, JsonRejection>,
) -> Result<Json<ImputeResponse>, ApiError> {
    let client_id = ImputeService::get_client_id(&headers);

    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(client_id = %client_id, error = %rejection.body_text(), "Rejected imputation request");
        ApiError::Validation(rejection.body_text())
    })?;

    let span = tracing::info_span!("impute", client_id = %client_id);
    let result = service.handler.handle(&request).instrument(span).await;

    if let ImputationResult::Failed(err) = &result {
        tracing::error!(client_id = %client_id, error = %err, "Imputation failed");
    } else {
        tracing::info!(client_id = %client_id, "Sending response");
    }

    service.respond(result).map(Json)
}
