use super::state::HttpServerState;
use crate::datamodel::now_millis;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "ok")]
    pub storage: String,
    /// Server time in Unix milliseconds.
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health check
///
/// Reports whether the storage backend answers.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service and storage are healthy", body = HealthResponse),
        (status = 503, description = "Storage is unavailable", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<HttpServerState>) -> impl IntoResponse {
    let timestamp = now_millis().unwrap_or_default();
    match state.storage.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                storage: "ok".to_string(),
                timestamp,
                error: None,
            }),
        ),
        Err(e) => {
            warn!("Storage health check failed: {:#}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable".to_string(),
                    storage: "error".to_string(),
                    timestamp,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
