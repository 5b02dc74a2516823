use super::app_error::{AppError, ErrorResponse};
use super::state::HttpServerState;
use axum::Json;
use axum::extract::State;

/// List every sensor that has reported at least once.
#[utoipa::path(
    get,
    path = "/api/sensors",
    tag = "Tilted",
    responses(
        (status = 200, description = "Sensor identifiers in ascending order", body = Vec<String>),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    )
)]
pub async fn list_sensors(
    State(state): State<HttpServerState>,
) -> Result<Json<Vec<String>>, AppError> {
    let sensor_ids = state.storage.list_sensors().await?;
    Ok(Json(sensor_ids))
}
