use super::app_error::{AppError, ErrorResponse};
use super::state::HttpServerState;
use crate::datamodel::{
    DataPoint, MILLISECONDS_PER_HOUR, SensorData, SensorReading, TimeWindow, now_millis,
};
use anyhow::{Context, Result, anyhow};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    #[schema(example = "success")]
    pub status: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReadingsQuery {
    /// Lookback window in hours, 24 by default.
    #[param(value_type = Option<u32>)]
    pub hours: Option<String>,
    /// Window start in Unix milliseconds. Takes precedence over `hours`.
    #[param(value_type = Option<i64>)]
    pub start_time: Option<String>,
    /// Window end in Unix milliseconds, now by default.
    #[param(value_type = Option<i64>)]
    pub end_time: Option<String>,
}

/// How a readings query selects its time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRequest {
    LastHours(u32),
    Explicit(TimeWindow),
}

impl ReadingsQuery {
    pub fn window_request(
        &self,
        now_ms: i64,
        default_hours: u32,
        max_hours: u32,
    ) -> Result<WindowRequest> {
        if let Some(start_time) = &self.start_time {
            let start_ms = parse_millis(start_time, "startTime")?;
            let end_ms = match &self.end_time {
                Some(end_time) => parse_millis(end_time, "endTime")?,
                None => now_ms,
            };
            let window = TimeWindow::new(start_ms, end_ms)
                .map_err(|_| anyhow!("startTime must not be after endTime"))?;
            if window.duration_ms() > i64::from(max_hours) * MILLISECONDS_PER_HOUR {
                return Err(anyhow!("Time range must not exceed {} hours", max_hours));
            }
            return Ok(WindowRequest::Explicit(window));
        }
        if self.end_time.is_some() {
            return Err(anyhow!("endTime requires startTime"));
        }

        let hours = match &self.hours {
            Some(hours) => hours
                .trim()
                .parse::<u32>()
                .map_err(|_| anyhow!("Invalid hours parameter"))?,
            None => default_hours,
        };
        if hours > max_hours {
            return Err(anyhow!("hours must not exceed {}", max_hours));
        }
        Ok(WindowRequest::LastHours(hours))
    }
}

fn parse_millis(value: &str, name: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| anyhow!("Invalid {} parameter", name))
}

/// History of one sensor, as consumed by the web frontend.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SensorDataResponse {
    pub sensor_id: String,
    /// Empty when the window holds no readings.
    pub gateway_id: String,
    pub gateway_name: String,
    pub data_points: Vec<DataPoint>,
}

impl From<SensorData> for SensorDataResponse {
    fn from(data: SensorData) -> Self {
        let (gateway_id, gateway_name) = match data.gateway {
            Some(gateway) => (gateway.id, gateway.name),
            None => (String::new(), String::new()),
        };
        Self {
            sensor_id: data.sensor_id,
            gateway_id,
            gateway_name,
            data_points: data.data_points,
        }
    }
}

/// Store a reading relayed by a gateway.
///
/// The timestamp is assigned by the server.
#[utoipa::path(
    post,
    path = "/api/readings",
    tag = "Tilted",
    request_body = SensorReading,
    responses(
        (status = 200, description = "Reading stored", body = StatusResponse),
        (status = 400, description = "Bad Request", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    )
)]
pub async fn publish_reading(
    State(state): State<HttpServerState>,
    payload: Result<Json<SensorReading>, JsonRejection>,
) -> Result<Json<StatusResponse>, AppError> {
    let Json(payload) = payload.map_err(|rejection| {
        AppError::bad_request(anyhow!("Invalid request format: {}", rejection.body_text()))
    })?;
    payload.validate().map_err(AppError::BadRequest)?;

    let gateway = payload.gateway();
    let reading = &payload.reading;
    info!(
        gateway = %gateway,
        sensor_id = %reading.sensor_id,
        gravity = reading.gravity,
        tilt = reading.tilt,
        temp = reading.temp,
        "Received reading"
    );

    state
        .storage
        .record(reading, &gateway)
        .await
        .with_context(|| format!("Failed to store reading of {}", reading.sensor_id))?;

    Ok(Json(StatusResponse {
        status: "success".to_string(),
    }))
}

/// Readings of one sensor over a time window, ascending by timestamp.
#[utoipa::path(
    get,
    path = "/api/readings/{sensor_id}",
    tag = "Tilted",
    params(
        ("sensor_id" = String, Path, description = "Sensor identifier"),
        ReadingsQuery,
    ),
    responses(
        (status = 200, description = "Sensor history", body = SensorDataResponse),
        (status = 400, description = "Bad Request", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse),
    )
)]
pub async fn get_sensor_readings(
    State(state): State<HttpServerState>,
    Path(sensor_id): Path<String>,
    Query(query): Query<ReadingsQuery>,
) -> Result<Json<SensorDataResponse>, AppError> {
    if sensor_id.trim().is_empty() {
        return Err(AppError::bad_request(anyhow!("Sensor ID is required")));
    }

    let now_ms = now_millis()?;
    let request = query
        .window_request(now_ms, state.default_window_hours, state.max_window_hours)
        .map_err(AppError::BadRequest)?;

    let sensor_data = match request {
        WindowRequest::LastHours(hours) => state.storage.query(&sensor_id, hours).await,
        WindowRequest::Explicit(window) => state.storage.query_readings(&sensor_id, window).await,
    }
    .with_context(|| format!("Failed to query readings of {}", sensor_id))?;

    Ok(Json(sensor_data.into()))
}
