use super::exposition::{SENSOR_ID_LABEL, format_reading, range_selector};
use super::fields::Field;
use super::merge::merge_field_series;
use super::query_response::{FieldSeries, LabelValuesResponse, QueryResponse, decode_field_series};
use crate::datamodel::{Gateway, Reading, SensorData, TimeWindow};
use crate::storage::{StorageError, StorageInstance};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const IMPORT_API: &str = "api/v1/import/prometheus";
const QUERY_API: &str = "api/v1/query";
const HEALTH_API: &str = "health";
const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug)]
pub struct VictoriaMetricsStorage {
    client: Client,
    base_url: Url,
}

impl VictoriaMetricsStorage {
    /// Accepts `victoriametrics://host:port[/prefix][?timeout_seconds=N]`,
    /// or `victoriametrics+https://…` to reach the server over TLS.
    pub fn connect(connection_string: &str) -> Result<Self> {
        let url = Url::parse(connection_string)?;
        let scheme = match url.scheme() {
            "victoriametrics" => "http",
            "victoriametrics+https" => "https",
            other => {
                return Err(StorageError::Configuration(format!(
                    "Unsupported VictoriaMetrics scheme: {}",
                    other
                ))
                .into());
            }
        };

        let host = url.host_str().ok_or_else(|| anyhow!("No host in URL"))?;
        let timeout_seconds = url
            .query_pairs()
            .find(|(key, _)| key == "timeout_seconds")
            .map(|(_, value)| value.parse::<u64>())
            .transpose()
            .context("Invalid timeout_seconds")?
            .unwrap_or(DEFAULT_TIMEOUT_SECONDS);

        let mut base = format!("{}://{}", scheme, host);
        if let Some(port) = url.port() {
            base.push_str(&format!(":{}", port));
        }
        base.push_str(url.path());
        // Relative joins must extend the prefix, not replace its last segment
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base).context("Invalid VictoriaMetrics base URL")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, StorageError> {
        self.base_url
            .join(path)
            .map_err(|error| StorageError::Configuration(error.to_string()))
    }

    async fn query_field(
        &self,
        field: Field,
        sensor_id: &str,
        window: &TimeWindow,
    ) -> Result<FieldSeries, StorageError> {
        let operation = format!("query {}", field.metric_name());
        let selector = range_selector(field, sensor_id, window.duration_ms());
        let evaluation_time = format!("{:.3}", window.end_ms as f64 / 1000.0);

        let response = self
            .client
            .get(self.endpoint(QUERY_API)?)
            .query(&[("query", selector.as_str()), ("time", evaluation_time.as_str())])
            .send()
            .await
            .map_err(|error| StorageError::upstream(&operation, error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::UpstreamStatus {
                operation,
                status: status.as_u16(),
            });
        }

        let body: QueryResponse =
            response
                .json()
                .await
                .map_err(|error| StorageError::InvalidResponse {
                    operation: operation.clone(),
                    details: error.to_string(),
                })?;

        decode_field_series(body, window)
            .map_err(|details| StorageError::InvalidResponse { operation, details })
    }
}

#[async_trait]
impl StorageInstance for VictoriaMetricsStorage {
    /// There is no schema; the server only has to be reachable.
    async fn create_or_migrate(&self) -> Result<()> {
        self.health_check()
            .await
            .context("VictoriaMetrics is not reachable")?;
        info!(base_url = %self.base_url, "VictoriaMetrics storage ready");
        Ok(())
    }

    async fn publish_reading(
        &self,
        reading: &Reading,
        gateway: &Gateway,
        timestamp_ms: i64,
    ) -> Result<()> {
        let operation = "import readings";
        let body = format_reading(reading, gateway, timestamp_ms);

        let response = self
            .client
            .post(self.endpoint(IMPORT_API)?)
            .header(CONTENT_TYPE, "text/plain")
            .body(body)
            .send()
            .await
            .map_err(|error| StorageError::upstream(operation, error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::UpstreamStatus {
                operation: operation.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        debug!(sensor_id = %reading.sensor_id, timestamp_ms, "Reading pushed to VictoriaMetrics");
        Ok(())
    }

    async fn query_readings(&self, sensor_id: &str, window: TimeWindow) -> Result<SensorData> {
        // Any failing field aborts the whole query, partial results are dropped
        let queries = Field::ALL
            .iter()
            .map(|field| self.query_field(*field, sensor_id, &window));
        let results = try_join_all(queries).await?;

        let series = Field::ALL.into_iter().zip(results).collect();
        Ok(merge_field_series(sensor_id, series))
    }

    async fn list_sensors(&self) -> Result<Vec<String>> {
        let operation = "list sensors";
        let url = self.endpoint(&format!("api/v1/label/{}/values", SENSOR_ID_LABEL))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| StorageError::upstream(operation, error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::UpstreamStatus {
                operation: operation.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let body: LabelValuesResponse =
            response
                .json()
                .await
                .map_err(|error| StorageError::InvalidResponse {
                    operation: operation.to_string(),
                    details: error.to_string(),
                })?;
        if body.status != "success" {
            return Err(StorageError::InvalidResponse {
                operation: operation.to_string(),
                details: format!("status {}", body.status),
            }
            .into());
        }

        let mut sensor_ids = body.data;
        sensor_ids.sort();
        sensor_ids.dedup();
        Ok(sensor_ids)
    }

    async fn health_check(&self) -> Result<()> {
        let operation = "health check";
        let response = self
            .client
            .get(self.endpoint(HEALTH_API)?)
            .send()
            .await
            .map_err(|error| StorageError::upstream(operation, error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::UpstreamStatus {
                operation: operation.to_string(),
                status: status.as_u16(),
            }
            .into());
        }
        Ok(())
    }
}
