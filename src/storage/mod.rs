use crate::datamodel::{Gateway, Reading, SensorData, TimeWindow, now_millis};
use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;

pub mod error;
#[cfg(feature = "postgres")]
pub mod postgresql;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod storage_factory;
#[cfg(feature = "victoriametrics")]
pub mod victoriametrics;

pub use error::StorageError;

#[async_trait]
pub trait StorageInstance: Send + Sync + Debug {
    async fn create_or_migrate(&self) -> Result<()>;

    /// Resolves the sensor and gateway dimensions and appends one fact,
    /// as a single atomic unit of work.
    async fn publish_reading(
        &self,
        reading: &Reading,
        gateway: &Gateway,
        timestamp_ms: i64,
    ) -> Result<()>;

    /// History of a sensor within the window, ascending by timestamp.
    /// Unknown sensors yield an empty history, not an error.
    async fn query_readings(&self, sensor_id: &str, window: TimeWindow) -> Result<SensorData>;

    /// Distinct sensor identifiers in lexicographic order.
    async fn list_sensors(&self) -> Result<Vec<String>>;

    async fn health_check(&self) -> Result<()>;

    /// Stores a reading stamped with the server's wall clock and returns that timestamp.
    async fn record(&self, reading: &Reading, gateway: &Gateway) -> Result<i64> {
        let timestamp_ms = now_millis()?;
        self.publish_reading(reading, gateway, timestamp_ms).await?;
        Ok(timestamp_ms)
    }

    /// History of a sensor over the last `window_hours` hours.
    async fn query(&self, sensor_id: &str, window_hours: u32) -> Result<SensorData> {
        if window_hours == 0 {
            return Ok(SensorData::empty(sensor_id));
        }
        let window = TimeWindow::last_hours(now_millis()?, window_hours);
        self.query_readings(sensor_id, window).await
    }
}
