#![allow(dead_code)]

use anyhow::{Result, bail};
use async_trait::async_trait;
use tilted::datamodel::{Gateway, Reading, SensorData, TimeWindow};
use tilted::storage::StorageInstance;

pub mod http;

/// Storage whose every operation fails, to exercise the 5xx paths.
#[derive(Debug, Default)]
pub struct FailingStorage;

#[async_trait]
impl StorageInstance for FailingStorage {
    async fn create_or_migrate(&self) -> Result<()> {
        bail!("database is unreachable")
    }

    async fn publish_reading(
        &self,
        _reading: &Reading,
        _gateway: &Gateway,
        _timestamp_ms: i64,
    ) -> Result<()> {
        bail!("database is unreachable")
    }

    async fn query_readings(&self, _sensor_id: &str, _window: TimeWindow) -> Result<SensorData> {
        bail!("database is unreachable")
    }

    async fn list_sensors(&self) -> Result<Vec<String>> {
        bail!("database is unreachable")
    }

    async fn health_check(&self) -> Result<()> {
        bail!("database is unreachable")
    }
}
