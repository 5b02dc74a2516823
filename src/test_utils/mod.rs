//! Test utilities for Tilted tests
//!
//! Every [`TestDb`] owns a private in-memory SQLite database, so tests can
//! run in parallel without cleaning up after each other.

use crate::storage::StorageInstance;
use crate::storage::sqlite::SqliteStorage;
use anyhow::{Context, Result};
use std::sync::Arc;

pub mod fixtures;

pub const IN_MEMORY_CONNECTION_STRING: &str = "sqlite::memory:";

/// Isolated, migrated storage for one test.
pub struct TestDb {
    sqlite: Arc<SqliteStorage>,
}

impl TestDb {
    pub async fn new() -> Result<Self> {
        let sqlite = SqliteStorage::connect(IN_MEMORY_CONNECTION_STRING)
            .await
            .context("Failed to open in-memory SQLite")?;
        sqlite
            .create_or_migrate()
            .await
            .context("Failed to migrate in-memory SQLite")?;
        Ok(Self {
            sqlite: Arc::new(sqlite),
        })
    }

    /// The storage as the HTTP layer sees it.
    pub fn storage(&self) -> Arc<dyn StorageInstance> {
        self.sqlite.clone()
    }

    /// Direct access for row-level assertions.
    pub fn sqlite(&self) -> &SqliteStorage {
        &self.sqlite
    }
}

/// Helper trait for easier testing
pub trait TestHelpers {
    fn expect_sensor_count(
        &self,
        expected: usize,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

impl TestHelpers for Arc<dyn StorageInstance> {
    async fn expect_sensor_count(&self, expected: usize) -> Result<()> {
        let sensors = self.list_sensors().await?;
        anyhow::ensure!(
            sensors.len() == expected,
            "Expected {} sensors, found {}. Sensors: {:#?}",
            expected,
            sensors.len(),
            sensors
        );
        Ok(())
    }
}
