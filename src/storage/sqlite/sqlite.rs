use super::sqlite_publishers::publish_reading_fact;
use super::sqlite_utilities::{get_gateway_ref_or_create, get_sensor_ref_or_create};
use crate::datamodel::{DataPoint, Gateway, Reading, SensorData, TimeWindow};
use crate::storage::{StorageError, StorageInstance};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

// SQLite implementation
#[derive(Debug)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str(connection_string)
            .context("Failed to create sqlite connection options")?
            // Create the database file if it doesn't exist
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            // Readings must reference existing dimension rows
            .foreign_keys(true)
            // Set a busy timeout of 5 seconds
            .busy_timeout(Duration::from_secs(5));

        // Every connection to an in-memory database opens a separate database,
        // so the pool keeps exactly one connection alive for its whole lifetime.
        let pool_options = if is_in_memory(connection_string) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .context("Failed to create sqlite pool")?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Number of rows in one of the schema tables.
    #[cfg(any(test, feature = "test-utils"))]
    pub async fn count_rows(&self, table: &str) -> Result<i64> {
        anyhow::ensure!(
            matches!(table, "sensors" | "gateways" | "readings"),
            "Unknown table {}",
            table
        );
        let count = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn is_in_memory(connection_string: &str) -> bool {
    connection_string.contains(":memory:") || connection_string.contains("mode=memory")
}

#[async_trait]
impl StorageInstance for SqliteStorage {
    async fn create_or_migrate(&self) -> Result<()> {
        sqlx::migrate!("src/storage/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to migrate database")?;

        Ok(())
    }

    async fn publish_reading(
        &self,
        reading: &Reading,
        gateway: &Gateway,
        timestamp_ms: i64,
    ) -> Result<()> {
        // Dropping the transaction on any early return rolls back every
        // dimension row created so far.
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(StorageError::persistence("begin transaction"))?;

        let sensor_ref = get_sensor_ref_or_create(&mut transaction, &reading.sensor_id).await?;
        let gateway_ref = get_gateway_ref_or_create(&mut transaction, gateway).await?;
        publish_reading_fact(
            &mut transaction,
            sensor_ref,
            gateway_ref,
            reading,
            timestamp_ms,
        )
        .await?;

        transaction
            .commit()
            .await
            .map_err(StorageError::persistence("commit reading"))?;

        debug!(
            sensor_id = %reading.sensor_id,
            sensor_ref,
            gateway_ref,
            timestamp_ms,
            "Reading stored"
        );
        Ok(())
    }

    async fn query_readings(&self, sensor_id: &str, window: TimeWindow) -> Result<SensorData> {
        #[derive(sqlx::FromRow)]
        struct ReadingRow {
            timestamp_ms: i64,
            gravity: f64,
            tilt: f64,
            temp: f64,
            volt: f64,
            sampling_interval: i64,
            gateway_id: String,
            gateway_name: String,
        }

        let rows: Vec<ReadingRow> = sqlx::query_as(
            r#"
            SELECT r.timestamp_ms, r.gravity, r.tilt, r.temp, r.volt, r.sampling_interval,
                   g.gateway_id, g.gateway_name
            FROM readings r
            JOIN sensors s ON s.id = r.sensor_ref
            JOIN gateways g ON g.id = r.gateway_ref
            WHERE s.sensor_id = ?
            AND r.timestamp_ms >= ?
            AND r.timestamp_ms <= ?
            ORDER BY r.timestamp_ms ASC, r.id ASC
            "#,
        )
        .bind(sensor_id)
        .bind(window.start_ms)
        .bind(window.end_ms)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::persistence("query readings"))?;

        let mut sensor_data = SensorData::empty(sensor_id);
        sensor_data.data_points.reserve(rows.len());
        for row in rows {
            sensor_data.data_points.push(DataPoint {
                timestamp: row.timestamp_ms,
                gravity: row.gravity,
                tilt: row.tilt,
                temp: row.temp,
                volt: row.volt,
                interval: row.sampling_interval,
            });
            // The gateway of the most recent reading wins
            sensor_data.gateway = Some(Gateway::new(row.gateway_id, row.gateway_name));
        }

        Ok(sensor_data)
    }

    async fn list_sensors(&self) -> Result<Vec<String>> {
        let sensor_ids = sqlx::query_scalar("SELECT sensor_id FROM sensors ORDER BY sensor_id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::persistence("list sensors"))?;
        Ok(sensor_ids)
    }

    /// Executes a simple SELECT 1 query to verify database connectivity
    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("SQLite health check failed")?;
        Ok(())
    }
}
