use super::postgresql_publishers::publish_reading_fact;
use super::postgresql_utilities::{get_gateway_ref_or_create, get_sensor_ref_or_create};
use crate::datamodel::{DataPoint, Gateway, Reading, SensorData, TimeWindow};
use crate::storage::{StorageError, StorageInstance};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgConnectOptions;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let connect_options = PgConnectOptions::from_str(connection_string)
            .context("Failed to create postgres connection options")?;
        let pool = PgPool::connect_with(connect_options)
            .await
            .context("Failed to create postgres pool")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl StorageInstance for PostgresStorage {
    async fn create_or_migrate(&self) -> Result<()> {
        sqlx::migrate!("src/storage/postgresql/migrations")
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
            WHERE s.sensor_id = $1
            AND r.timestamp_ms >= $2
            AND r.timestamp_ms <= $3
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
        for row in rows {
            sensor_data.data_points.push(DataPoint {
                timestamp: row.timestamp_ms,
                gravity: row.gravity,
                tilt: row.tilt,
                temp: row.temp,
                volt: row.volt,
                interval: row.sampling_interval,
            });
            sensor_data.gateway = Some(Gateway::new(row.gateway_id, row.gateway_name));
        }
        Ok(sensor_data)
    }

    async fn list_sensors(&self) -> Result<Vec<String>> {
        // Byte order, whatever the database collation is
        let sensor_ids =
            sqlx::query_scalar(r#"SELECT sensor_id FROM sensors ORDER BY sensor_id COLLATE "C" ASC"#)
                .fetch_all(&self.pool)
                .await
                .map_err(StorageError::persistence("list sensors"))?;
        Ok(sensor_ids)
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("PostgreSQL health check failed")?;
        Ok(())
    }
}
