use crate::datamodel::Reading;
use crate::storage::StorageError;
use sqlx::{Postgres, Transaction};

pub async fn publish_reading_fact(
    transaction: &mut Transaction<'_, Postgres>,
    sensor_ref: i64,
    gateway_ref: i64,
    reading: &Reading,
    timestamp_ms: i64,
) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        INSERT INTO readings
            (timestamp_ms, sensor_ref, gateway_ref, gravity, tilt, temp, volt, sampling_interval)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(timestamp_ms)
    .bind(sensor_ref)
    .bind(gateway_ref)
    .bind(reading.gravity)
    .bind(reading.tilt)
    .bind(reading.temp)
    .bind(reading.volt)
    .bind(reading.interval)
    .execute(&mut **transaction)
    .await
    .map_err(StorageError::persistence("insert reading"))?;
    Ok(())
}
