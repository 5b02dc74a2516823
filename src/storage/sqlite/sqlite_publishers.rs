use crate::datamodel::Reading;
use crate::storage::StorageError;
use sqlx::{Sqlite, Transaction};

pub async fn publish_reading_fact(
    transaction: &mut Transaction<'_, Sqlite>,
    sensor_ref: i64,
    gateway_ref: i64,
    reading: &Reading,
    timestamp_ms: i64,
) -> Result<(), StorageError> {
    // SQLite stores NaN as NULL, which the NOT NULL constraints reject.
    sqlx::query(
        r#"
        INSERT INTO readings
            (timestamp_ms, sensor_ref, gateway_ref, gravity, tilt, temp, volt, sampling_interval)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
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
