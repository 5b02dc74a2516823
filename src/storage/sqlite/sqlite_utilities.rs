use crate::datamodel::Gateway;
use crate::storage::StorageError;
use sqlx::{Sqlite, Transaction};

// Dimension resolution inserts first and reads second. The insert is the
// first statement of the transaction, so SQLite takes the write lock before
// any snapshot exists and a concurrent first sight of the same key waits on
// the busy timeout instead of failing. A conflicting insert returns no row
// and the identifier is re-read.

pub async fn get_sensor_ref_or_create(
    transaction: &mut Transaction<'_, Sqlite>,
    sensor_id: &str,
) -> Result<i64, StorageError> {
    let inserted: Option<i64> = sqlx::query_scalar(
        r#"
        INSERT INTO sensors (sensor_id)
        VALUES (?)
        ON CONFLICT (sensor_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(sensor_id)
    .fetch_optional(&mut **transaction)
    .await
    .map_err(StorageError::persistence("create sensor"))?;

    if let Some(sensor_ref) = inserted {
        return Ok(sensor_ref);
    }

    sqlx::query_scalar("SELECT id FROM sensors WHERE sensor_id = ?")
        .bind(sensor_id)
        .fetch_one(&mut **transaction)
        .await
        .map_err(StorageError::persistence("lookup sensor"))
}

pub async fn get_gateway_ref_or_create(
    transaction: &mut Transaction<'_, Sqlite>,
    gateway: &Gateway,
) -> Result<i64, StorageError> {
    let inserted: Option<i64> = sqlx::query_scalar(
        r#"
        INSERT INTO gateways (gateway_id, gateway_name)
        VALUES (?, ?)
        ON CONFLICT (gateway_id, gateway_name) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(&gateway.id)
    .bind(&gateway.name)
    .fetch_optional(&mut **transaction)
    .await
    .map_err(StorageError::persistence("create gateway"))?;

    if let Some(gateway_ref) = inserted {
        return Ok(gateway_ref);
    }

    sqlx::query_scalar("SELECT id FROM gateways WHERE gateway_id = ? AND gateway_name = ?")
        .bind(&gateway.id)
        .bind(&gateway.name)
        .fetch_one(&mut **transaction)
        .await
        .map_err(StorageError::persistence("lookup gateway"))
}
