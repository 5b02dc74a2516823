use crate::datamodel::Gateway;
use crate::storage::StorageError;
use sqlx::{Postgres, Transaction};

// Under READ COMMITTED, a concurrent transaction may commit the same natural
// key between our snapshot and our insert. The insert then does nothing and
// the UNION branch cannot see the new row, so the lookup is repeated in a
// fresh statement that does.

pub async fn get_sensor_ref_or_create(
    transaction: &mut Transaction<'_, Postgres>,
    sensor_id: &str,
) -> Result<i64, StorageError> {
    let resolved: Option<i64> = sqlx::query_scalar(
        r#"
        WITH inserted AS (
            INSERT INTO sensors (sensor_id)
            VALUES ($1)
            ON CONFLICT (sensor_id) DO NOTHING
            RETURNING id
        )
        SELECT id FROM inserted
        UNION ALL
        SELECT id FROM sensors WHERE sensor_id = $1
        LIMIT 1
        "#,
    )
    .bind(sensor_id)
    .fetch_optional(&mut **transaction)
    .await
    .map_err(StorageError::persistence("create sensor"))?;

    if let Some(sensor_ref) = resolved {
        return Ok(sensor_ref);
    }

    sqlx::query_scalar("SELECT id FROM sensors WHERE sensor_id = $1")
        .bind(sensor_id)
        .fetch_one(&mut **transaction)
        .await
        .map_err(StorageError::persistence("lookup sensor"))
}

pub async fn get_gateway_ref_or_create(
    transaction: &mut Transaction<'_, Postgres>,
    gateway: &Gateway,
) -> Result<i64, StorageError> {
    let resolved: Option<i64> = sqlx::query_scalar(
        r#"
        WITH inserted AS (
            INSERT INTO gateways (gateway_id, gateway_name)
            VALUES ($1, $2)
            ON CONFLICT (gateway_id, gateway_name) DO NOTHING
            RETURNING id
        )
        SELECT id FROM inserted
        UNION ALL
        SELECT id FROM gateways WHERE gateway_id = $1 AND gateway_name = $2
        LIMIT 1
        "#,
    )
    .bind(&gateway.id)
    .bind(&gateway.name)
    .fetch_optional(&mut **transaction)
    .await
    .map_err(StorageError::persistence("create gateway"))?;

    if let Some(gateway_ref) = resolved {
        return Ok(gateway_ref);
    }

    sqlx::query_scalar("SELECT id FROM gateways WHERE gateway_id = $1 AND gateway_name = $2")
        .bind(&gateway.id)
        .bind(&gateway.name)
        .fetch_one(&mut **transaction)
        .await
        .map_err(StorageError::persistence("lookup gateway"))
}
