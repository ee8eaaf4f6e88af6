//! Database operations for the records table.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use stash_engine::{Record, RecordCollection};

/// A stored record row from the database.
#[derive(Debug)]
pub struct StoredRecord {
    pub record_id: String,
    pub payload: serde_json::Value,
    pub position: i64,
    pub updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for StoredRecord {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredRecord {
            record_id: row.try_get("record_id")?,
            payload: row.try_get("payload")?,
            position: row.try_get("position")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl StoredRecord {
    /// Convert database row to a stash-engine Record.
    pub fn into_record(self) -> Record {
        Record::new(self.record_id, self.payload)
    }
}

/// Get every record in collection order.
pub async fn list_records(pool: &PgPool) -> Result<Vec<StoredRecord>, sqlx::Error> {
    sqlx::query_as::<_, StoredRecord>(
        r#"
        SELECT record_id, payload, position, updated_at
        FROM records
        ORDER BY position, record_id
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Replace the whole collection in one transaction.
///
/// Rows whose id is not in `records` are deleted; the rest are upserted with
/// their index as position so the order survives a round trip.
pub async fn replace_records(pool: &PgPool, records: &RecordCollection) -> Result<(), sqlx::Error> {
    let ids: Vec<String> = records.ids().cloned().collect();
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM records WHERE NOT (record_id = ANY($1))")
        .bind(&ids)
        .execute(&mut *tx)
        .await?;

    for (position, record) in records.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO records (record_id, payload, position, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (record_id) DO UPDATE SET
                payload = EXCLUDED.payload,
                position = EXCLUDED.position,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&record.id)
        .bind(&record.payload)
        .bind(position as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

/// Delete one record. Returns whether it existed.
pub async fn delete_record(pool: &PgPool, record_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM records WHERE record_id = $1")
        .bind(record_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
