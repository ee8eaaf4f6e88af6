//! Record collection handlers.

use crate::db;
use crate::error::{AppError, Result};
use sqlx::PgPool;
use stash_engine::{http::RecordsBody, RecordCollection};

/// Return the whole collection.
pub async fn handle_list(pool: &PgPool) -> Result<RecordsBody> {
    let stored = db::list_records(pool).await?;
    let records: RecordCollection = stored.into_iter().map(|r| r.into_record()).collect();
    tracing::debug!(records = records.len(), "Serving records");
    Ok(RecordsBody { records })
}

/// Replace the whole collection with the client's copy.
pub async fn handle_replace(pool: &PgPool, body: RecordsBody) -> Result<()> {
    validate_records(&body.records)?;
    db::replace_records(pool, &body.records).await?;
    tracing::info!(records = body.records.len(), "Replaced record collection");
    Ok(())
}

/// Delete one record.
pub async fn handle_delete(pool: &PgPool, record_id: &str) -> Result<()> {
    if !db::delete_record(pool, record_id).await? {
        return Err(AppError::NotFound(format!("record {record_id}")));
    }
    tracing::info!(record_id, "Deleted record");
    Ok(())
}

/// Reject collections the store cannot hold.
pub fn validate_records(records: &RecordCollection) -> Result<()> {
    if records.iter().any(|r| r.id.trim().is_empty()) {
        return Err(AppError::BadRequest("record id must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stash_engine::Record;

    #[test]
    fn empty_ids_are_rejected() {
        let ok: RecordCollection = vec![Record::new("a", json!({}))].into();
        assert!(validate_records(&ok).is_ok());

        let bad: RecordCollection = vec![Record::new("  ", json!({}))].into();
        assert!(matches!(validate_records(&bad), Err(AppError::BadRequest(_))));
    }
}
