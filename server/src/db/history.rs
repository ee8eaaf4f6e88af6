//! Database operations for the search history table.

use sqlx::PgPool;

/// Get the search history, newest first.
pub async fn get_search_history(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT query FROM search_history ORDER BY position")
        .fetch_all(pool)
        .await
}

/// Replace the search history in one transaction.
pub async fn replace_search_history(pool: &PgPool, entries: &[String]) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM search_history")
        .execute(&mut *tx)
        .await?;

    for (position, query) in entries.iter().enumerate() {
        sqlx::query("INSERT INTO search_history (position, query) VALUES ($1, $2)")
            .bind(position as i32)
            .bind(query)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await
}
