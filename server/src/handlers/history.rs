//! Search history handlers.

use crate::db;
use crate::error::Result;
use sqlx::PgPool;
use stash_engine::{http::SearchHistoryBody, SearchHistory, DEFAULT_HISTORY_LIMIT};

/// Return the stored search history.
pub async fn handle_get_history(pool: &PgPool) -> Result<SearchHistoryBody> {
    let entries = db::get_search_history(pool).await?;
    Ok(SearchHistoryBody { entries })
}

/// Replace the stored search history.
pub async fn handle_replace_history(pool: &PgPool, body: SearchHistoryBody) -> Result<()> {
    let entries = normalize_history(body.entries);
    db::replace_search_history(pool, &entries).await?;
    tracing::debug!(entries = entries.len(), "Replaced search history");
    Ok(())
}

/// Trim, dedupe and cap the entries the same way clients do.
pub fn normalize_history(entries: Vec<String>) -> Vec<String> {
    let mut history = SearchHistory::new(DEFAULT_HISTORY_LIMIT);
    history.replace(entries);
    history.entries().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_capped_and_deduplicated() {
        let mut entries: Vec<String> = (0..15).map(|i| format!("q{i}")).collect();
        entries.insert(1, "q0".into());

        let normalized = normalize_history(entries);
        assert_eq!(normalized.len(), 10);
        assert_eq!(normalized[0], "q0");
        assert_eq!(normalized[1], "q1");
    }
}
