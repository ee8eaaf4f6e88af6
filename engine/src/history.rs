//! Bounded search history.
//!
//! Synced wholesale with the remote store: whoever writes last wins, there is
//! no merge and no tombstoning.

use serde::{Deserialize, Serialize};

/// Default number of entries kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Recent search queries, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistory {
    entries: Vec<String>,
    limit: usize,
}

impl SearchHistory {
    /// Create an empty history holding at most `limit` entries.
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Build a history from stored or remote entries, trimming to the limit.
    pub fn from_entries(entries: Vec<String>, limit: usize) -> Self {
        let mut history = Self::new(limit);
        history.replace(entries);
        history
    }

    /// Record a query. Blank queries are ignored; a repeated query moves to
    /// the front. Returns whether the history changed.
    pub fn record(&mut self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }
        if self.entries.first().map(String::as_str) == Some(query) {
            return false;
        }

        self.entries.retain(|e| e != query);
        self.entries.insert(0, query.to_string());
        self.entries.truncate(self.limit);
        true
    }

    /// Replace all entries (last writer wins).
    pub fn replace(&mut self, entries: Vec<String>) {
        self.entries.clear();
        for entry in entries {
            let entry = entry.trim();
            if !entry.is_empty() && !self.entries.iter().any(|e| e == entry) {
                self.entries.push(entry.to_string());
            }
        }
        self.entries.truncate(self.limit);
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries, newest first.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for SearchHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_first() {
        let mut history = SearchHistory::default();
        history.record("coffee");
        history.record("tea");
        assert_eq!(history.entries(), ["tea", "coffee"]);
    }

    #[test]
    fn repeated_query_moves_to_front() {
        let mut history = SearchHistory::default();
        history.record("coffee");
        history.record("tea");
        assert!(history.record("coffee"));
        assert_eq!(history.entries(), ["coffee", "tea"]);

        // Already at the front: nothing changes
        assert!(!history.record("coffee"));
    }

    #[test]
    fn blank_queries_ignored() {
        let mut history = SearchHistory::default();
        assert!(!history.record("   "));
        assert!(history.record("  acme  "));
        assert_eq!(history.entries(), ["acme"]);
    }

    #[test]
    fn bounded_to_limit() {
        let mut history = SearchHistory::default();
        for i in 0..15 {
            history.record(&format!("query {i}"));
        }
        assert_eq!(history.len(), DEFAULT_HISTORY_LIMIT);
        assert_eq!(history.entries()[0], "query 14");
        assert_eq!(history.entries()[9], "query 5");
    }

    #[test]
    fn replace_dedups_and_trims() {
        let entries = vec!["a", "b", "a", "", "c", "d"]
            .into_iter()
            .map(String::from)
            .collect();
        let history = SearchHistory::from_entries(entries, 3);
        assert_eq!(history.entries(), ["a", "b", "c"]);
    }
}
