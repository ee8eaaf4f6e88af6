//! Tombstones for locally deleted records.
//!
//! A tombstone keeps a deleted id from being resurrected by a remote fetch
//! that has not caught up with the deletion yet. The tracker is bookkeeping
//! only: every mutator reports whether the set changed, and the
//! [`SyncEngine`](crate::SyncEngine) hands changed sets to its tombstone
//! writer.

use crate::{LocalStore, RecordId};
use std::collections::BTreeSet;

/// Set of record ids deleted by the local user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TombstoneTracker {
    ids: BTreeSet<RecordId>,
}

impl TombstoneTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the tracker from local storage.
    pub fn load(store: &LocalStore) -> Self {
        Self {
            ids: store.load_tombstones(),
        }
    }

    /// Record that `id` was deleted locally.
    ///
    /// Returns whether the id was new.
    pub fn mark_deleted(&mut self, id: impl Into<RecordId>) -> bool {
        self.ids.insert(id.into())
    }

    /// Whether `id` was deleted locally.
    pub fn is_deleted(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// All tombstoned ids, sorted.
    pub fn all(&self) -> &BTreeSet<RecordId> {
        &self.ids
    }

    /// Drop the tombstone for an id the remote no longer holds.
    ///
    /// Returns whether a tombstone was removed.
    pub fn mark_synced(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    /// Forget every tombstone. Only a full reset should do this.
    ///
    /// Returns whether anything was forgotten.
    pub fn clear(&mut self) -> bool {
        let had_any = !self.ids.is_empty();
        self.ids.clear();
        had_any
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<RecordId> for TombstoneTracker {
    fn from_iter<I: IntoIterator<Item = RecordId>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeyValueStore, MemoryStore, TOMBSTONES_KEY};

    #[test]
    fn mark_and_query() {
        let mut tracker = TombstoneTracker::new();
        assert!(!tracker.is_deleted("a"));

        assert!(tracker.mark_deleted("a"));
        assert!(!tracker.mark_deleted("a"));
        assert!(tracker.is_deleted("a"));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn loads_what_was_saved() {
        let store = LocalStore::new(MemoryStore::new_shared());
        let saved: BTreeSet<RecordId> = ["b".to_string(), "a".to_string()].into();
        store.save_tombstones(&saved).unwrap();

        let tracker = TombstoneTracker::load(&store);
        let ids: Vec<_> = tracker.all().iter().cloned().collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn unreadable_bucket_loads_empty() {
        let backend = MemoryStore::new_shared();
        backend.put(TOMBSTONES_KEY, b"not json").unwrap();
        let store = LocalStore::new(backend);

        assert!(TombstoneTracker::load(&store).is_empty());
    }

    #[test]
    fn mark_synced_removes_one() {
        let mut tracker: TombstoneTracker = ["a".to_string(), "b".to_string()].into_iter().collect();

        assert!(tracker.mark_synced("a"));
        assert!(!tracker.mark_synced("a"));
        assert!(!tracker.is_deleted("a"));
        assert!(tracker.is_deleted("b"));
    }

    #[test]
    fn clear_forgets_everything() {
        let mut tracker: TombstoneTracker = ["a".to_string(), "b".to_string()].into_iter().collect();

        assert!(tracker.clear());
        assert!(tracker.is_empty());
        assert!(!tracker.clear());
    }
}
