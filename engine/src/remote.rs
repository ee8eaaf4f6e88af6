//! Remote store abstraction.

use crate::{error::Result, Error, RecordCollection};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Client for the authoritative remote store.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, in-memory for testing, etc.). Every argument is an
/// owned snapshot; implementations must not assume it reflects the engine's
/// state after the call returns. Timeouts are the implementation's concern.
#[async_trait]
pub trait RemoteSyncClient: Send + Sync {
    /// Probe whether the remote can be reached right now.
    async fn check_availability(&self) -> bool;

    /// Fetch every record the remote holds.
    async fn fetch_all(&self) -> Result<RecordCollection>;

    /// Replace the remote collection with `records`.
    async fn push_all(&self, records: RecordCollection) -> Result<()>;

    /// Delete one record. Deleting an id the remote does not hold succeeds.
    async fn delete_by_id(&self, id: &str) -> Result<()>;

    /// Fetch the remote search history.
    async fn fetch_search_history(&self) -> Result<Vec<String>>;

    /// Replace the remote search history.
    async fn push_search_history(&self, entries: Vec<String>) -> Result<()>;
}

/// The calls of [`RemoteSyncClient`], for counting and fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteCall {
    CheckAvailability,
    FetchAll,
    PushAll,
    DeleteById,
    FetchSearchHistory,
    PushSearchHistory,
}

#[derive(Debug, Default)]
struct MemoryState {
    available: bool,
    records: RecordCollection,
    history: Vec<String>,
    calls: HashMap<RemoteCall, usize>,
    failures: HashMap<RemoteCall, u32>,
    pushed: Vec<RecordCollection>,
}

/// An in-memory remote store.
///
/// Counts calls, records every pushed snapshot and can be told to fail.
#[derive(Debug)]
pub struct MemoryRemote {
    state: Mutex<MemoryState>,
    latency: Mutex<Duration>,
}

impl MemoryRemote {
    /// Creates an empty, reachable remote.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                available: true,
                ..MemoryState::default()
            }),
            latency: Mutex::new(Duration::ZERO),
        }
    }

    /// Creates a remote that already holds `records`.
    pub fn with_records(records: RecordCollection) -> Self {
        let remote = Self::new();
        remote.set_records(records);
        remote
    }

    /// Sets whether the remote answers at all.
    pub fn set_available(&self, available: bool) {
        self.state().available = available;
    }

    /// Replaces the stored records.
    pub fn set_records(&self, records: RecordCollection) {
        self.state().records = records;
    }

    /// Replaces the stored search history.
    pub fn set_search_history(&self, entries: Vec<String>) {
        self.state().history = entries;
    }

    /// Delay every call by `latency` (tokio time).
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = latency;
    }

    /// Make the next `times` calls of `call` fail with a retryable error.
    pub fn fail_next(&self, call: RemoteCall, times: u32) {
        self.state().failures.insert(call, times);
    }

    /// Make every call of `call` fail until [`fail_next`](Self::fail_next)
    /// is called again.
    pub fn fail_always(&self, call: RemoteCall) {
        self.state().failures.insert(call, u32::MAX);
    }

    /// Records currently stored.
    pub fn records(&self) -> RecordCollection {
        self.state().records.clone()
    }

    /// Search history currently stored.
    pub fn search_history(&self) -> Vec<String> {
        self.state().history.clone()
    }

    /// How many times `call` was made.
    pub fn calls(&self, call: RemoteCall) -> usize {
        self.state().calls.get(&call).copied().unwrap_or(0)
    }

    /// Every collection received by a successful `push_all`, oldest first.
    pub fn pushed(&self) -> Vec<RecordCollection> {
        self.state().pushed.clone()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn enter(&self, call: RemoteCall) -> Result<()> {
        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state();
        *state.calls.entry(call).or_default() += 1;

        if !state.available {
            return Err(Error::RemoteUnavailable);
        }

        if let Some(remaining) = state.failures.get_mut(&call) {
            if *remaining > 0 {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                return Err(Error::remote(format!("injected {call:?} failure")));
            }
        }

        Ok(())
    }
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteSyncClient for MemoryRemote {
    async fn check_availability(&self) -> bool {
        self.enter(RemoteCall::CheckAvailability).await.is_ok()
    }

    async fn fetch_all(&self) -> Result<RecordCollection> {
        self.enter(RemoteCall::FetchAll).await?;
        Ok(self.state().records.clone())
    }

    async fn push_all(&self, records: RecordCollection) -> Result<()> {
        self.enter(RemoteCall::PushAll).await?;
        let mut state = self.state();
        state.pushed.push(records.clone());
        state.records = records;
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        self.enter(RemoteCall::DeleteById).await?;
        self.state().records.remove(id);
        Ok(())
    }

    async fn fetch_search_history(&self) -> Result<Vec<String>> {
        self.enter(RemoteCall::FetchSearchHistory).await?;
        Ok(self.state().history.clone())
    }

    async fn push_search_history(&self, entries: Vec<String>) -> Result<()> {
        self.enter(RemoteCall::PushSearchHistory).await?;
        self.state().history = entries;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Record;
    use serde_json::json;

    #[tokio::test]
    async fn unavailable_remote() {
        let remote = MemoryRemote::new();
        remote.set_available(false);

        assert!(!remote.check_availability().await);
        let result = remote.fetch_all().await;
        assert!(matches!(result, Err(Error::RemoteUnavailable)));
        assert_eq!(remote.calls(RemoteCall::FetchAll), 1);
    }

    #[tokio::test]
    async fn push_then_fetch() {
        let remote = MemoryRemote::new();
        let records: RecordCollection = vec![Record::new("a", json!(1))].into();

        remote.push_all(records.clone()).await.unwrap();
        assert_eq!(remote.fetch_all().await.unwrap(), records);
        assert_eq!(remote.pushed(), vec![records]);
    }

    #[tokio::test]
    async fn delete_missing_id_succeeds() {
        let remote = MemoryRemote::new();
        remote.delete_by_id("ghost").await.unwrap();
    }

    #[tokio::test]
    async fn injected_failures_run_out() {
        let remote = MemoryRemote::new();
        remote.fail_next(RemoteCall::PushAll, 2);

        assert!(remote.push_all(RecordCollection::new()).await.is_err());
        assert!(remote.push_all(RecordCollection::new()).await.is_err());
        assert!(remote.push_all(RecordCollection::new()).await.is_ok());
        assert_eq!(remote.calls(RemoteCall::PushAll), 3);
    }

    #[tokio::test]
    async fn history_roundtrip() {
        let remote = MemoryRemote::new();
        remote
            .push_search_history(vec!["acme".to_string()])
            .await
            .unwrap();
        assert_eq!(remote.fetch_search_history().await.unwrap(), ["acme"]);
    }
}
