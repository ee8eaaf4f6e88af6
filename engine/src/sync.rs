//! The sync engine.
//!
//! [`SyncEngine`] owns the record collection, the search history, the
//! tombstones and the sync metadata. All of them are mutated only through
//! `&mut self`. Network calls run on spawned tokio tasks that work on owned
//! snapshots and report back over a channel; the owner applies those results
//! with [`SyncEngine::next_event`] or [`SyncEngine::poll_events`].
//!
//! ```text
//! Idle -> CheckingAvailability -> PullingInitial -> Idle <-> Pushing | Pulling
//!                              \-> OfflineIdle --reconnect()--^
//! ```

use crate::{
    error::Result,
    merge::{merge_with_report, without_tombstoned},
    AutoSaveScheduler, EngineConfig, Error, LocalStore, Record, RecordCollection, RecordId,
    RemoteSyncClient, RetryConfig, SearchHistory, SyncMetadata, Timestamp, TombstoneTracker,
};
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Where the engine is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Online with nothing in flight on the record collection, or not
    /// started yet.
    Idle,
    /// Probing the remote during startup or reconnect.
    CheckingAvailability,
    /// Fetching and merging the remote collection during startup.
    PullingInitial,
    /// The remote could not be reached. Everything is local-only.
    OfflineIdle,
    /// A push of the record collection is in flight.
    Pushing,
    /// A full pull of the record collection is in flight.
    Pulling,
}

/// Outcome of a background operation, as seen by the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A push of the record collection finished.
    PushFinished { result: Result<()> },
    /// A remote delete finished. On failure the tombstone stays.
    DeleteFinished { id: RecordId, result: Result<()> },
    /// A push of the search history finished.
    HistoryPushed { result: Result<()> },
    /// The remote stopped answering; the engine is now local-only.
    WentOffline,
}

impl SyncEvent {
    /// The error carried by this event, if any.
    pub fn error(&self) -> Option<&Error> {
        match self {
            SyncEvent::PushFinished { result }
            | SyncEvent::DeleteFinished { result, .. }
            | SyncEvent::HistoryPushed { result } => result.as_ref().err(),
            SyncEvent::WentOffline => None,
        }
    }
}

#[derive(Debug)]
enum TaskResult {
    Push {
        result: Result<()>,
        finished_at: Timestamp,
    },
    Delete {
        id: RecordId,
        result: Result<()>,
    },
    HistoryPush {
        result: Result<()>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordsOp {
    Push,
    Pull,
}

/// Local-first sync engine.
///
/// Must be created inside a tokio runtime: it spawns one writer task per
/// persisted bucket. Records and search history are debounced; tombstones
/// and metadata are written as soon as they change, in order.
pub struct SyncEngine {
    config: EngineConfig,
    tombstones: TombstoneTracker,
    remote: Arc<dyn RemoteSyncClient>,

    records: RecordCollection,
    history: SearchHistory,
    metadata: SyncMetadata,
    last_error: Option<Error>,

    phase: SyncState,
    online: bool,
    records_op: Option<RecordsOp>,
    records_dirty: bool,
    history_busy: bool,
    history_dirty: bool,
    in_flight: usize,

    records_saver: AutoSaveScheduler<RecordCollection>,
    history_saver: AutoSaveScheduler<Vec<String>>,
    tombstone_saver: AutoSaveScheduler<BTreeSet<RecordId>>,
    metadata_saver: AutoSaveScheduler<SyncMetadata>,
    results_tx: mpsc::UnboundedSender<TaskResult>,
    results_rx: mpsc::UnboundedReceiver<TaskResult>,
}

impl SyncEngine {
    /// Create an engine from what is stored locally.
    ///
    /// Nothing touches the network until [`start`](Self::start).
    pub fn new(
        config: EngineConfig,
        store: LocalStore,
        tombstones: TombstoneTracker,
        remote: Arc<dyn RemoteSyncClient>,
    ) -> Self {
        let records = store.load_all();
        let history = SearchHistory::from_entries(store.load_search_history(), config.history_limit);
        let mut metadata = store.load_metadata();
        // Only a probe in this session can say the remote is reachable
        metadata.remote_available = false;

        let records_store = store.clone();
        let records_saver = AutoSaveScheduler::spawn(
            "records",
            config.records_debounce,
            move |records: RecordCollection| {
                let _ = records_store.save_all(&records);
            },
        );

        let history_store = store.clone();
        let history_saver = AutoSaveScheduler::spawn(
            "search_history",
            config.history_debounce,
            move |entries: Vec<String>| {
                let _ = history_store.save_search_history(&entries);
            },
        );

        let tombstone_store = store.clone();
        let tombstone_saver = AutoSaveScheduler::spawn(
            "tombstones",
            Duration::ZERO,
            move |ids: BTreeSet<RecordId>| {
                let _ = tombstone_store.save_tombstones(&ids);
            },
        );

        let metadata_store = store;
        let metadata_saver = AutoSaveScheduler::spawn(
            "metadata",
            Duration::ZERO,
            move |metadata: SyncMetadata| {
                let _ = metadata_store.save_metadata(&metadata);
            },
        );

        let (results_tx, results_rx) = mpsc::unbounded_channel();

        tracing::debug!(
            records = records.len(),
            tombstones = tombstones.len(),
            "Sync engine created"
        );

        Self {
            config,
            tombstones,
            remote,
            records,
            history,
            metadata,
            last_error: None,
            phase: SyncState::Idle,
            online: false,
            records_op: None,
            records_dirty: false,
            history_busy: false,
            history_dirty: false,
            in_flight: 0,
            records_saver,
            history_saver,
            tombstone_saver,
            metadata_saver,
            results_tx,
            results_rx,
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Probe the remote and, when it answers, reconcile with it.
    ///
    /// An unreachable remote is not an error: the engine goes to
    /// [`SyncState::OfflineIdle`] and returns `Ok`. A remote that answers the
    /// probe but fails the fetch returns the error; the engine stays online
    /// with its local collection untouched.
    ///
    /// Refused with [`Error::SyncInProgress`] while a push or pull of the
    /// record collection from an earlier session is still in flight; drive
    /// [`settle`](Self::settle) first.
    pub async fn start(&mut self) -> Result<()> {
        if self.records_op.is_some() {
            return Err(Error::SyncInProgress);
        }
        self.phase = SyncState::CheckingAvailability;

        if !self.remote.check_availability().await {
            self.go_offline();
            return Ok(());
        }

        self.online = true;
        self.metadata.remote_available = true;
        self.metadata_changed();
        tracing::info!("Remote store available");

        self.phase = SyncState::PullingInitial;
        let outcome = self.initial_pull().await;
        if self.phase == SyncState::PullingInitial {
            self.phase = SyncState::Idle;
        }
        outcome?;

        if self.online && self.config.sync_search_history {
            self.initial_history_pull().await?;
        }
        Ok(())
    }

    /// Leave offline mode by re-running the startup sequence.
    ///
    /// Does nothing when the engine is already online. Like `start`, refused
    /// while a push from before the remote dropped out is still in flight.
    pub async fn reconnect(&mut self) -> Result<()> {
        if self.online {
            return Ok(());
        }
        tracing::info!("Reconnecting to remote store");
        self.start().await
    }

    /// Write every pending snapshot to local storage now.
    pub async fn flush(&self) {
        self.records_saver.flush().await;
        self.history_saver.flush().await;
        self.tombstone_saver.flush().await;
        self.metadata_saver.flush().await;
    }

    /// Write pending snapshots and stop the debounce tasks.
    ///
    /// Background network operations still in flight are abandoned.
    pub async fn shutdown(self) {
        if self.in_flight > 0 {
            tracing::debug!(in_flight = self.in_flight, "Shutting down with remote calls in flight");
        }
        self.records_saver.shutdown().await;
        self.history_saver.shutdown().await;
        self.tombstone_saver.shutdown().await;
        self.metadata_saver.shutdown().await;
    }

    async fn initial_pull(&mut self) -> Result<()> {
        let remote_records = match self.remote.fetch_all().await {
            Ok(records) => records,
            Err(Error::RemoteUnavailable) => {
                self.go_offline();
                return Ok(());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Initial pull failed");
                self.last_error = Some(e.clone());
                return Err(e);
            }
        };

        self.forget_synced_tombstones(&remote_records);
        let (merged, report) =
            merge_with_report(&self.records, &remote_records, self.tombstones.all());

        tracing::info!(
            replaced = report.replaced.len(),
            added = report.added.len(),
            kept_local = report.kept_local.len(),
            suppressed = report.suppressed.len(),
            "Merged remote records"
        );

        self.records = merged;
        self.records_saver.notify_changed(self.records.clone());
        self.advance_sync_time(Utc::now());

        if self.config.push_after_initial_merge && report.remote_is_stale() {
            self.request_push();
        }
        Ok(())
    }

    async fn initial_history_pull(&mut self) -> Result<()> {
        match self.remote.fetch_search_history().await {
            Ok(entries) if !entries.is_empty() => {
                self.history.replace(entries);
                self.history_saver.notify_changed(self.history.entries().to_vec());
                Ok(())
            }
            Ok(_) => {
                if !self.history.is_empty() {
                    self.request_history_push();
                }
                Ok(())
            }
            Err(Error::RemoteUnavailable) => {
                self.go_offline();
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Search history pull failed");
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    // ========================================================================
    // Record mutations
    // ========================================================================

    /// Add a new record.
    pub fn add(&mut self, record: Record) -> Result<()> {
        if self.tombstones.is_deleted(&record.id) {
            return Err(Error::RecordDeleted(record.id));
        }
        self.records.insert(record)?;
        self.records_changed();
        Ok(())
    }

    /// Replace the payload of an existing record.
    pub fn update(&mut self, id: &str, payload: Value) -> Result<()> {
        self.records.replace(Record::new(id, payload))?;
        self.records_changed();
        Ok(())
    }

    /// Delete a record locally and, when online, on the remote.
    ///
    /// The tombstone is in place before this returns and on disk before the
    /// remote delete is sent, so the record can not come back from a later
    /// pull even if the remote delete fails.
    pub fn remove(&mut self, id: &str) -> Result<Record> {
        let removed = self
            .records
            .remove(id)
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;
        if self.tombstones.mark_deleted(id) {
            self.tombstones_changed();
        }
        self.records_saver.notify_changed(self.records.clone());

        if self.online {
            // An in-flight push may still carry the record
            if self.records_op == Some(RecordsOp::Push) {
                self.records_dirty = true;
            }
            self.spawn_delete(id.to_string());
        }
        Ok(removed)
    }

    /// Remove every record and forget every tombstone, then push the empty
    /// collection when online.
    pub fn clear_all(&mut self) -> Result<()> {
        self.records.clear();
        if self.tombstones.clear() {
            self.tombstones_changed();
        }
        tracing::info!("Cleared all records");
        self.records_changed();
        Ok(())
    }

    // ========================================================================
    // Search history
    // ========================================================================

    /// Remember a search query.
    ///
    /// Blank queries are ignored.
    pub fn record_search(&mut self, query: &str) -> Result<()> {
        if self.history.record(query) {
            self.history_changed();
        }
        Ok(())
    }

    /// Forget every search query.
    pub fn clear_search_history(&mut self) -> Result<()> {
        if !self.history.is_empty() {
            self.history.clear();
            self.history_changed();
        }
        Ok(())
    }

    // ========================================================================
    // Manual sync
    // ========================================================================

    /// Replace the local collection with the remote one, without merging.
    ///
    /// Tombstoned ids are still dropped.
    pub async fn pull_from_remote(&mut self) -> Result<()> {
        self.ensure_ready()?;

        self.records_op = Some(RecordsOp::Pull);
        let fetched = self.remote.fetch_all().await;
        self.records_op = None;

        let remote_records = match fetched {
            Ok(records) => records,
            Err(e) => return Err(self.manual_failure("pull", e)),
        };

        self.forget_synced_tombstones(&remote_records);
        self.records = without_tombstoned(remote_records, self.tombstones.all());
        self.records_saver.notify_changed(self.records.clone());
        self.advance_sync_time(Utc::now());
        self.last_error = None;

        tracing::info!(records = self.records.len(), "Pulled records from remote");
        Ok(())
    }

    /// Overwrite the remote with the local collection, and the search
    /// history when it is synced.
    pub async fn push_to_remote(&mut self) -> Result<()> {
        self.ensure_ready()?;

        self.records_op = Some(RecordsOp::Push);
        let snapshot = self.records.clone();
        let remote = self.remote.clone();
        let pushed = with_retry(&self.config.retry, "push_all", || {
            remote.push_all(snapshot.clone())
        })
        .await;
        self.records_op = None;

        if let Err(e) = pushed {
            return Err(self.manual_failure("push", e));
        }

        if self.config.sync_search_history && !self.history_busy {
            let entries = self.history.entries().to_vec();
            let pushed = with_retry(&self.config.retry, "push_search_history", || {
                remote.push_search_history(entries.clone())
            })
            .await;
            if let Err(e) = pushed {
                return Err(self.manual_failure("search history push", e));
            }
            self.history_dirty = false;
        }

        self.records_dirty = false;
        self.advance_sync_time(Utc::now());
        self.last_error = None;
        tracing::info!(records = self.records.len(), "Pushed records to remote");
        Ok(())
    }

    fn ensure_ready(&self) -> Result<()> {
        if !self.online {
            return Err(Error::Offline);
        }
        if self.records_op.is_some() {
            return Err(Error::SyncInProgress);
        }
        Ok(())
    }

    fn manual_failure(&mut self, what: &'static str, error: Error) -> Error {
        if error == Error::RemoteUnavailable {
            self.go_offline();
        } else {
            tracing::warn!(operation = what, error = %error, "Manual sync failed");
            self.last_error = Some(error.clone());
        }
        error
    }

    // ========================================================================
    // Background operations
    // ========================================================================

    /// Apply the next background result, waiting for it if needed.
    ///
    /// Returns `None` straight away when nothing is in flight.
    pub async fn next_event(&mut self) -> Option<SyncEvent> {
        if self.in_flight == 0 {
            return None;
        }
        let result = self.results_rx.recv().await?;
        Some(self.apply(result))
    }

    /// Apply every background result that is already available.
    pub fn poll_events(&mut self) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        while let Ok(result) = self.results_rx.try_recv() {
            events.push(self.apply(result));
        }
        events
    }

    /// Drive background work until nothing is in flight, including any
    /// follow-up pushes it schedules.
    pub async fn settle(&mut self) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event().await {
            events.push(event);
        }
        events
    }

    fn apply(&mut self, result: TaskResult) -> SyncEvent {
        self.in_flight = self.in_flight.saturating_sub(1);

        match result {
            TaskResult::Push {
                result,
                finished_at,
            } => {
                self.records_op = None;
                let event = match result {
                    Ok(()) => {
                        self.advance_sync_time(finished_at);
                        self.last_error = None;
                        tracing::debug!("Background push finished");
                        SyncEvent::PushFinished { result: Ok(()) }
                    }
                    Err(e) => self.background_failure("push", e, |result| {
                        SyncEvent::PushFinished { result }
                    }),
                };
                if self.records_dirty && self.online {
                    self.records_dirty = false;
                    self.spawn_push();
                }
                event
            }
            TaskResult::Delete { id, result } => match result {
                Ok(()) => {
                    tracing::debug!(id = %id, "Remote delete finished");
                    SyncEvent::DeleteFinished { id, result: Ok(()) }
                }
                Err(e) => {
                    self.background_failure("delete", e, |result| SyncEvent::DeleteFinished {
                        id,
                        result,
                    })
                }
            },
            TaskResult::HistoryPush { result } => {
                self.history_busy = false;
                let event = match result {
                    Ok(()) => SyncEvent::HistoryPushed { result: Ok(()) },
                    Err(e) => self.background_failure("search history push", e, |result| {
                        SyncEvent::HistoryPushed { result }
                    }),
                };
                if self.history_dirty && self.online {
                    self.history_dirty = false;
                    self.spawn_history_push();
                }
                event
            }
        }
    }

    fn background_failure(
        &mut self,
        what: &'static str,
        error: Error,
        event: impl FnOnce(Result<()>) -> SyncEvent,
    ) -> SyncEvent {
        if error == Error::RemoteUnavailable {
            let was_online = self.online;
            self.go_offline();
            if was_online {
                return SyncEvent::WentOffline;
            }
        } else {
            tracing::warn!(operation = what, error = %error, "Background sync failed");
            self.last_error = Some(error.clone());
        }
        event(Err(error))
    }

    fn records_changed(&mut self) {
        self.records_saver.notify_changed(self.records.clone());
        if self.online {
            self.request_push();
        }
    }

    fn history_changed(&mut self) {
        self.history_saver
            .notify_changed(self.history.entries().to_vec());
        if self.online && self.config.sync_search_history {
            self.request_history_push();
        }
    }

    fn request_push(&mut self) {
        if self.records_op.is_some() {
            self.records_dirty = true;
        } else {
            self.spawn_push();
        }
    }

    fn request_history_push(&mut self) {
        if self.history_busy {
            self.history_dirty = true;
        } else {
            self.spawn_history_push();
        }
    }

    fn spawn_push(&mut self) {
        self.records_op = Some(RecordsOp::Push);
        self.in_flight += 1;

        let snapshot = self.records.clone();
        let remote = self.remote.clone();
        let retry = self.config.retry.clone();
        let tx = self.results_tx.clone();

        tracing::debug!(records = snapshot.len(), "Scheduling push");
        tokio::spawn(async move {
            let result = with_retry(&retry, "push_all", || remote.push_all(snapshot.clone())).await;
            let _ = tx.send(TaskResult::Push {
                result,
                finished_at: Utc::now(),
            });
        });
    }

    fn spawn_delete(&mut self, id: RecordId) {
        self.in_flight += 1;

        let remote = self.remote.clone();
        let retry = self.config.retry.clone();
        let tx = self.results_tx.clone();
        let tombstones_written = self.tombstone_saver.flush_handle();

        tokio::spawn(async move {
            tombstones_written.flush().await;
            let result = with_retry(&retry, "delete_by_id", || remote.delete_by_id(&id)).await;
            let _ = tx.send(TaskResult::Delete { id, result });
        });
    }

    fn spawn_history_push(&mut self) {
        self.history_busy = true;
        self.in_flight += 1;

        let entries = self.history.entries().to_vec();
        let remote = self.remote.clone();
        let retry = self.config.retry.clone();
        let tx = self.results_tx.clone();

        tokio::spawn(async move {
            let result = with_retry(&retry, "push_search_history", || {
                remote.push_search_history(entries.clone())
            })
            .await;
            let _ = tx.send(TaskResult::HistoryPush { result });
        });
    }

    fn go_offline(&mut self) {
        if self.phase != SyncState::OfflineIdle {
            tracing::info!("Remote store unavailable, working offline");
        }
        self.phase = SyncState::OfflineIdle;
        self.online = false;
        self.records_dirty = false;
        self.history_dirty = false;
        self.metadata.remote_available = false;
        self.metadata_changed();
    }

    fn advance_sync_time(&mut self, at: Timestamp) {
        if self.metadata.advance(at) {
            self.metadata_changed();
        }
    }

    fn metadata_changed(&mut self) {
        self.metadata_saver.notify_changed(self.metadata.clone());
    }

    fn tombstones_changed(&mut self) {
        self.tombstone_saver
            .notify_changed(self.tombstones.all().clone());
    }

    fn forget_synced_tombstones(&mut self, remote: &RecordCollection) {
        let gone: Vec<RecordId> = self
            .tombstones
            .all()
            .iter()
            .filter(|id| !remote.contains(id))
            .cloned()
            .collect();
        let mut changed = false;
        for id in gone {
            changed |= self.tombstones.mark_synced(&id);
        }
        if changed {
            self.tombstones_changed();
        }
    }

    // ========================================================================
    // Observers
    // ========================================================================

    /// Current lifecycle state.
    pub fn state(&self) -> SyncState {
        if self.phase == SyncState::OfflineIdle {
            return SyncState::OfflineIdle;
        }
        match self.records_op {
            Some(RecordsOp::Push) => SyncState::Pushing,
            Some(RecordsOp::Pull) => SyncState::Pulling,
            None => self.phase,
        }
    }

    /// Whether any remote operation is in flight.
    pub fn is_syncing(&self) -> bool {
        self.records_op.is_some()
            || self.in_flight > 0
            || self.phase == SyncState::PullingInitial
    }

    /// Whether the remote answered the last probe and has not failed since.
    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn metadata(&self) -> &SyncMetadata {
        &self.metadata
    }

    /// The last user-visible remote failure, cleared by the next success.
    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    pub fn records(&self) -> &RecordCollection {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    /// Search history, newest first.
    pub fn search_history(&self) -> &[String] {
        self.history.entries()
    }

    pub fn tombstones(&self) -> &BTreeSet<RecordId> {
        self.tombstones.all()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("state", &self.state())
            .field("records", &self.records.len())
            .field("tombstones", &self.tombstones.len())
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

/// Run `call` until it succeeds, fails for good, or runs out of attempts.
///
/// An unreachable remote is never retried; the engine goes offline instead.
async fn with_retry<T, F, Fut>(retry: &RetryConfig, what: &'static str, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e)
                if e.is_retryable()
                    && e != Error::RemoteUnavailable
                    && attempt < retry.max_attempts =>
            {
                let delay = retry.delay_for(attempt - 1);
                tracing::warn!(
                    operation = what,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Remote call failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn fast_retry(attempts: u32) -> RetryConfig {
        RetryConfig::new(attempts).with_initial_delay(Duration::from_millis(10))
    }

    #[tokio::test(start_paused = true)]
    async fn retry_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry(&fast_retry(3), "test", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Error::remote("flaky"))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = with_retry(&fast_retry(2), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::remote("down"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_and_unavailable_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = with_retry(&fast_retry(5), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::remote_fatal("bad request"))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let result: Result<()> = with_retry(&fast_retry(5), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::RemoteUnavailable)
        })
        .await;
        assert_eq!(result, Err(Error::RemoteUnavailable));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn event_error_accessor() {
        let event = SyncEvent::PushFinished {
            result: Err(Error::remote("boom")),
        };
        assert!(event.error().is_some());
        assert!(SyncEvent::WentOffline.error().is_none());
    }
}
