//! Debounced local persistence.
//!
//! An [`AutoSaveScheduler`] owns a background task that waits for a stream of
//! snapshots to go quiet for `interval` and then writes only the latest one.
//! Every new snapshot restarts the wait. Writes run on tokio's blocking pool,
//! never on the task that owns the engine.
//!
//! A zero interval makes the scheduler an ordered write-behind queue: each
//! snapshot is written as soon as the task sees it, and only snapshots that
//! queued up during a write are coalesced.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Writes a snapshot somewhere durable.
pub type SaveFn<T> = Arc<dyn Fn(T) + Send + Sync>;

enum Command<T> {
    Changed(T),
    Flush(oneshot::Sender<()>),
}

/// Coalesces bursts of snapshots into one write after a quiet period.
///
/// Independent streams (records, search history) each get their own
/// scheduler and therefore their own timer.
pub struct AutoSaveScheduler<T> {
    name: &'static str,
    interval: Duration,
    tx: mpsc::UnboundedSender<Command<T>>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> AutoSaveScheduler<T> {
    /// Spawn the scheduler task on the current tokio runtime.
    pub fn spawn<F>(name: &'static str, interval: Duration, save: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(name, interval, rx, Arc::new(save)));

        Self {
            name,
            interval,
            tx,
            task,
        }
    }

    /// Hand over the latest snapshot and restart the quiet-period timer.
    pub fn notify_changed(&self, snapshot: T) {
        if self.tx.send(Command::Changed(snapshot)).is_err() {
            tracing::warn!(stream = self.name, "Auto-save task is gone, change not persisted");
        }
    }

    /// Write any pending snapshot now and wait until it is written.
    pub async fn flush(&self) {
        flush(&self.tx).await;
    }

    /// A handle that can flush this scheduler from another task.
    pub fn flush_handle(&self) -> FlushHandle<T> {
        FlushHandle {
            tx: self.tx.clone(),
        }
    }

    /// Stop accepting snapshots, write the pending one and wait for the task.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.task.await {
            tracing::warn!(stream = self.name, error = %e, "Auto-save task failed");
        }
    }

    /// The quiet period.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<T> std::fmt::Debug for AutoSaveScheduler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoSaveScheduler")
            .field("name", &self.name)
            .field("interval", &self.interval)
            .finish()
    }
}

/// Flushes an [`AutoSaveScheduler`] from a spawned task.
pub struct FlushHandle<T> {
    tx: mpsc::UnboundedSender<Command<T>>,
}

impl<T> FlushHandle<T> {
    /// Wait until every snapshot handed over so far is written.
    pub async fn flush(&self) {
        flush(&self.tx).await;
    }
}

impl<T> Clone for FlushHandle<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

async fn flush<T>(tx: &mpsc::UnboundedSender<Command<T>>) {
    let (ack_tx, ack_rx) = oneshot::channel();
    if tx.send(Command::Flush(ack_tx)).is_ok() {
        let _ = ack_rx.await;
    }
}

async fn run<T: Send + 'static>(
    name: &'static str,
    interval: Duration,
    mut rx: mpsc::UnboundedReceiver<Command<T>>,
    save: SaveFn<T>,
) {
    let mut pending: Option<T> = None;

    loop {
        let command = if pending.is_none() {
            rx.recv().await
        } else {
            // A fresh sleep on every pass resets the window on activity
            tokio::select! {
                command = rx.recv() => command,
                _ = tokio::time::sleep(interval) => {
                    write(name, &save, pending.take()).await;
                    continue;
                }
            }
        };

        match command {
            Some(Command::Changed(snapshot)) => pending = Some(snapshot),
            Some(Command::Flush(ack)) => {
                write(name, &save, pending.take()).await;
                let _ = ack.send(());
            }
            None => {
                write(name, &save, pending.take()).await;
                break;
            }
        }
    }

    tracing::debug!(stream = name, "Auto-save task stopped");
}

async fn write<T: Send + 'static>(name: &'static str, save: &SaveFn<T>, snapshot: Option<T>) {
    let Some(snapshot) = snapshot else {
        return;
    };
    tracing::debug!(stream = name, "Writing debounced snapshot");

    let save = save.clone();
    if let Err(e) = tokio::task::spawn_blocking(move || save(snapshot)).await {
        tracing::warn!(stream = name, error = %e, "Snapshot write panicked");
    }
}
