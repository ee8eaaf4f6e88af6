//! # Stash Engine
//!
//! A local-first sync engine for a single collection of records.
//!
//! The UI always works against the local copy. Changes are persisted locally
//! after a short quiet period and, while a remote store is reachable, pushed to
//! it in the background. When the remote cannot be reached the engine keeps
//! working offline and reconciles on the next start or reconnect.
//!
//! ## Design Principles
//!
//! - **Local first**: every mutation succeeds locally before any network call
//! - **Single owner**: all state lives in [`SyncEngine`] behind `&mut self`;
//!   background tasks only ever see owned snapshots
//! - **Deletes stick**: a deleted id is tombstoned before the network is
//!   touched and never comes back from a pull
//! - **Pluggable edges**: storage ([`KeyValueStore`]) and the remote
//!   ([`RemoteSyncClient`]) are traits with in-memory implementations for tests
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! A [`Record`] is an id plus an opaque JSON payload. A [`RecordCollection`]
//! keeps records in insertion order with unique ids.
//!
//! ### Merge
//!
//! [`merge`](merge::merge) combines the local and remote collections on
//! startup: the remote wins on an id collision, local-only and remote-only
//! records are kept, and tombstoned ids are dropped from both sides.
//!
//! ### Persistence
//!
//! [`LocalStore`] writes each bucket (records, tombstones, metadata, search
//! history) as a versioned JSON [`Envelope`]. Unreadable or unknown-version
//! buckets load as the seed collection. Writes run on tokio's blocking pool
//! through one [`AutoSaveScheduler`] per bucket: record and search history
//! writes are debounced independently, tombstones and metadata are written
//! as soon as they change.
//!
//! ## Quick Start
//!
//! ```rust
//! use stash_engine::{
//!     EngineConfig, LocalStore, MemoryRemote, MemoryStore, Record, SyncEngine,
//!     TombstoneTracker,
//! };
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> stash_engine::error::Result<()> {
//! // 1. Local storage and a remote
//! let store = LocalStore::new(MemoryStore::new_shared());
//! let tombstones = TombstoneTracker::load(&store);
//! let remote = Arc::new(MemoryRemote::new());
//!
//! // 2. Create and start the engine
//! let mut engine = SyncEngine::new(EngineConfig::default(), store, tombstones, remote.clone());
//! engine.start().await?;
//!
//! // 3. Mutate locally; the push runs in the background
//! engine.add(Record::new("card-1", json!({"name": "Acme"})))?;
//! engine.settle().await;
//!
//! assert_eq!(remote.records().len(), 1);
//! engine.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod autosave;
pub mod config;
pub mod error;
pub mod history;
pub mod http;
pub mod merge;
pub mod record;
pub mod remote;
pub mod snapshot;
pub mod store;
pub mod sync;
pub mod tombstone;

// Re-export main types at crate root
pub use autosave::AutoSaveScheduler;
pub use config::{ConfigError, EngineConfig, RemoteConfig, RetryConfig};
pub use error::Error;
pub use history::{SearchHistory, DEFAULT_HISTORY_LIMIT};
pub use http::HttpRemote;
pub use merge::{merge, merge_with_report, MergeReport};
pub use record::{Record, RecordCollection};
pub use remote::{MemoryRemote, RemoteCall, RemoteSyncClient};
pub use snapshot::{Envelope, SyncMetadata, FORMAT_VERSION};
pub use store::{FileStore, KeyValueStore, LocalStore, MemoryStore};
pub use sync::{SyncEngine, SyncEvent, SyncState};
pub use tombstone::TombstoneTracker;

/// Type aliases for clarity
pub type RecordId = String;
pub type Timestamp = chrono::DateTime<chrono::Utc>;
