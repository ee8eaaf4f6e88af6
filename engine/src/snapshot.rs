//! Versioned envelopes for persisted state, and the sync metadata record.
//!
//! Every bucket the engine writes to local storage is wrapped in an
//! [`Envelope`] carrying a format version, so a future format change can be
//! detected instead of silently misread.

use crate::{error::Result, Error, Timestamp};
use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Version of the on-disk format for future compatibility.
pub const FORMAT_VERSION: u32 = 1;

/// A persisted value with its format version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    /// Format version the data was written with
    pub format_version: u32,
    /// When the envelope was written
    pub saved_at: Timestamp,
    /// The wrapped value
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    /// Wrap a value with the current format version.
    pub fn new(data: T) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            saved_at: Utc::now(),
            data,
        }
    }

    /// Serialize to JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Codec(e.to_string()))
    }
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Deserialize from JSON bytes, rejecting formats newer than this build.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let envelope: Self =
            serde_json::from_slice(bytes).map_err(|e| Error::Codec(e.to_string()))?;

        if envelope.format_version > FORMAT_VERSION {
            return Err(Error::Codec(format!(
                "unsupported format version: {} (max supported: {})",
                envelope.format_version, FORMAT_VERSION
            )));
        }

        Ok(envelope)
    }
}

/// Small sync bookkeeping persisted next to the records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetadata {
    /// When the last full round trip completed. Only ever moves forward.
    pub last_sync_time: Option<Timestamp>,
    /// Whether the remote answered the last availability probe
    pub remote_available: bool,
}

impl SyncMetadata {
    /// Move `last_sync_time` forward to `at`. Older values are ignored.
    ///
    /// Returns whether the timestamp changed.
    pub fn advance(&mut self, at: Timestamp) -> bool {
        match self.last_sync_time {
            Some(current) if current >= at => false,
            _ => {
                self.last_sync_time = Some(at);
                true
            }
        }
    }
}
