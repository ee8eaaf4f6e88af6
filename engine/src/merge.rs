//! Merge of a local and a remote record collection.
//!
//! This is the conflict policy of the engine. It is a pure function: the same
//! inputs always produce the same output.
//!
//! # Algorithm
//!
//! 1. Drop every remote record whose id is tombstoned
//! 2. Walk the local records in order; when the remote holds the same id, the
//!    remote copy replaces the local one wholesale (server wins)
//! 3. Local-only records are kept as they are
//! 4. Remote-only records are appended in remote order
//!
//! Tombstoned ids are dropped from the local side as well, so no tombstoned id
//! can appear in the output whatever the caller passes in.

use crate::{Record, RecordCollection, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What a merge did, by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    /// Ids present on both sides whose local payload was overwritten
    pub replaced: Vec<RecordId>,
    /// Ids only the remote had
    pub added: Vec<RecordId>,
    /// Ids only the local side had
    pub kept_local: Vec<RecordId>,
    /// Tombstoned ids that were dropped
    pub suppressed: Vec<RecordId>,
}

impl MergeReport {
    /// Whether the merged collection differs from the local input.
    pub fn changed_local(&self) -> bool {
        !self.replaced.is_empty() || !self.added.is_empty() || !self.suppressed.is_empty()
    }

    /// Whether the remote is missing local records or still holds deleted
    /// ones, so pushing the merged collection would change it.
    pub fn remote_is_stale(&self) -> bool {
        !self.kept_local.is_empty() || !self.suppressed.is_empty()
    }
}

/// Merge `remote` into `local`, honouring `tombstones`.
pub fn merge(
    local: &RecordCollection,
    remote: &RecordCollection,
    tombstones: &BTreeSet<RecordId>,
) -> RecordCollection {
    merge_with_report(local, remote, tombstones).0
}

/// Like [`merge`], also reporting what happened to each id.
pub fn merge_with_report(
    local: &RecordCollection,
    remote: &RecordCollection,
    tombstones: &BTreeSet<RecordId>,
) -> (RecordCollection, MergeReport) {
    let mut report = MergeReport::default();
    let mut merged = RecordCollection::new();

    for record in local {
        if tombstones.contains(&record.id) {
            report.suppressed.push(record.id.clone());
            continue;
        }

        match remote.get(&record.id) {
            Some(theirs) => {
                if theirs.payload != record.payload {
                    report.replaced.push(record.id.clone());
                }
                merged.upsert(theirs.clone());
            }
            None => {
                report.kept_local.push(record.id.clone());
                merged.upsert(record.clone());
            }
        }
    }

    for record in remote {
        if tombstones.contains(&record.id) {
            if !report.suppressed.contains(&record.id) {
                report.suppressed.push(record.id.clone());
            }
            continue;
        }
        if !merged.contains(&record.id) {
            report.added.push(record.id.clone());
            merged.upsert(record.clone());
        }
    }

    (merged, report)
}

/// Drop tombstoned records from a collection without merging.
///
/// Used by the wholesale "pull from remote" path, which bypasses [`merge`]
/// but must still never resurrect a deleted record.
pub fn without_tombstoned(
    records: RecordCollection,
    tombstones: &BTreeSet<RecordId>,
) -> RecordCollection {
    records
        .into_iter()
        .filter(|r: &Record| !tombstones.contains(&r.id))
        .collect()
}
