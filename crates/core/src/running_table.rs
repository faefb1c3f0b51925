// SPDX-License-Identifier: MIT

//! The table of reservations currently out with a compactor.
//!
//! Each entry gets its own `Arc<Mutex<RunningCompaction>>` behind an outer
//! map mutex, so a status update for one compaction never blocks a lookup
//! or removal of another — the same "map mutex for membership, per-entry
//! mutex for content" split the teacher's connection registries use.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::CoordinatorError;
use crate::id::ExternalCompactionId;
use crate::running::RunningCompaction;
use crate::tserver::TabletServerId;

/// Reservations currently checked out to a compactor.
pub struct RunningTable {
    entries: Mutex<HashMap<ExternalCompactionId, Arc<Mutex<RunningCompaction>>>>,
}

impl Default for RunningTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RunningTable {
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    /// Insert a freshly reserved compaction. Fails if the id is already
    /// present — ids are generated fresh per reservation, so a collision
    /// means a caller reused one.
    pub fn insert(&self, rc: RunningCompaction) -> Result<(), CoordinatorError> {
        let mut entries = self.entries.lock();
        if entries.contains_key(&rc.external_compaction_id) {
            return Err(CoordinatorError::DuplicateCompactionId(rc.external_compaction_id));
        }
        entries.insert(rc.external_compaction_id, Arc::new(Mutex::new(rc)));
        Ok(())
    }

    /// Snapshot the current state of one entry.
    pub fn get(&self, id: &ExternalCompactionId) -> Option<RunningCompaction> {
        let handle = self.entries.lock().get(id).cloned()?;
        Some(handle.lock().clone())
    }

    /// Unconditional removal, used once a tablet server has acknowledged
    /// completion or a cancel has fully drained.
    pub fn remove(&self, id: &ExternalCompactionId) -> Option<RunningCompaction> {
        let handle = self.entries.lock().remove(id)?;
        Some(handle.lock().clone())
    }

    /// Remove `id` only if its current state still matches `expected`
    /// (compared by lifecycle and stats). Used after a `compactionCompleted`
    /// ack to avoid dropping an entry a concurrent cancel has since touched.
    pub fn remove_if_unchanged(&self, id: &ExternalCompactionId, expected: &RunningCompaction) -> bool {
        let mut entries = self.entries.lock();
        let Some(handle) = entries.get(id).cloned() else {
            return false;
        };
        let matches = {
            let current = handle.lock();
            current.lifecycle == expected.lifecycle && current.stats == expected.stats
        };
        if matches {
            entries.remove(id);
        }
        matches
    }

    /// All external compaction ids currently reserved against `tsi`. Used by
    /// the membership reactor to fan out cancellations when a tablet server
    /// drops out.
    pub fn by_tserver(&self, tsi: &TabletServerId) -> Vec<ExternalCompactionId> {
        self.entries
            .lock()
            .iter()
            .filter(|(_, handle)| &handle.lock().tserver == tsi)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Append a status update to `id`. Returns an error if the id is not
    /// present.
    pub fn add_update(
        &self,
        id: &ExternalCompactionId,
        received_at_epoch_ms: u64,
        state: crate::job::CompactionStatusKind,
        message: String,
    ) -> Result<(), CoordinatorError> {
        self.with_entry(id, |rc| rc.add_update(received_at_epoch_ms, state, message))
    }

    /// Record final stats and mark `id` completed. Returns an error if the
    /// id is not present.
    pub fn complete(
        &self,
        id: &ExternalCompactionId,
        stats: crate::job::CompactionStats,
    ) -> Result<(), CoordinatorError> {
        self.with_entry(id, |rc| rc.complete(stats))
    }

    /// Move `id` to `CANCELLING`. Returns an error if the id is not present.
    pub fn begin_cancel(&self, id: &ExternalCompactionId) -> Result<(), CoordinatorError> {
        self.with_entry(id, |rc| rc.begin_cancel())
    }

    fn with_entry<F: FnOnce(&mut RunningCompaction)>(
        &self,
        id: &ExternalCompactionId,
        f: F,
    ) -> Result<(), CoordinatorError> {
        let handle = self.entries.lock().get(id).cloned();
        match handle {
            Some(handle) => {
                f(&mut handle.lock());
                Ok(())
            }
            None => Err(CoordinatorError::UnknownCompactionId(*id)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{CompactionStats, CompactionStatusKind, JobDescriptor};
    use crate::job_index::JobIndex;

    fn sample_rc(tsi: TabletServerId) -> RunningCompaction {
        let queue = JobIndex::new().intern("Q");
        let job = JobDescriptor {
            tablet_extent: "table1;row1".to_string(),
            files: vec!["f1.rf".to_string()],
            queue,
            priority: 10,
        };
        RunningCompaction::reserved(ExternalCompactionId::new(), job, "c1:9000", tsi)
    }

    #[test]
    fn insert_then_get_round_trips() {
        let table = RunningTable::new();
        let rc = sample_rc(TabletServerId::new("t1", 9000, "tok"));
        let id = rc.external_compaction_id;
        table.insert(rc).unwrap();
        assert!(table.get(&id).is_some());
    }

    #[test]
    fn insert_duplicate_id_fails() {
        let table = RunningTable::new();
        let rc = sample_rc(TabletServerId::new("t1", 9000, "tok"));
        let mut dup = rc.clone();
        dup.job.priority = 99; // same id, different body
        table.insert(rc).unwrap();
        let err = table.insert(dup).unwrap_err();
        assert!(matches!(err, CoordinatorError::DuplicateCompactionId(_)));
    }

    #[test]
    fn get_on_unknown_id_is_none() {
        let table = RunningTable::new();
        assert!(table.get(&ExternalCompactionId::new()).is_none());
    }

    #[test]
    fn add_update_on_unknown_id_errors() {
        let table = RunningTable::new();
        let err = table
            .add_update(&ExternalCompactionId::new(), 1, CompactionStatusKind::Started, "x".into())
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::UnknownCompactionId(_)));
    }

    #[test]
    fn add_update_transitions_lifecycle_in_place() {
        let table = RunningTable::new();
        let rc = sample_rc(TabletServerId::new("t1", 9000, "tok"));
        let id = rc.external_compaction_id;
        table.insert(rc).unwrap();
        table.add_update(&id, 1, CompactionStatusKind::Started, "go".into()).unwrap();
        let got = table.get(&id).unwrap();
        assert_eq!(got.lifecycle, crate::running::Lifecycle::InProgress);
        assert_eq!(got.updates.len(), 1);
    }

    #[test]
    fn by_tserver_only_returns_matching_entries() {
        let table = RunningTable::new();
        let t1 = TabletServerId::new("t1", 9000, "tok1");
        let t2 = TabletServerId::new("t2", 9000, "tok2");
        let rc1 = sample_rc(t1.clone());
        let rc2 = sample_rc(t2.clone());
        let id1 = rc1.external_compaction_id;
        table.insert(rc1).unwrap();
        table.insert(rc2).unwrap();
        let ids = table.by_tserver(&t1);
        assert_eq!(ids, vec![id1]);
    }

    #[test]
    fn remove_if_unchanged_rejects_stale_expectation() {
        let table = RunningTable::new();
        let rc = sample_rc(TabletServerId::new("t1", 9000, "tok"));
        let id = rc.external_compaction_id;
        let stale = rc.clone();
        table.insert(rc).unwrap();
        table.complete(&id, CompactionStats { file_size: 1, entries_written: 1 }).unwrap();
        assert!(!table.remove_if_unchanged(&id, &stale), "entry changed since `stale` was captured");
        assert!(table.get(&id).is_some(), "mismatched removal must not remove the entry");
    }

    #[test]
    fn remove_if_unchanged_removes_matching_entry() {
        let table = RunningTable::new();
        let rc = sample_rc(TabletServerId::new("t1", 9000, "tok"));
        let id = rc.external_compaction_id;
        table.insert(rc.clone()).unwrap();
        assert!(table.remove_if_unchanged(&id, &rc));
        assert!(table.get(&id).is_none());
    }

    #[test]
    fn remove_is_unconditional() {
        let table = RunningTable::new();
        let rc = sample_rc(TabletServerId::new("t1", 9000, "tok"));
        let id = rc.external_compaction_id;
        table.insert(rc).unwrap();
        assert!(table.remove(&id).is_some());
        assert!(table.remove(&id).is_none());
    }
}
