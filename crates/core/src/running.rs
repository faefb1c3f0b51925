// SPDX-License-Identifier: MIT

//! A single in-flight reserved compaction and its state machine.
//!
//! ```text
//!   RESERVED ──update()──▶ IN_PROGRESS ──update()──▶ IN_PROGRESS
//!       │                        │
//!       │                        └──completed()──▶ COMPLETED
//!       │
//!       └──cancel()──▶ CANCELLING
//! ```
//!
//! Terminal removal from [`crate::running_table::RunningTable`] happens
//! outside this type, once the tablet server has acknowledged completion or
//! cancellation has run its course.

use serde::{Deserialize, Serialize};

use crate::id::ExternalCompactionId;
use crate::job::{CompactionStats, CompactionStatusKind, JobDescriptor};
use crate::tserver::TabletServerId;

/// One entry in a [`RunningCompaction`]'s status log. Order is by receipt,
/// not by the `timestamp` field — a compactor's clock is not trusted for
/// ordering, only recorded for display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub received_at_epoch_ms: u64,
    pub state: CompactionStatusKind,
    pub message: String,
}

/// The lifecycle state of a [`RunningCompaction`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    Reserved,
    InProgress,
    Completed,
    Cancelling,
}

/// A job that has been reserved from a tablet server and handed to a
/// compactor; tracked in [`crate::running_table::RunningTable`] from
/// reservation until drained.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunningCompaction {
    pub external_compaction_id: ExternalCompactionId,
    pub job: JobDescriptor,
    pub compactor_address: String,
    pub tserver: TabletServerId,
    pub updates: Vec<StatusUpdate>,
    pub stats: Option<CompactionStats>,
    pub lifecycle: Lifecycle,
}

impl RunningCompaction {
    /// Construct a freshly-reserved compaction. Initial state is `RESERVED`:
    /// the moment the Dispatcher successfully reserves a job.
    pub fn reserved(
        external_compaction_id: ExternalCompactionId,
        job: JobDescriptor,
        compactor_address: impl Into<String>,
        tserver: TabletServerId,
    ) -> Self {
        Self {
            external_compaction_id,
            job,
            compactor_address: compactor_address.into(),
            tserver,
            updates: Vec::new(),
            stats: None,
            lifecycle: Lifecycle::Reserved,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.lifecycle == Lifecycle::Completed
    }

    pub fn is_cancelling(&self) -> bool {
        self.lifecycle == Lifecycle::Cancelling
    }

    /// Append a status update in arrival order. `RESERVED` transitions to
    /// `IN_PROGRESS` on the first update; subsequent updates stay
    /// `IN_PROGRESS`. A completed or cancelling entry still accepts updates
    /// (a straggling status report after completion is not an error) but
    /// does not regress its lifecycle state.
    pub fn add_update(&mut self, received_at_epoch_ms: u64, state: CompactionStatusKind, message: String) {
        if self.lifecycle == Lifecycle::Reserved {
            self.lifecycle = Lifecycle::InProgress;
        }
        self.updates.push(StatusUpdate { received_at_epoch_ms, state, message });
    }

    /// Record final stats and mark the entry completed.
    pub fn complete(&mut self, stats: CompactionStats) {
        self.stats = Some(stats);
        self.lifecycle = Lifecycle::Completed;
    }

    /// Move to `CANCELLING`. A no-op if already completed — a job that
    /// finished before the cancel request arrived should not be resurrected
    /// into cancelling state.
    pub fn begin_cancel(&mut self) {
        if self.lifecycle != Lifecycle::Completed {
            self.lifecycle = Lifecycle::Cancelling;
        }
    }
}
