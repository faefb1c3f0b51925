// SPDX-License-Identifier: MIT

//! Responses the coordinator sends back across the inbound RPC surface.

use cc_core::{CompactionStats, ExternalCompactionId, JobDescriptor, StatusUpdate};
use serde::{Deserialize, Serialize};

/// A reserved job handed back from `getCompactionJob`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobAssignment {
    pub external_compaction_id: ExternalCompactionId,
    pub job: JobDescriptor,
}

/// Response from the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum CoordinatorResponse {
    /// Generic success (cancel, or any handler with nothing to report).
    Ok,

    /// `getCompactionJob` result; `None` is the empty-job sentinel.
    Job { assignment: Option<JobAssignment> },

    /// `getCompactionStatus` result; empty list if the id is unknown. This
    /// surface never throws on an unknown id.
    StatusUpdates { updates: Vec<StatusUpdate> },

    /// `isCompactionCompleted` result. `None` if the entry exists but is not
    /// yet complete (the "empty stats" sentinel); the entry is absent
    /// entirely only via `UnknownCompactionId`.
    CompletionStatus { stats: Option<CompactionStats> },

    /// Diagnostic snapshot for `GetCoordinatorStatus`.
    CoordinatorStatus {
        uptime_secs: u64,
        queue_count: usize,
        advertisement_count: usize,
        tserver_count: usize,
        running_count: usize,
        jobs_dispatched: u64,
        jobs_completed: u64,
        jobs_orphaned: u64,
        poll_cycles: u64,
        poll_failures: u64,
    },

    /// The referenced id is not present in the running table. Raised
    /// for `updateCompactionStatus`, `compactionCompleted`,
    /// `isCompactionCompleted`; never for `cancelCompaction` or
    /// `getCompactionStatus`, which treat an unknown id as a silent no-op.
    UnknownCompactionId { id: ExternalCompactionId },

    /// Anything else that went wrong serving the request.
    Error { message: String },
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
