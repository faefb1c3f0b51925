// SPDX-License-Identifier: MIT

//! Outbound RPC surface: requests the coordinator initiates against tablet
//! servers and compactors.

use cc_core::{ExternalCompactionId, JobDescriptor};
use serde::{Deserialize, Serialize};

/// One `(queue, priority)` pair as advertised by a tablet server's
/// `getCompactionQueueInfo` response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueSummary {
    pub queue: String,
    pub priority: i64,
}

/// Request the coordinator sends to a tablet server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum TabletServerRequest {
    /// Polled every `T_poll` by the `QueuePoller`. §4.3.
    GetCompactionQueueInfo,

    /// Issued by the `Dispatcher` against the tsi `pickHighest` returned.
    /// §4.4.
    ReserveCompactionJob { queue: String, priority: i64, compactor_address: String },

    /// Issued after `compactionCompleted`, with retry. §4.5.
    CompactionJobFinished { id: ExternalCompactionId, file_size: u64, entries_written: u64 },
}

/// Response from a tablet server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum TabletServerResponse {
    QueueInfo { queues: Vec<QueueSummary> },

    /// `external_compaction_id: None` is the §4.4(d) / S5 "advertised but had
    /// no job ready" case; the Dispatcher must move on to the next candidate
    /// rather than treat it as a hard failure.
    Reservation { external_compaction_id: Option<ExternalCompactionId>, job: Option<JobDescriptor> },

    Ack,
}

/// Request the coordinator sends to a compactor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum CompactorRequest {
    /// Best-effort cancel fan-out from `cancelCompaction` and the
    /// `MembershipReactor`. §4.5, §4.6.
    Cancel { id: ExternalCompactionId },
}

/// Response from a compactor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum CompactorResponse {
    Ack,
}

#[cfg(test)]
#[path = "outbound_tests.rs"]
mod tests;
