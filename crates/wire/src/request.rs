// SPDX-License-Identifier: MIT

//! Inbound RPC surface: requests compactors and tablet servers send to the
//! coordinator.

use cc_core::{CompactionStatusKind, ExternalCompactionId};
use serde::{Deserialize, Serialize};

/// Request to the coordinator, from a compactor or a tablet server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum CoordinatorRequest {
    /// Compactor pulling a job from `queue`. §4.4.
    GetCompactionJob { queue: String, compactor_address: String },

    /// Compactor reporting progress. §4.5.
    UpdateCompactionStatus {
        id: ExternalCompactionId,
        state: CompactionStatusKind,
        message: String,
        timestamp_epoch_ms: u64,
    },

    /// Compactor reporting final counters. §4.5.
    CompactionCompleted { id: ExternalCompactionId, file_size: u64, entries_written: u64 },

    /// Tablet server asking to abandon a reservation. §4.5.
    CancelCompaction { id: ExternalCompactionId },

    /// Tablet server polling for the update log. §4.5.
    GetCompactionStatus { id: ExternalCompactionId },

    /// Tablet server polling for completion. §4.5.
    IsCompactionCompleted { id: ExternalCompactionId },

    /// Diagnostic snapshot of coordinator state, for `ccctl status`.
    GetCoordinatorStatus,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
