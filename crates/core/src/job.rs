// SPDX-License-Identifier: MIT

//! The compaction job descriptor and the states compactors report.

use serde::{Deserialize, Serialize};

use crate::queue::QueueName;

/// Opaque descriptor of one compaction job, as returned by a tablet server's
/// `reserveCompactionJob` RPC. The coordinator never interprets `files` or
/// `tablet_extent` — it only stores and relays them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub tablet_extent: String,
    pub files: Vec<String>,
    pub queue: QueueName,
    pub priority: i64,
}

/// Compaction states reported by compactors via `updateCompactionStatus`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompactionStatusKind {
    Started,
    InProgress,
    Succeeded,
    Failed,
    Cancelled,
}

impl std::fmt::Display for CompactionStatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CompactionStatusKind::Started => "STARTED",
            CompactionStatusKind::InProgress => "IN_PROGRESS",
            CompactionStatusKind::Succeeded => "SUCCEEDED",
            CompactionStatusKind::Failed => "FAILED",
            CompactionStatusKind::Cancelled => "CANCELLED",
        };
        write!(f, "{s}")
    }
}

/// Final counters reported by `compactionCompleted`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompactionStats {
    pub file_size: u64,
    pub entries_written: u64,
}
