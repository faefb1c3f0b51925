// SPDX-License-Identifier: MIT

//! Error taxonomy shared by the core data structures.
//!
//! `UnknownCompactionId` is the only error the core data structures
//! themselves raise; everything else (transient RPC failures, stale tablet
//! servers, lock loss) is a concern of the coordinator crate's handlers, not
//! of the data structures.

use thiserror::Error;

use crate::id::ExternalCompactionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("unknown external compaction id: {0}")]
    UnknownCompactionId(ExternalCompactionId),

    #[error("external compaction id already present in running table: {0}")]
    DuplicateCompactionId(ExternalCompactionId),
}
