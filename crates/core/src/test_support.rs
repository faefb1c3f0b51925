// SPDX-License-Identifier: MIT

//! Shared test builders, exported behind `test-support` so downstream crates
//! (`cc-coordinator`'s integration tests) can build fixtures without
//! duplicating them.

use crate::job::JobDescriptor;
use crate::job_index::JobIndex;
use crate::tserver::TabletServerId;

/// A tablet server identity with a predictable address, for tests that don't
/// care about the exact host/port/token.
pub fn fake_tserver(n: u16) -> TabletServerId {
    TabletServerId::new("127.0.0.1", 9000 + n, format!("session-{n}"))
}

/// A minimal job descriptor in queue `queue` at `priority`, interned against
/// a throwaway [`JobIndex`]. Fine for tests that only inspect the job body,
/// not ones that need the queue name to compare equal to one interned by the
/// system under test.
pub fn fake_job(queue: &str, priority: i64) -> JobDescriptor {
    JobDescriptor {
        tablet_extent: "table1;row1".to_string(),
        files: vec!["f1.rf".to_string()],
        queue: JobIndex::new().intern(queue),
        priority,
    }
}
