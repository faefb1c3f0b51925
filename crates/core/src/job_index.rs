// SPDX-License-Identifier: MIT

//! The priority-ordered index of pending compaction advertisements.
//!
//! A single mutex guards both the forward map (queue -> priority -> tablet
//! servers) and the reverse map (tablet server -> (queue, priority) pairs),
//! plus the queue-name interner, so the structure's invariants are enforced
//! inside this one critical section rather than spread across callers: one
//! `parking_lot::Mutex` wrapping everything a handler needs, held only for
//! the duration of a pure map mutation, never across an RPC.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::queue::{Descending, QueueAndPriority, QueueName};
use crate::tserver::TabletServerId;

struct Inner {
    /// queue -> priority (descending) -> insertion-ordered tablet servers.
    forward: HashMap<QueueName, BTreeMap<Descending, VecDeque<TabletServerId>>>,
    /// tablet server -> the (queue, priority) pairs it's currently advertised into.
    reverse: HashMap<TabletServerId, HashSet<QueueAndPriority>>,
    /// canonical queue-name strings, so identical names compare by Arc identity.
    interner: HashMap<String, Arc<str>>,
}

impl Inner {
    fn new() -> Self {
        Self { forward: HashMap::new(), reverse: HashMap::new(), interner: HashMap::new() }
    }

    fn intern(&mut self, name: &str) -> QueueName {
        if let Some(existing) = self.interner.get(name) {
            return QueueName::from_arc(Arc::clone(existing));
        }
        let arc: Arc<str> = Arc::from(name);
        self.interner.insert(name.to_string(), Arc::clone(&arc));
        QueueName::from_arc(arc)
    }

    fn add(&mut self, tsi: TabletServerId, qp: QueueAndPriority) {
        let bucket = self
            .forward
            .entry(qp.queue.clone())
            .or_default()
            .entry(Descending::from(qp.priority))
            .or_default();
        if !bucket.contains(&tsi) {
            bucket.push_back(tsi.clone());
        }
        self.reverse.entry(tsi).or_default().insert(qp);
    }

    fn remove_tserver(&mut self, tsi: &TabletServerId) -> Vec<QueueAndPriority> {
        let Some(pairs) = self.reverse.remove(tsi) else {
            return Vec::new();
        };
        for qp in &pairs {
            if let Some(by_priority) = self.forward.get_mut(&qp.queue) {
                let key = Descending::from(qp.priority);
                let emptied = if let Some(bucket) = by_priority.get_mut(&key) {
                    bucket.retain(|t| t != tsi);
                    bucket.is_empty()
                } else {
                    false
                };
                if emptied {
                    by_priority.remove(&key);
                }
                if by_priority.is_empty() {
                    self.forward.remove(&qp.queue);
                }
            }
        }
        pairs.into_iter().collect()
    }

    fn pick_highest(&mut self, queue: &QueueName) -> Option<(i64, TabletServerId)> {
        let by_priority = self.forward.get_mut(queue)?;
        let (&key, bucket) = by_priority.iter_mut().next()?;
        let tsi = bucket.pop_front()?;
        let emptied = bucket.is_empty();
        if emptied {
            by_priority.remove(&key);
        }
        if by_priority.is_empty() {
            self.forward.remove(queue);
        }
        if let Some(pairs) = self.reverse.get_mut(&tsi) {
            pairs.remove(&QueueAndPriority { queue: queue.clone(), priority: key.priority() });
            if pairs.is_empty() {
                self.reverse.remove(&tsi);
            }
        }
        Some((key.priority(), tsi))
    }
}

/// A snapshot of [`JobIndex`] contents for diagnostics (`getCoordinatorStatus`
/// in the RPC surface, or `ccctl status`).
#[derive(Debug, Clone, Default)]
pub struct JobIndexSnapshot {
    /// Number of distinct queues with at least one pending advertisement.
    pub queue_count: usize,
    /// Total number of (queue, priority, tserver) advertisements outstanding.
    pub advertisement_count: usize,
    /// Number of distinct tablet servers with at least one advertisement.
    pub tserver_count: usize,
}

/// Priority-ordered multiset of (queue, priority, tablet-server) tuples with
/// O(1) reverse lookup by tablet server.
pub struct JobIndex {
    inner: Mutex<Inner>,
}

impl Default for JobIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl JobIndex {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner::new()) }
    }

    /// Canonicalize a queue name so repeated advertisements of the same
    /// queue compare by `Arc` identity. Safe to call from outside the
    /// poll/dispatch path (e.g. to build a `QueueAndPriority` for a lookup).
    pub fn intern(&self, name: &str) -> QueueName {
        self.inner.lock().intern(name)
    }

    /// Idempotent: advertising the same (tsi, queue, priority) twice is a
    /// no-op the second time.
    pub fn add(&self, tsi: TabletServerId, queue: &str, priority: i64) {
        let mut inner = self.inner.lock();
        let queue = inner.intern(queue);
        inner.add(tsi, QueueAndPriority { queue, priority });
    }

    /// Removes `tsi` from every bucket it appears in. Returns what was
    /// removed so callers can log it.
    pub fn remove_tserver(&self, tsi: &TabletServerId) -> Vec<QueueAndPriority> {
        self.inner.lock().remove_tserver(tsi)
    }

    /// Returns the highest-priority bucket's earliest-inserted tablet server
    /// for `queue`, atomically removing it from the index. `None` if the
    /// queue has no entries.
    pub fn pick_highest(&self, queue: &QueueName) -> Option<(i64, TabletServerId)> {
        self.inner.lock().pick_highest(queue)
    }

    pub fn snapshot(&self) -> JobIndexSnapshot {
        let inner = self.inner.lock();
        let advertisement_count =
            inner.forward.values().flat_map(|m| m.values()).map(|b| b.len()).sum();
        JobIndexSnapshot {
            queue_count: inner.forward.len(),
            advertisement_count,
            tserver_count: inner.reverse.len(),
        }
    }

    /// Panics only in tests: asserts the forward/reverse maps agree and that
    /// no empty bucket or priority map is left behind. Exposed for property
    /// tests that mutate the index through a sequence of operations and then
    /// check consistency.
    #[cfg(any(test, feature = "test-support"))]
    pub fn assert_invariants(&self) {
        let inner = self.inner.lock();
        for (queue, by_priority) in &inner.forward {
            assert!(!by_priority.is_empty(), "empty priority map left for queue {queue:?}");
            for (priority, bucket) in by_priority {
                assert!(!bucket.is_empty(), "empty bucket left at {queue:?}/{priority:?}");
                for tsi in bucket {
                    let qp = QueueAndPriority { queue: queue.clone(), priority: priority.priority() };
                    assert!(
                        inner.reverse.get(tsi).is_some_and(|s| s.contains(&qp)),
                        "forward entry {tsi:?} in {qp:?} missing from reverse map"
                    );
                }
            }
        }
        for (tsi, pairs) in &inner.reverse {
            assert!(!pairs.is_empty(), "empty reverse entry left for {tsi:?}");
            for qp in pairs {
                let present = inner
                    .forward
                    .get(&qp.queue)
                    .and_then(|m| m.get(&Descending::from(qp.priority)))
                    .is_some_and(|b| b.contains(tsi));
                assert!(present, "reverse entry {qp:?} for {tsi:?} missing from forward map");
            }
        }
    }
}

#[cfg(test)]
#[path = "job_index_tests.rs"]
mod tests;
