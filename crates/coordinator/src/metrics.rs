// SPDX-License-Identifier: MIT

//! Plain atomic counters surfaced via `GetCoordinatorStatus`, the same
//! scaled-down shape as the teacher's usage-metrics collector: one
//! `AtomicU64` per event, no histograms, no external metrics sink.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct Metrics {
    jobs_dispatched: AtomicU64,
    jobs_completed: AtomicU64,
    jobs_orphaned: AtomicU64,
    poll_cycles: AtomicU64,
    poll_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MetricsSnapshot {
    pub jobs_dispatched: u64,
    pub jobs_completed: u64,
    pub jobs_orphaned: u64,
    pub poll_cycles: u64,
    pub poll_failures: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn job_dispatched(&self) {
        self.jobs_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn job_completed(&self) {
        self.jobs_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn job_orphaned(&self) {
        self.jobs_orphaned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn poll_cycle(&self) {
        self.poll_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn poll_failure(&self) {
        self.poll_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            jobs_dispatched: self.jobs_dispatched.load(Ordering::Relaxed),
            jobs_completed: self.jobs_completed.load(Ordering::Relaxed),
            jobs_orphaned: self.jobs_orphaned.load(Ordering::Relaxed),
            poll_cycles: self.poll_cycles.load(Ordering::Relaxed),
            poll_failures: self.poll_failures.load(Ordering::Relaxed),
        }
    }
}
