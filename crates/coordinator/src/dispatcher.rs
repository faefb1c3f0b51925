// SPDX-License-Identifier: MIT

//! `Dispatcher` — the `getCompactionJob` scheduling handshake.

use std::sync::Arc;

use cc_core::{ExternalCompactionId, JobDescriptor, JobIndex, RunningCompaction, RunningTable};
use tracing::{info, warn};

use crate::metrics::Metrics;
use crate::rpc_client::TabletServerClient;

/// Empty-job sentinel: the queue ran dry (or every candidate tsi either
/// failed the reservation RPC or had nothing ready).
pub struct DispatchResult {
    pub assignment: Option<(ExternalCompactionId, JobDescriptor)>,
}

impl DispatchResult {
    fn empty() -> Self {
        Self { assignment: None }
    }
}

pub struct Dispatcher {
    job_index: Arc<JobIndex>,
    running: Arc<RunningTable>,
    tserver_client: Arc<dyn TabletServerClient>,
    metrics: Arc<Metrics>,
}

impl Dispatcher {
    pub fn new(
        job_index: Arc<JobIndex>,
        running: Arc<RunningTable>,
        tserver_client: Arc<dyn TabletServerClient>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { job_index, running, tserver_client, metrics }
    }

    /// Pick the highest-priority candidate, reserve against it, and retry the
    /// next candidate on any kind of non-reservation. Each iteration removes
    /// one candidate from `JobIndex`, so the loop always terminates — worst
    /// case it empties the queue and returns the sentinel.
    pub async fn get_compaction_job(&self, queue_name: &str, compactor_address: &str) -> DispatchResult {
        let queue = self.job_index.intern(queue_name);
        loop {
            let Some((priority, tsi)) = self.job_index.pick_highest(&queue) else {
                return DispatchResult::empty();
            };

            let reservation = self
                .tserver_client
                .reserve_compaction_job(&tsi, queue.as_str(), priority, compactor_address)
                .await;

            let (external_compaction_id, job) = match reservation {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(%tsi, queue = queue.as_str(), error = %e, "reservation rpc failed; trying next candidate");
                    continue;
                }
            };

            let (Some(id), Some(job)) = (external_compaction_id, job) else {
                info!(%tsi, queue = queue.as_str(), "advertised but had no job ready; trying next candidate");
                continue;
            };

            let rc = RunningCompaction::reserved(id, job.clone(), compactor_address, tsi);
            if let Err(e) = self.running.insert(rc) {
                // `ExternalCompactionId`s are freshly generated per reservation; a
                // collision here means the tablet server replayed a stale id.
                warn!(error = %e, "tablet server returned a duplicate external compaction id");
                continue;
            }
            self.metrics.job_dispatched();
            return DispatchResult { assignment: Some((id, job)) };
        }
    }
}
