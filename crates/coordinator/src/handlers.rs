// SPDX-License-Identifier: MIT

//! `LifecycleHandlers` — the four compactor/tablet-server-facing RPCs that
//! drive a [`RunningCompaction`] from reservation to removal.
//! `getCompactionJob`/`pickHighest` (the dispatch half) live in
//! [`crate::dispatcher`]; this module is everything downstream of a
//! reservation already existing in the [`RunningTable`].

use std::sync::Arc;
use std::time::Duration;

use cc_core::{
    Clock, CompactionStats, CompactionStatusKind, CoordinatorError, ExternalCompactionId, RunningTable,
    StatusUpdate,
};
use tracing::warn;

use crate::error::RuntimeError;
use crate::metrics::Metrics;
use crate::retry::retry_with_backoff;
use crate::rpc_client::{CompactorClient, TabletServerClient};

/// Initial backoff for the fire-and-forget compactor cancel below, matching
/// `cancelCompaction`'s documented 1s schedule.
const CANCEL_INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// `cancelCompaction` has no retry budget beyond the backoff cap itself —
/// unlike `compactionCompleted`'s notify loop, a cancel keeps retrying
/// forever rather than giving up and orphaning the entry.
const CANCEL_RETRY_BUDGET: u32 = u32::MAX;

pub struct LifecycleHandlers<C: Clock> {
    running: Arc<RunningTable>,
    tserver_client: Arc<dyn TabletServerClient>,
    compactor_client: Arc<dyn CompactorClient>,
    clock: C,
    completion_retry_budget: u32,
    retry_initial_backoff: Duration,
    retry_max_backoff: Duration,
    metrics: Arc<Metrics>,
}

impl<C: Clock> LifecycleHandlers<C> {
    pub fn new(
        running: Arc<RunningTable>,
        tserver_client: Arc<dyn TabletServerClient>,
        compactor_client: Arc<dyn CompactorClient>,
        clock: C,
        completion_retry_budget: u32,
        retry_initial_backoff: Duration,
        retry_max_backoff: Duration,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            running,
            tserver_client,
            compactor_client,
            clock,
            completion_retry_budget,
            retry_initial_backoff,
            retry_max_backoff,
            metrics,
        }
    }

    /// Record a status report from the compactor. Ordering is by receipt,
    /// not by the `timestamp` the compactor sent.
    pub fn update_compaction_status(
        &self,
        id: ExternalCompactionId,
        state: CompactionStatusKind,
        message: String,
    ) -> Result<(), CoordinatorError> {
        self.running.add_update(&id, self.clock.epoch_ms(), state, message)
    }

    /// The status log for `id`, as returned by `getCompactionStatus`.
    pub fn get_compaction_status(&self, id: ExternalCompactionId) -> Result<Vec<StatusUpdate>, CoordinatorError> {
        self.running.get(&id).map(|rc| rc.updates).ok_or(CoordinatorError::UnknownCompactionId(id))
    }

    /// Mark `id` completed, then notify its tablet server with retry. A
    /// notification that exhausts its budget leaves the entry in place —
    /// orphaned but still inspectable via `getCompactionStatus` — rather than
    /// silently dropping the record of a finished compaction the tablet
    /// server never heard about.
    pub async fn compaction_completed(
        &self,
        id: ExternalCompactionId,
        stats: CompactionStats,
    ) -> Result<(), CoordinatorError> {
        self.running.complete(&id, stats)?;
        let Some(rc) = self.running.get(&id) else {
            return Ok(());
        };
        let tserver = rc.tserver.clone();
        let result = retry_with_backoff(
            || {
                let tserver = tserver.clone();
                async move {
                    self.tserver_client
                        .compaction_job_finished(&tserver, id, stats.file_size, stats.entries_written)
                        .await
                }
            },
            self.retry_initial_backoff,
            self.retry_max_backoff,
            self.completion_retry_budget,
        )
        .await;
        match result {
            Ok(()) => {
                self.running.remove_if_unchanged(&id, &rc);
                self.metrics.job_completed();
            }
            Err(e) => {
                warn!(%id, tserver = %rc.tserver, error = %e, "tablet server never acked completion; leaving entry orphaned");
                self.metrics.job_orphaned();
            }
        }
        Ok(())
    }

    /// Whether `id` has reached `COMPLETED`; if so, removes it and returns
    /// its stats — a compactor is expected to poll this until it sees
    /// `Some`, at which point the entry is gone for good.
    pub fn is_compaction_completed(
        &self,
        id: ExternalCompactionId,
    ) -> Result<Option<CompactionStats>, CoordinatorError> {
        let rc = self.running.get(&id).ok_or(CoordinatorError::UnknownCompactionId(id))?;
        if !rc.is_completed() {
            return Ok(None);
        }
        self.running.remove(&id);
        Ok(rc.stats)
    }

    /// Best-effort cancel: mark `id` cancelling, then fan the cancel out to
    /// its compactor in the background. An unknown or already-completed id
    /// is a silent no-op — a cancel racing a completion should not resurrect
    /// or error on a job that is already done.
    pub fn cancel_compaction(&self, id: ExternalCompactionId) {
        let Some(rc) = self.running.get(&id) else { return };
        if rc.is_completed() {
            return;
        }
        if self.running.begin_cancel(&id).is_err() {
            return;
        }
        let compactor = self.compactor_client.clone();
        let compactor_address = rc.compactor_address.clone();
        let initial_backoff = CANCEL_INITIAL_BACKOFF;
        let max_backoff = self.retry_max_backoff;
        let budget = CANCEL_RETRY_BUDGET;
        tokio::spawn(async move {
            let result = retry_with_backoff(
                || {
                    let compactor = compactor.clone();
                    let compactor_address = compactor_address.clone();
                    async move { compactor.cancel(&compactor_address, id).await }
                },
                initial_backoff,
                max_backoff,
                budget,
            )
            .await;
            if let Err(e) = result {
                warn!(%id, compactor = %compactor_address, error = %e, "compactor never acked cancel");
            }
        });
    }
}
