// SPDX-License-Identifier: MIT

//! `QueuePoller` — periodic fan-out to every live tablet server to refresh
//! `JobIndex` advertisements.

use std::sync::Arc;
use std::time::Duration;

use cc_core::{JobIndex, TabletServerId};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::metrics::Metrics;
use crate::rpc_client::TabletServerClient;

/// Bounded concurrency cap for one poll cycle's fan-out: a small fixed cap
/// rather than one task per live tablet server, which would let a large
/// cluster overrun the RPC transport's own connection limits.
const MAX_CONCURRENT_POLLS: usize = 32;

/// Supplies the live tablet-server set for a poll cycle. The authoritative
/// source is whatever feeds `MembershipReactor`; this trait lets the poller
/// depend on just a snapshot rather than the reactor itself.
pub trait LiveTabletServers: Send + Sync + 'static {
    fn snapshot(&self) -> Vec<TabletServerId>;
}

pub struct QueuePoller {
    job_index: Arc<JobIndex>,
    tserver_client: Arc<dyn TabletServerClient>,
    live_tservers: Arc<dyn LiveTabletServers>,
    poll_period: Duration,
    metrics: Arc<Metrics>,
}

impl QueuePoller {
    pub fn new(
        job_index: Arc<JobIndex>,
        tserver_client: Arc<dyn TabletServerClient>,
        live_tservers: Arc<dyn LiveTabletServers>,
        poll_period: Duration,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { job_index, tserver_client, live_tservers, poll_period, metrics }
    }

    /// One poll cycle. Per-tsi failure is logged and skipped;
    /// it never purges or re-adds — only a successful response adds anything.
    pub async fn poll_once(&self) {
        self.metrics.poll_cycle();
        let tservers = self.live_tservers.snapshot();
        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_POLLS));
        let mut tasks = Vec::with_capacity(tservers.len());
        for tsi in tservers {
            let semaphore = semaphore.clone();
            let job_index = self.job_index.clone();
            let tserver_client = self.tserver_client.clone();
            let metrics = self.metrics.clone();
            tasks.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                match tserver_client.get_compaction_queue_info(&tsi).await {
                    Ok(queues) => {
                        for q in &queues {
                            job_index.add(tsi.clone(), &q.queue, q.priority);
                        }
                    }
                    Err(e) => {
                        warn!(%tsi, error = %e, "queue info poll failed; leaving prior advertisements in place");
                        metrics.poll_failure();
                    }
                }
            }));
        }
        for task in tasks {
            let _ = task.await;
        }
    }

    /// Run `poll_once` every `poll_period`, sleeping `max(0, T_poll -
    /// elapsed)` between cycles so the period does not drift under slow
    /// tablet servers.
    pub async fn run(self, cancel: CancellationToken) {
        loop {
            let started = tokio::time::Instant::now();
            self.poll_once().await;
            let elapsed = started.elapsed();
            let sleep_for = self.poll_period.saturating_sub(elapsed);
            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {}
                _ = cancel.cancelled() => {
                    info!("queue poller shutting down");
                    return;
                }
            }
        }
    }
}
