// SPDX-License-Identifier: MIT

//! `MembershipReactor` — purge the `JobIndex` and fan out cancels when a
//! tablet server drops off the live set.
//!
//! The membership feed itself is an external collaborator: its listener
//! callback arrives on a foreign thread, outside this process's control.
//! This module only owns the channel-and-reactor half: a trait for whatever
//! produces [`MembershipDelta`]s, and the task that consumes them one at a
//! time so `JobIndex`/`RunningTable` mutation stays single-threaded.

use std::collections::HashSet;
use std::sync::Arc;

use cc_core::{Clock, JobIndex, RunningTable, TabletServerId};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::handlers::LifecycleHandlers;
use crate::poller::LiveTabletServers;

/// A membership change: tablet servers that came up and ones that went away.
/// `added` requires no reactor action; it's carried for callers that want to
/// log cluster size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDelta {
    pub added: Vec<TabletServerId>,
    pub deleted: Vec<TabletServerId>,
}

/// Produces membership deltas onto a channel. The real implementation talks
/// to the cluster coordination service's watch API; it is out of scope here
/// and left to the operator to supply.
pub trait MembershipWatch: Send + Sync + 'static {
    fn subscribe(&self) -> mpsc::Receiver<MembershipDelta>;
}

/// Default stand-in that never reports a departure. A coordinator run with
/// this watch behaves correctly but never reclaims a dead tablet server's
/// advertisements until the next successful poll happens to find it gone
/// some other way — acceptable only for local smoke-testing, not production.
pub struct NullMembershipWatch;

impl MembershipWatch for NullMembershipWatch {
    fn subscribe(&self) -> mpsc::Receiver<MembershipDelta> {
        let (_tx, rx) = mpsc::channel(1);
        rx
    }
}

/// Tracks the current live tablet-server set as `MembershipReactor` applies
/// deltas, so [`crate::poller::QueuePoller`] has something to snapshot each
/// cycle without needing its own membership feed.
#[derive(Default)]
pub struct LiveSet {
    members: Mutex<HashSet<TabletServerId>>,
}

impl LiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply(&self, delta: &MembershipDelta) {
        let mut members = self.members.lock();
        for tsi in &delta.added {
            members.insert(tsi.clone());
        }
        for tsi in &delta.deleted {
            members.remove(tsi);
        }
    }
}

impl LiveTabletServers for LiveSet {
    fn snapshot(&self) -> Vec<TabletServerId> {
        self.members.lock().iter().cloned().collect()
    }
}

/// Reacts to membership deltas by purging `JobIndex` and cancelling affected
/// running compactions through the same `cancelCompaction` path a compactor
/// or tablet server would hit directly, rather than a parallel cancel
/// mechanism.
pub struct MembershipReactor<C: Clock> {
    job_index: Arc<JobIndex>,
    running: Arc<RunningTable>,
    handlers: Arc<LifecycleHandlers<C>>,
    live_set: Arc<LiveSet>,
}

impl<C: Clock> MembershipReactor<C> {
    pub fn new(
        job_index: Arc<JobIndex>,
        running: Arc<RunningTable>,
        handlers: Arc<LifecycleHandlers<C>>,
        live_set: Arc<LiveSet>,
    ) -> Self {
        Self { job_index, running, handlers, live_set }
    }

    /// Apply one delta: update the live set, then for each deleted tsi,
    /// compute its running victims, purge `JobIndex`, then best-effort
    /// cancel each victim. §4.6 steps 1-3.
    pub fn handle(&self, delta: MembershipDelta) {
        self.live_set.apply(&delta);
        if !delta.added.is_empty() {
            info!(count = delta.added.len(), "tablet servers joined; next poll will pick them up");
        }
        for tsi in &delta.deleted {
            let victims = self.running.by_tserver(tsi);
            let removed = self.job_index.remove_tserver(tsi);
            info!(
                %tsi,
                removed_advertisements = removed.len(),
                victims = victims.len(),
                "tablet server left membership"
            );
            for id in victims {
                self.handlers.cancel_compaction(id);
            }
        }
    }

    /// Drain `rx` until the channel closes or `cancel` fires, applying each
    /// delta serially — the single-threaded-mutation property the design
    /// note asks for falls out of running one delta at a time on one task.
    pub async fn run(self, mut rx: mpsc::Receiver<MembershipDelta>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                delta = rx.recv() => {
                    match delta {
                        Some(delta) => self.handle(delta),
                        None => return,
                    }
                }
                _ = cancel.cancelled() => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_core::test_support::{fake_job, fake_tserver};
    use cc_core::{ExternalCompactionId, FakeClock, RunningCompaction};
    use std::time::Duration;

    use crate::rpc_client::test_support::{FakeCompactorClient, FakeTabletServerClient};

    fn reactor() -> (MembershipReactor<FakeClock>, Arc<JobIndex>, Arc<RunningTable>, Arc<FakeCompactorClient>) {
        let job_index = Arc::new(JobIndex::new());
        let running = Arc::new(RunningTable::new());
        let compactor = Arc::new(FakeCompactorClient::new());
        let handlers = Arc::new(LifecycleHandlers::new(
            running.clone(),
            Arc::new(FakeTabletServerClient::new()),
            compactor.clone(),
            FakeClock::new(),
            3,
            Duration::from_millis(1),
            Duration::from_millis(10),
            Arc::new(crate::metrics::Metrics::new()),
        ));
        let reactor =
            MembershipReactor::new(job_index.clone(), running.clone(), handlers, Arc::new(LiveSet::new()));
        (reactor, job_index, running, compactor)
    }

    #[test]
    fn live_set_tracks_additions_and_removals() {
        let live_set = LiveSet::new();
        let t1 = fake_tserver(1);
        let t2 = fake_tserver(2);
        live_set.apply(&MembershipDelta { added: vec![t1.clone(), t2.clone()], deleted: vec![] });
        assert_eq!(live_set.snapshot().len(), 2);
        live_set.apply(&MembershipDelta { added: vec![], deleted: vec![t1] });
        assert_eq!(live_set.snapshot(), vec![t2]);
    }

    #[test]
    fn deleting_a_tserver_purges_its_job_index_entries() {
        let (reactor, job_index, ..) = reactor();
        let tsi = fake_tserver(1);
        job_index.add(tsi.clone(), "Q", 10);
        reactor.handle(MembershipDelta { added: vec![], deleted: vec![tsi] });
        let q = job_index.intern("Q");
        assert!(job_index.pick_highest(&q).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn deleting_a_tserver_cancels_its_running_compactions() {
        let (reactor, _, running, compactor) = reactor();
        let tsi = fake_tserver(1);
        let rc = RunningCompaction::reserved(
            ExternalCompactionId::new(),
            fake_job("Q", 10),
            "compactor:9000",
            tsi.clone(),
        );
        let id = rc.external_compaction_id;
        running.insert(rc).unwrap();

        reactor.handle(MembershipDelta { added: vec![], deleted: vec![tsi] });
        assert!(running.get(&id).unwrap().is_cancelling());

        tokio::task::yield_now().await;
        assert_eq!(compactor.cancelled_ids(), vec![id]);
    }

    #[test]
    fn deleting_an_unknown_tserver_is_harmless() {
        let (reactor, ..) = reactor();
        reactor.handle(MembershipDelta { added: vec![], deleted: vec![fake_tserver(99)] });
    }
}
