// SPDX-License-Identifier: MIT

//! `Coordinator` — owns the scheduling state as a set of `Arc`-shared
//! structures and dispatches each inbound RPC to the handler that owns it.

use std::sync::Arc;
use std::time::Instant;

use cc_core::{Clock, JobIndex, RunningTable};
use cc_wire::{CoordinatorRequest, CoordinatorResponse, JobAssignment};
use tracing::instrument;

use crate::dispatcher::Dispatcher;
use crate::handlers::LifecycleHandlers;
use crate::metrics::Metrics;

/// Everything one inbound RPC needs. Constructed once at startup and cloned
/// (cheaply — every field is an `Arc`) into each connection handler.
pub struct Coordinator<C: Clock> {
    job_index: Arc<JobIndex>,
    running: Arc<RunningTable>,
    dispatcher: Arc<Dispatcher>,
    handlers: Arc<LifecycleHandlers<C>>,
    metrics: Arc<Metrics>,
    started_at: Instant,
}

impl<C: Clock> Clone for Coordinator<C> {
    fn clone(&self) -> Self {
        Self {
            job_index: self.job_index.clone(),
            running: self.running.clone(),
            dispatcher: self.dispatcher.clone(),
            handlers: self.handlers.clone(),
            metrics: self.metrics.clone(),
            started_at: self.started_at,
        }
    }
}

impl<C: Clock> Coordinator<C> {
    pub fn new(
        job_index: Arc<JobIndex>,
        running: Arc<RunningTable>,
        dispatcher: Arc<Dispatcher>,
        handlers: Arc<LifecycleHandlers<C>>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { job_index, running, dispatcher, handlers, metrics, started_at: Instant::now() }
    }

    pub fn job_index(&self) -> &Arc<JobIndex> {
        &self.job_index
    }

    pub fn running(&self) -> &Arc<RunningTable> {
        &self.running
    }

    pub fn handlers(&self) -> &Arc<LifecycleHandlers<C>> {
        &self.handlers
    }

    /// Serve one request end to end.
    #[instrument(skip(self))]
    pub async fn handle(&self, request: CoordinatorRequest) -> CoordinatorResponse {
        match request {
            CoordinatorRequest::GetCompactionJob { queue, compactor_address } => {
                let result = self.dispatcher.get_compaction_job(&queue, &compactor_address).await;
                let assignment = result
                    .assignment
                    .map(|(external_compaction_id, job)| JobAssignment { external_compaction_id, job });
                CoordinatorResponse::Job { assignment }
            }

            CoordinatorRequest::UpdateCompactionStatus { id, state, message, .. } => {
                match self.handlers.update_compaction_status(id, state, message) {
                    Ok(()) => CoordinatorResponse::Ok,
                    Err(_) => CoordinatorResponse::UnknownCompactionId { id },
                }
            }

            CoordinatorRequest::CompactionCompleted { id, file_size, entries_written } => {
                let stats = cc_core::CompactionStats { file_size, entries_written };
                match self.handlers.compaction_completed(id, stats).await {
                    Ok(()) => CoordinatorResponse::Ok,
                    Err(_) => CoordinatorResponse::UnknownCompactionId { id },
                }
            }

            CoordinatorRequest::CancelCompaction { id } => {
                self.handlers.cancel_compaction(id);
                CoordinatorResponse::Ok
            }

            CoordinatorRequest::GetCompactionStatus { id } => match self.handlers.get_compaction_status(id) {
                Ok(updates) => CoordinatorResponse::StatusUpdates { updates },
                Err(_) => CoordinatorResponse::StatusUpdates { updates: Vec::new() },
            },

            CoordinatorRequest::IsCompactionCompleted { id } => {
                match self.handlers.is_compaction_completed(id) {
                    Ok(stats) => CoordinatorResponse::CompletionStatus { stats },
                    Err(_) => CoordinatorResponse::UnknownCompactionId { id },
                }
            }

            CoordinatorRequest::GetCoordinatorStatus => {
                let snapshot = self.job_index.snapshot();
                let metrics = self.metrics.snapshot();
                CoordinatorResponse::CoordinatorStatus {
                    uptime_secs: self.started_at.elapsed().as_secs(),
                    queue_count: snapshot.queue_count,
                    advertisement_count: snapshot.advertisement_count,
                    tserver_count: snapshot.tserver_count,
                    running_count: self.running.len(),
                    jobs_dispatched: metrics.jobs_dispatched,
                    jobs_completed: metrics.jobs_completed,
                    jobs_orphaned: metrics.jobs_orphaned,
                    poll_cycles: metrics.poll_cycles,
                    poll_failures: metrics.poll_failures,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_core::test_support::fake_tserver;
    use cc_core::{CompactionStatusKind, ExternalCompactionId, FakeClock};
    use std::time::Duration;

    use crate::rpc_client::test_support::{FakeCompactorClient, FakeTabletServerClient};

    fn coordinator() -> (Coordinator<FakeClock>, Arc<FakeTabletServerClient>) {
        let job_index = Arc::new(JobIndex::new());
        let running = Arc::new(RunningTable::new());
        let tserver_client = Arc::new(FakeTabletServerClient::new());
        let metrics = Arc::new(Metrics::new());
        let dispatcher = Arc::new(Dispatcher::new(
            job_index.clone(),
            running.clone(),
            tserver_client.clone(),
            metrics.clone(),
        ));
        let handlers = Arc::new(LifecycleHandlers::new(
            running.clone(),
            tserver_client.clone(),
            Arc::new(FakeCompactorClient::new()),
            FakeClock::new(),
            3,
            Duration::from_millis(1),
            Duration::from_millis(10),
            metrics.clone(),
        ));
        (Coordinator::new(job_index, running, dispatcher, handlers, metrics), tserver_client)
    }

    #[tokio::test]
    async fn get_compaction_job_on_an_empty_queue_returns_none_assignment() {
        let (coordinator, _) = coordinator();
        let resp = coordinator
            .handle(CoordinatorRequest::GetCompactionJob {
                queue: "Q".to_string(),
                compactor_address: "c1:9000".to_string(),
            })
            .await;
        assert_eq!(resp, CoordinatorResponse::Job { assignment: None });
    }

    #[tokio::test]
    async fn full_lifecycle_reserve_update_complete() {
        let (coordinator, tserver_client) = coordinator();
        let tsi = fake_tserver(1);
        coordinator.job_index().add(tsi.clone(), "Q", 10);
        let id = ExternalCompactionId::new();
        let job = cc_core::JobDescriptor {
            tablet_extent: "t;r".to_string(),
            files: vec!["f.rf".to_string()],
            queue: coordinator.job_index().intern("Q"),
            priority: 10,
        };
        tserver_client.push_reservation(tsi, (Some(id), Some(job)));

        let resp = coordinator
            .handle(CoordinatorRequest::GetCompactionJob {
                queue: "Q".to_string(),
                compactor_address: "c1:9000".to_string(),
            })
            .await;
        let assignment = match resp {
            CoordinatorResponse::Job { assignment: Some(a) } => a,
            other => panic!("expected a job assignment, got {other:?}"),
        };
        assert_eq!(assignment.external_compaction_id, id);

        let resp = coordinator
            .handle(CoordinatorRequest::UpdateCompactionStatus {
                id,
                state: CompactionStatusKind::Started,
                message: "go".to_string(),
                timestamp_epoch_ms: 0,
            })
            .await;
        assert_eq!(resp, CoordinatorResponse::Ok);

        let resp = coordinator
            .handle(CoordinatorRequest::CompactionCompleted { id, file_size: 10, entries_written: 1 })
            .await;
        assert_eq!(resp, CoordinatorResponse::Ok);

        let resp = coordinator.handle(CoordinatorRequest::IsCompactionCompleted { id }).await;
        assert_eq!(
            resp,
            CoordinatorResponse::CompletionStatus {
                stats: Some(cc_core::CompactionStats { file_size: 10, entries_written: 1 })
            }
        );

        // Drained by the previous call; a second poll sees an unknown id.
        let resp = coordinator.handle(CoordinatorRequest::IsCompactionCompleted { id }).await;
        assert_eq!(resp, CoordinatorResponse::UnknownCompactionId { id });
    }

    #[tokio::test]
    async fn update_compaction_status_on_unknown_id_is_reported() {
        let (coordinator, _) = coordinator();
        let id = ExternalCompactionId::new();
        let resp = coordinator
            .handle(CoordinatorRequest::UpdateCompactionStatus {
                id,
                state: CompactionStatusKind::Started,
                message: "x".to_string(),
                timestamp_epoch_ms: 0,
            })
            .await;
        assert_eq!(resp, CoordinatorResponse::UnknownCompactionId { id });
    }

    #[tokio::test]
    async fn get_compaction_status_on_unknown_id_is_an_empty_list_not_an_error() {
        let (coordinator, _) = coordinator();
        let resp =
            coordinator.handle(CoordinatorRequest::GetCompactionStatus { id: ExternalCompactionId::new() }).await;
        assert_eq!(resp, CoordinatorResponse::StatusUpdates { updates: Vec::new() });
    }

    #[tokio::test]
    async fn coordinator_status_reports_current_counts() {
        let (coordinator, _) = coordinator();
        coordinator.job_index().add(fake_tserver(1), "Q", 10);
        let resp = coordinator.handle(CoordinatorRequest::GetCoordinatorStatus).await;
        match resp {
            CoordinatorResponse::CoordinatorStatus { queue_count, advertisement_count, tserver_count, .. } => {
                assert_eq!(queue_count, 1);
                assert_eq!(advertisement_count, 1);
                assert_eq!(tserver_count, 1);
            }
            other => panic!("expected CoordinatorStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancel_compaction_on_unknown_id_is_still_ok() {
        let (coordinator, _) = coordinator();
        let resp =
            coordinator.handle(CoordinatorRequest::CancelCompaction { id: ExternalCompactionId::new() }).await;
        assert_eq!(resp, CoordinatorResponse::Ok);
    }
}
