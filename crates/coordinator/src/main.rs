// SPDX-License-Identifier: MIT

//! Coordinator binary entry point: load configuration, acquire the leader
//! lock, wire up the engine, and serve RPCs until shut down.

use std::sync::Arc;

use cc_coordinator::{
    Config, Coordinator, Dispatcher, DirectCompactorClient, DirectTabletServerClient, FileLeaderLock,
    LifecycleHandlers, Listener, LiveSet, MembershipReactor, MembershipWatch, Metrics,
    NullMembershipWatch, QueuePoller, RuntimeError,
};
use cc_core::{JobIndex, RunningTable, SystemClock};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Loading config happens before the tokio runtime exists, since
/// `min_worker_threads` sizes the runtime itself.
fn main() -> Result<(), RuntimeError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load()?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.min_worker_threads)
        .enable_all()
        .build()
        .map_err(RuntimeError::Io)?;
    runtime.block_on(run(config))
}

async fn run(config: Config) -> Result<(), RuntimeError> {
    info!(listen_addr = %config.listen_addr, "starting coordinator");

    let _lock = FileLeaderLock::acquire(config.lock_path.clone())?;
    info!(path = ?config.lock_path, "acquired leader lock");

    let job_index = Arc::new(JobIndex::new());
    let running = Arc::new(RunningTable::new());
    let tserver_client = Arc::new(DirectTabletServerClient::with_max_message_bytes(
        config.rpc_timeout,
        config.max_message_bytes,
    ));
    let compactor_client = Arc::new(DirectCompactorClient::with_max_message_bytes(
        config.rpc_timeout,
        config.max_message_bytes,
    ));
    let metrics = Arc::new(Metrics::new());

    let handlers = Arc::new(LifecycleHandlers::new(
        running.clone(),
        tserver_client.clone(),
        compactor_client,
        SystemClock,
        config.completion_retry_budget,
        std::time::Duration::from_secs(1),
        config.retry_max_backoff,
        metrics.clone(),
    ));

    let live_set = Arc::new(LiveSet::new());
    let reactor =
        MembershipReactor::new(job_index.clone(), running.clone(), handlers.clone(), live_set.clone());

    let shutdown = CancellationToken::new();

    // The cluster's membership-watch service is an external collaborator not
    // reimplemented here. `NullMembershipWatch` is a correctness-preserving
    // stand-in: the coordinator runs, it just never reclaims a dead tablet
    // server's advertisements via this path.
    let membership_watch = NullMembershipWatch;
    let membership_rx = membership_watch.subscribe();
    let reactor_task = tokio::spawn(reactor.run(membership_rx, shutdown.clone()));

    let poller = QueuePoller::new(
        job_index.clone(),
        tserver_client.clone(),
        live_set,
        config.poll_period,
        metrics.clone(),
    );
    let poller_task = tokio::spawn(poller.run(shutdown.clone()));

    let dispatcher =
        Arc::new(Dispatcher::new(job_index.clone(), running.clone(), tserver_client, metrics.clone()));
    let coordinator = Coordinator::new(job_index, running, dispatcher, handlers, metrics);
    let listener =
        Listener::with_max_message_bytes(coordinator, config.rpc_timeout, config.max_message_bytes)
            .with_port_search(config.port_search);

    let listen_addr = config.listen_addr;
    tokio::select! {
        result = listener.run(listen_addr, shutdown.clone()) => {
            if let Err(e) = &result {
                error!(error = %e, "listener exited with an error");
            }
            shutdown.cancel();
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received shutdown signal");
            shutdown.cancel();
        }
    }

    let _ = reactor_task.await;
    let _ = poller_task.await;
    Ok(())
}
