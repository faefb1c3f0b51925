// SPDX-License-Identifier: MIT

//! Outbound RPC clients: the coordinator's half of talking to tablet servers
//! and compactors. Both are external services; connection pooling and retry
//! policy for the transport itself are out of scope here — each call opens
//! a connection, sends one frame, waits for one frame back, and closes it.
//! No pool, dial per call.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use cc_core::{ExternalCompactionId, JobDescriptor, TabletServerId};
use cc_wire::{CompactorRequest, CompactorResponse, QueueSummary, TabletServerRequest, TabletServerResponse};
use tokio::net::TcpStream;

use crate::error::RuntimeError;

/// The coordinator's view of a tablet server: queue advertisements, job
/// reservation, and completion notification. §4.3-§4.5.
#[async_trait]
pub trait TabletServerClient: Send + Sync + 'static {
    async fn get_compaction_queue_info(
        &self,
        tsi: &TabletServerId,
    ) -> Result<Vec<QueueSummary>, RuntimeError>;

    async fn reserve_compaction_job(
        &self,
        tsi: &TabletServerId,
        queue: &str,
        priority: i64,
        compactor_address: &str,
    ) -> Result<(Option<ExternalCompactionId>, Option<JobDescriptor>), RuntimeError>;

    async fn compaction_job_finished(
        &self,
        tsi: &TabletServerId,
        id: ExternalCompactionId,
        file_size: u64,
        entries_written: u64,
    ) -> Result<(), RuntimeError>;
}

/// The coordinator's view of a compactor: best-effort cancellation. §4.5/§4.6.
#[async_trait]
pub trait CompactorClient: Send + Sync + 'static {
    async fn cancel(&self, compactor_address: &str, id: ExternalCompactionId) -> Result<(), RuntimeError>;
}

/// Dial `address`, send one request frame, read one response frame, close.
async fn call<Req: serde::Serialize, Resp: serde::de::DeserializeOwned>(
    address: &str,
    timeout: Duration,
    max_message_bytes: usize,
    request: &Req,
) -> Result<Resp, RuntimeError> {
    let addr: SocketAddr = address
        .parse()
        .map_err(|_| RuntimeError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, "bad address")))?;
    let mut stream =
        tokio::time::timeout(timeout, TcpStream::connect(addr)).await.map_err(|_| RuntimeError::Rpc(cc_wire::ProtocolError::Timeout))??;
    cc_wire::write_response(&mut stream, request).await?;
    let payload = cc_wire::read_message_timeout_with_limit(&mut stream, timeout, max_message_bytes).await?;
    Ok(cc_wire::decode(&payload)?)
}

/// Direct-connect implementation, no pooling. One connection per call.
pub struct DirectTabletServerClient {
    timeout: Duration,
    max_message_bytes: usize,
}

impl DirectTabletServerClient {
    pub fn new(timeout: Duration) -> Self {
        Self::with_max_message_bytes(timeout, cc_wire::DEFAULT_MAX_MESSAGE_BYTES)
    }

    pub fn with_max_message_bytes(timeout: Duration, max_message_bytes: usize) -> Self {
        Self { timeout, max_message_bytes }
    }
}

#[async_trait]
impl TabletServerClient for DirectTabletServerClient {
    async fn get_compaction_queue_info(
        &self,
        tsi: &TabletServerId,
    ) -> Result<Vec<QueueSummary>, RuntimeError> {
        let resp: TabletServerResponse =
            call(&tsi.address(), self.timeout, self.max_message_bytes, &TabletServerRequest::GetCompactionQueueInfo).await?;
        match resp {
            TabletServerResponse::QueueInfo { queues } => Ok(queues),
            other => Err(unexpected(other)),
        }
    }

    async fn reserve_compaction_job(
        &self,
        tsi: &TabletServerId,
        queue: &str,
        priority: i64,
        compactor_address: &str,
    ) -> Result<(Option<ExternalCompactionId>, Option<JobDescriptor>), RuntimeError> {
        let request = TabletServerRequest::ReserveCompactionJob {
            queue: queue.to_string(),
            priority,
            compactor_address: compactor_address.to_string(),
        };
        let resp: TabletServerResponse = call(&tsi.address(), self.timeout, self.max_message_bytes, &request).await?;
        match resp {
            TabletServerResponse::Reservation { external_compaction_id, job } => {
                Ok((external_compaction_id, job))
            }
            other => Err(unexpected(other)),
        }
    }

    async fn compaction_job_finished(
        &self,
        tsi: &TabletServerId,
        id: ExternalCompactionId,
        file_size: u64,
        entries_written: u64,
    ) -> Result<(), RuntimeError> {
        let request = TabletServerRequest::CompactionJobFinished { id, file_size, entries_written };
        let resp: TabletServerResponse = call(&tsi.address(), self.timeout, self.max_message_bytes, &request).await?;
        match resp {
            TabletServerResponse::Ack => Ok(()),
            other => Err(unexpected(other)),
        }
    }
}

/// Direct-connect implementation of [`CompactorClient`].
pub struct DirectCompactorClient {
    timeout: Duration,
    max_message_bytes: usize,
}

impl DirectCompactorClient {
    pub fn new(timeout: Duration) -> Self {
        Self::with_max_message_bytes(timeout, cc_wire::DEFAULT_MAX_MESSAGE_BYTES)
    }

    pub fn with_max_message_bytes(timeout: Duration, max_message_bytes: usize) -> Self {
        Self { timeout, max_message_bytes }
    }
}

#[async_trait]
impl CompactorClient for DirectCompactorClient {
    async fn cancel(&self, compactor_address: &str, id: ExternalCompactionId) -> Result<(), RuntimeError> {
        let resp: CompactorResponse =
            call(compactor_address, self.timeout, self.max_message_bytes, &CompactorRequest::Cancel { id })
                .await?;
        match resp {
            CompactorResponse::Ack => Ok(()),
        }
    }
}

fn unexpected(resp: TabletServerResponse) -> RuntimeError {
    RuntimeError::UnexpectedResponse(format!("{resp:?}"))
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use cc_core::{ExternalCompactionId, JobDescriptor, TabletServerId};

    use super::*;

    /// Scripted tablet server responses, keyed by `TabletServerId`. Panics on
    /// an unscripted call — tests must set up exactly the interactions they
    /// expect.
    #[derive(Default)]
    pub struct FakeTabletServerClient {
        queue_info: Mutex<HashMap<TabletServerId, Vec<QueueSummary>>>,
        reservations: Mutex<HashMap<TabletServerId, Vec<(Option<ExternalCompactionId>, Option<JobDescriptor>)>>>,
        finished: Mutex<Vec<ExternalCompactionId>>,
    }

    impl FakeTabletServerClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_queue_info(&self, tsi: TabletServerId, queues: Vec<QueueSummary>) {
            self.queue_info.lock().unwrap().insert(tsi, queues);
        }

        /// Queue up reservation outcomes for `tsi`, returned in order, one
        /// per call; once exhausted, a reservation of `(None, None)` is
        /// returned forever (queue advertised but ran dry).
        pub fn push_reservation(
            &self,
            tsi: TabletServerId,
            outcome: (Option<ExternalCompactionId>, Option<JobDescriptor>),
        ) {
            self.reservations.lock().unwrap().entry(tsi).or_default().push(outcome);
        }

        pub fn finished_ids(&self) -> Vec<ExternalCompactionId> {
            self.finished.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TabletServerClient for FakeTabletServerClient {
        async fn get_compaction_queue_info(
            &self,
            tsi: &TabletServerId,
        ) -> Result<Vec<QueueSummary>, RuntimeError> {
            Ok(self.queue_info.lock().unwrap().get(tsi).cloned().unwrap_or_default())
        }

        async fn reserve_compaction_job(
            &self,
            tsi: &TabletServerId,
            _queue: &str,
            _priority: i64,
            _compactor_address: &str,
        ) -> Result<(Option<ExternalCompactionId>, Option<JobDescriptor>), RuntimeError> {
            let mut reservations = self.reservations.lock().unwrap();
            let queued = reservations.get_mut(tsi);
            match queued.and_then(|q| if q.is_empty() { None } else { Some(q.remove(0)) }) {
                Some(outcome) => Ok(outcome),
                None => Ok((None, None)),
            }
        }

        async fn compaction_job_finished(
            &self,
            _tsi: &TabletServerId,
            id: ExternalCompactionId,
            _file_size: u64,
            _entries_written: u64,
        ) -> Result<(), RuntimeError> {
            self.finished.lock().unwrap().push(id);
            Ok(())
        }
    }

    /// Records every id it was asked to cancel. Always succeeds.
    #[derive(Default)]
    pub struct FakeCompactorClient {
        cancelled: Mutex<Vec<ExternalCompactionId>>,
    }

    impl FakeCompactorClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn cancelled_ids(&self) -> Vec<ExternalCompactionId> {
            self.cancelled.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompactorClient for FakeCompactorClient {
        async fn cancel(&self, _compactor_address: &str, id: ExternalCompactionId) -> Result<(), RuntimeError> {
            self.cancelled.lock().unwrap().push(id);
            Ok(())
        }
    }
}
