// SPDX-License-Identifier: MIT

//! `ccctl job ...` — manual poke-and-inspect commands against one external
//! compaction id. These exercise the same RPCs a compactor/tablet server
//! would, for operator debugging rather than production traffic.

use anyhow::Result;
use cc_core::ExternalCompactionId;
use cc_wire::{CoordinatorRequest, CoordinatorResponse};

use crate::client::{ClientError, CoordinatorClient};
use crate::exit_error::ExitError;
use crate::output::{format_or_json, handle_list, OutputFormat};

/// `ccctl job get <queue> --compactor <address>` — pull a job from a queue,
/// the same RPC a compactor issues in its poll loop.
pub async fn get(
    client: &CoordinatorClient,
    queue: &str,
    compactor_address: &str,
    format: OutputFormat,
) -> Result<()> {
    let assignment = client
        .send_expecting(
            CoordinatorRequest::GetCompactionJob {
                queue: queue.to_string(),
                compactor_address: compactor_address.to_string(),
            },
            |r| match r {
                CoordinatorResponse::Job { assignment } => Some(assignment),
                _ => None,
            },
        )
        .await?;

    match assignment {
        Some(assignment) => format_or_json(format, &assignment, || {
            println!("reserved {} for {}", assignment.external_compaction_id, queue);
            println!("tablet extent: {}", assignment.job.tablet_extent);
            println!("files:         {}", assignment.job.files.join(", "));
        }),
        None => format_or_json(format, &serde_json::Value::Null, || {
            println!("no job available on queue {queue}");
        }),
    }
}

/// `ccctl job status <id>` — the update log reported so far.
pub async fn status(client: &CoordinatorClient, id: &str, format: OutputFormat) -> Result<()> {
    let id = ExternalCompactionId::from_string(id);
    let updates = client
        .send_expecting(CoordinatorRequest::GetCompactionStatus { id }, |r| match r {
            CoordinatorResponse::StatusUpdates { updates } => Some(updates),
            _ => None,
        })
        .await?;

    handle_list(format, &updates, "no status updates recorded", |updates| {
        for update in updates {
            println!("{} {} {}", update.received_at_epoch_ms, update.state, update.message);
        }
    })
}

/// `ccctl job completed <id>` — drains and prints final stats if present.
pub async fn completed(client: &CoordinatorClient, id: &str, format: OutputFormat) -> Result<()> {
    let id = ExternalCompactionId::from_string(id);
    let outcome = client
        .send_expecting(CoordinatorRequest::IsCompactionCompleted { id }, |r| match r {
            CoordinatorResponse::CompletionStatus { stats } => Some(Ok(stats)),
            CoordinatorResponse::UnknownCompactionId { id } => Some(Err(id)),
            _ => None,
        })
        .await?;

    match outcome {
        Ok(Some(stats)) => format_or_json(format, &stats, || {
            println!("completed: {} bytes, {} entries", stats.file_size, stats.entries_written);
        }),
        Ok(None) => format_or_json(format, &serde_json::Value::Null, || {
            println!("{id} is still running");
        }),
        Err(id) => Err(ExitError::new(1, format!("unknown compaction id: {id}")).into()),
    }
}

/// `ccctl job cancel <id>` — abandon a reservation, the RPC a tablet server
/// issues when it no longer needs the compaction done.
pub async fn cancel(client: &CoordinatorClient, id: &str) -> Result<()> {
    let id = ExternalCompactionId::from_string(id);
    match client.send(&CoordinatorRequest::CancelCompaction { id }).await {
        Ok(CoordinatorResponse::Ok) => {
            println!("cancel requested for {id}");
            Ok(())
        }
        Ok(other) => Err(ClientError::Rejected(format!("unexpected response: {other:?}")).into()),
        Err(e) => Err(e.into()),
    }
}
