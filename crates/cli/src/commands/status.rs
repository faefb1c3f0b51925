// SPDX-License-Identifier: MIT

//! `ccctl status` — diagnostic snapshot of the coordinator's in-memory state.

use anyhow::Result;
use cc_wire::{CoordinatorRequest, CoordinatorResponse};

use crate::client::CoordinatorClient;
use crate::output::{format_or_json, OutputFormat};

pub async fn handle(client: &CoordinatorClient, format: OutputFormat) -> Result<()> {
    let status = client
        .send_expecting(CoordinatorRequest::GetCoordinatorStatus, |r| match r {
            CoordinatorResponse::CoordinatorStatus {
                uptime_secs,
                queue_count,
                advertisement_count,
                tserver_count,
                running_count,
                jobs_dispatched,
                jobs_completed,
                jobs_orphaned,
                poll_cycles,
                poll_failures,
            } => Some((
                uptime_secs,
                queue_count,
                advertisement_count,
                tserver_count,
                running_count,
                jobs_dispatched,
                jobs_completed,
                jobs_orphaned,
                poll_cycles,
                poll_failures,
            )),
            _ => None,
        })
        .await?;
    let (
        uptime_secs,
        queue_count,
        advertisement_count,
        tserver_count,
        running_count,
        jobs_dispatched,
        jobs_completed,
        jobs_orphaned,
        poll_cycles,
        poll_failures,
    ) = status;

    format_or_json(
        format,
        &serde_json::json!({
            "uptime_secs": uptime_secs,
            "queue_count": queue_count,
            "advertisement_count": advertisement_count,
            "tserver_count": tserver_count,
            "running_count": running_count,
            "jobs_dispatched": jobs_dispatched,
            "jobs_completed": jobs_completed,
            "jobs_orphaned": jobs_orphaned,
            "poll_cycles": poll_cycles,
            "poll_failures": poll_failures,
        }),
        || {
            println!("uptime:        {}s", uptime_secs);
            println!("queues:        {}", queue_count);
            println!("advertisements:{}", advertisement_count);
            println!("tablet servers:{}", tserver_count);
            println!("running:       {}", running_count);
            println!("dispatched:    {}", jobs_dispatched);
            println!("completed:     {}", jobs_completed);
            println!("orphaned:      {}", jobs_orphaned);
            println!("poll cycles:   {}", poll_cycles);
            println!("poll failures: {}", poll_failures);
        },
    )
}
