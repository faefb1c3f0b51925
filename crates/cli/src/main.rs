// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `ccctl`: operator CLI for a running coordinator. Talks the same
//! length-prefixed wire protocol any compactor or tablet server would,
//! over a plain TCP connection — there's no separate admin protocol.

mod client;
mod commands;
mod exit_error;
mod output;

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, Subcommand};

use client::CoordinatorClient;
use exit_error::ExitError;
use output::OutputFormat;

/// Default coordinator RPC address, matching `cc-coordinator`'s own
/// `CC_LISTEN_ADDR` default port.
fn default_addr() -> SocketAddr {
    ([127, 0, 0, 1], 9997).into()
}

#[derive(Parser)]
#[command(name = "ccctl", about = "Operator CLI for the external compaction coordinator")]
struct Cli {
    /// Coordinator RPC address. Falls back to `CC_COORDINATOR_ADDR`, then
    /// the coordinator's own default listen address.
    #[arg(long, global = true)]
    addr: Option<SocketAddr>,

    /// Per-RPC timeout, in milliseconds.
    #[arg(long, global = true, default_value_t = 5000)]
    timeout_ms: u64,

    /// Output format.
    #[arg(long, value_enum, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the coordinator's current queue/tablet-server/running counts.
    Status,

    /// Inspect or act on one in-flight external compaction.
    Job {
        #[command(subcommand)]
        command: JobCommand,
    },
}

#[derive(Subcommand)]
enum JobCommand {
    /// Pull a job from a queue (the RPC a compactor's poll loop issues).
    Get {
        queue: String,
        #[arg(long)]
        compactor: String,
    },
    /// Print the status-update log for an external compaction id.
    Status { id: String },
    /// Check (and drain, if present) the final stats for an id.
    Completed { id: String },
    /// Abandon a reservation.
    Cancel { id: String },
}

fn resolve_addr(cli_addr: Option<SocketAddr>) -> anyhow::Result<SocketAddr> {
    if let Some(addr) = cli_addr {
        return Ok(addr);
    }
    if let Ok(addr) = std::env::var("CC_COORDINATOR_ADDR") {
        return Ok(addr.parse()?);
    }
    Ok(default_addr())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        if let Some(exit) = e.downcast_ref::<ExitError>() {
            eprintln!("error: {}", exit.message);
            std::process::exit(exit.code);
        }
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let addr = resolve_addr(cli.addr)?;
    let client = CoordinatorClient::new(addr, Duration::from_millis(cli.timeout_ms));

    match cli.command {
        Command::Status => commands::status::handle(&client, cli.format).await,
        Command::Job { command } => match command {
            JobCommand::Get { queue, compactor } => {
                commands::job::get(&client, &queue, &compactor, cli.format).await
            }
            JobCommand::Status { id } => commands::job::status(&client, &id, cli.format).await,
            JobCommand::Completed { id } => commands::job::completed(&client, &id, cli.format).await,
            JobCommand::Cancel { id } => commands::job::cancel(&client, &id).await,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn explicit_addr_wins_over_everything() {
        std::env::set_var("CC_COORDINATOR_ADDR", "10.0.0.1:1");
        let addr: SocketAddr = "127.0.0.1:2222".parse().unwrap();
        assert_eq!(resolve_addr(Some(addr)).unwrap(), addr);
        std::env::remove_var("CC_COORDINATOR_ADDR");
    }

    #[test]
    #[serial]
    fn env_var_is_used_when_no_explicit_addr() {
        std::env::set_var("CC_COORDINATOR_ADDR", "10.0.0.1:1234");
        assert_eq!(resolve_addr(None).unwrap(), "10.0.0.1:1234".parse().unwrap());
        std::env::remove_var("CC_COORDINATOR_ADDR");
    }

    #[test]
    #[serial]
    fn falls_back_to_the_coordinator_default() {
        std::env::remove_var("CC_COORDINATOR_ADDR");
        assert_eq!(resolve_addr(None).unwrap(), default_addr());
    }

    #[test]
    fn cli_parses_a_job_cancel_invocation() {
        let cli = Cli::parse_from(["ccctl", "job", "cancel", "ecid123"]);
        match cli.command {
            Command::Job { command: JobCommand::Cancel { id } } => assert_eq!(id, "ecid123"),
            _ => panic!("expected Job/Cancel"),
        }
    }
}
