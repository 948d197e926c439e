// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pf daemon` - Daemon management commands

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::client::{ClientError, DaemonClient};
use crate::client_lifecycle::{daemon_start, daemon_stop, StartOutcome};
use crate::output::format_elapsed;

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon in the background
    Start,
    /// Stop the daemon; in-flight builds are abandoned
    Stop,
    /// Check daemon status
    Status,
}

pub async fn daemon(args: DaemonArgs, client: &DaemonClient) -> Result<()> {
    match args.command {
        DaemonCommand::Start => match daemon_start(client).await? {
            StartOutcome::Started => println!("Daemon started"),
            StartOutcome::AlreadyRunning => println!("Daemon already running"),
        },
        DaemonCommand::Stop => {
            if daemon_stop(client).await? {
                println!("Daemon stopped");
            } else {
                println!("Daemon not running");
            }
        }
        DaemonCommand::Status => match client.status().await {
            Ok((uptime_secs, in_flight)) => {
                println!("Status: running");
                println!("Uptime: {}", format_elapsed(uptime_secs));
                println!("Builds in flight: {}", in_flight.len());
            }
            Err(ClientError::DaemonNotRunning) => println!("Daemon not running"),
            Err(e) => return Err(e.into()),
        },
    }
    Ok(())
}
