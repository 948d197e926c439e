// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pf build` - Submit a source archive for building

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use pf_core::{BuildReport, BuildState, JobId, PluginId};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::client::{DaemonClient, FollowLine, Submitted};
use crate::color;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};

/// How often `--wait` polls for the finished report.
const WAIT_POLL: Duration = Duration::from_millis(200);

/// How long to keep printing lines once the report is in.
const DRAIN_GRACE: Duration = Duration::from_millis(100);

#[derive(Args)]
pub struct BuildArgs {
    /// Plugin ID
    pub plugin_id: String,
    /// Zip archive of the plugin sources
    pub archive: PathBuf,
    /// Build with the release profile
    #[arg(long)]
    pub release: bool,
    /// Identity recorded on the build (defaults to the daemon's)
    #[arg(long)]
    pub submitter: Option<String>,
    /// Stream build output and wait for the result
    #[arg(short, long)]
    pub wait: bool,
}

#[derive(Debug, Serialize)]
struct SubmitSummary<'a> {
    plugin_id: &'a PluginId,
    result: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    job_id: Option<&'a JobId>,
}

pub async fn handle(args: BuildArgs, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let plugin_id = PluginId::from(args.plugin_id);

    // Subscribe before submitting so no line is missed
    let follower = if args.wait && format == OutputFormat::Text {
        Some(client.follow(&plugin_id).await?)
    } else {
        None
    };

    let submitted =
        client.submit_build(&plugin_id, &args.archive, args.submitter, args.release).await?;

    let job_id = match &submitted {
        Submitted::Accepted { job_id } => job_id.clone(),
        Submitted::AlreadyRunning => {
            return Err(ExitError::busy(plugin_id.as_str()).into());
        }
        Submitted::NoChanges => {
            let summary =
                SubmitSummary { plugin_id: &plugin_id, result: "no_changes", job_id: None };
            return format_or_json(format, &summary, || {
                println!("No changes detected, skipping build");
            });
        }
    };

    if !args.wait {
        let summary =
            SubmitSummary { plugin_id: &plugin_id, result: "accepted", job_id: Some(&job_id) };
        return format_or_json(format, &summary, || {
            println!("Build {} accepted for plugin {}", job_id, plugin_id);
        });
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<FollowLine>();
    if let Some(mut follower) = follower {
        tokio::spawn(async move {
            while let Ok(Some(line)) = follower.next_line().await {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    }

    let report = loop {
        tokio::select! {
            Some(line) = rx.recv() => print_line(&line),
            _ = tokio::time::sleep(WAIT_POLL) => {
                let (_, last) = client.build_status(&plugin_id).await?;
                if let Some(report) = last.filter(|r| r.job_id == job_id) {
                    break report;
                }
            }
        }
    };
    // Lines published before the report landed may still be in transit
    while let Ok(Some(line)) = tokio::time::timeout(DRAIN_GRACE, rx.recv()).await {
        print_line(&line);
    }

    format_or_json(format, &report, || print_report(&report))?;
    match report.state {
        BuildState::Succeeded => Ok(()),
        _ => Err(ExitError::build_failed(format!(
            "Build {} failed: {}",
            report.job_id,
            report.error.as_deref().unwrap_or("unknown error")
        ))
        .into()),
    }
}

fn print_line(line: &FollowLine) {
    if line.error {
        println!("{}", color::bad(&line.text));
    } else {
        println!("{}", line.text);
    }
}

fn print_report(report: &BuildReport) {
    let secs = report.elapsed_ms as f64 / 1000.0;
    match &report.artifact {
        Some(artifact) => println!(
            "Build {} {} in {:.1}s ({})",
            report.job_id,
            color::state(report.state),
            secs,
            artifact
        ),
        None => println!("Build {} {} in {:.1}s", report.job_id, color::state(report.state), secs),
    }
}
