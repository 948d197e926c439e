// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pf status` - Daemon overview or build status of one plugin

use anyhow::Result;
use pf_core::{BuildJob, BuildReport, PluginId};
use serde::Serialize;

use crate::client::DaemonClient;
use crate::color;
use crate::output::{
    format_elapsed, format_or_json, format_time_ago, handle_list, write_table, OutputFormat,
};

#[derive(Debug, Serialize)]
struct PluginStatus<'a> {
    plugin_id: &'a PluginId,
    running: Option<&'a BuildJob>,
    last: Option<&'a BuildReport>,
}

pub async fn handle(
    plugin_id: Option<String>,
    client: &DaemonClient,
    format: OutputFormat,
) -> Result<()> {
    match plugin_id {
        Some(id) => plugin_status(PluginId::from(id), client, format).await,
        None => overview(client, format).await,
    }
}

async fn overview(client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let (uptime_secs, in_flight) = client.status().await?;
    if format == OutputFormat::Text {
        println!("{} running (uptime {})", color::header("Daemon:"), format_elapsed(uptime_secs));
    }
    handle_list(format, &in_flight, "No builds in flight", |jobs, out| {
        let rows: Vec<Vec<String>> = jobs.iter().map(job_row).collect();
        write_table(out, &["JOB", "PLUGIN", "PROFILE", "STATE", "SUBMITTER", "AGE"], &rows);
    })
}

async fn plugin_status(
    plugin_id: PluginId,
    client: &DaemonClient,
    format: OutputFormat,
) -> Result<()> {
    let (running, last) = client.build_status(&plugin_id).await?;
    let status =
        PluginStatus { plugin_id: &plugin_id, running: running.as_ref(), last: last.as_ref() };
    format_or_json(format, &status, || {
        println!("{} {}", color::header("Plugin:"), plugin_id);
        match &running {
            Some(job) => println!(
                "  Running: {} {} ({}, submitted by {})",
                job.job_id,
                color::state(job.state),
                job.profile,
                job.submitter
            ),
            None => println!("  Running: {}", color::muted("none")),
        }
        match &last {
            Some(report) => {
                println!(
                    "  Last:    {} {} {} ago",
                    report.job_id,
                    color::state(report.state),
                    format_time_ago(report.finished_at_ms)
                );
                if let Some(error) = &report.error {
                    println!("  Error:   {}", color::bad(error));
                }
            }
            None => println!("  Last:    {}", color::muted("none")),
        }
    })
}

fn job_row(job: &BuildJob) -> Vec<String> {
    vec![
        job.job_id.to_string(),
        job.plugin_id.to_string(),
        job.profile.to_string(),
        color::state(job.state),
        job.submitter.clone(),
        format_time_ago(job.created_at_ms),
    ]
}
