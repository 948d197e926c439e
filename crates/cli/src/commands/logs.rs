// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pf logs` - Build output of a plugin, live or from the last build

use anyhow::Result;
use clap::Args;
use pf_core::PluginId;
use serde::Serialize;

use crate::client::DaemonClient;
use crate::color;
use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct LogsArgs {
    /// Plugin ID
    pub plugin_id: String,
    /// Print the stored output of the last finished build and exit
    #[arg(long)]
    pub last: bool,
}

#[derive(Debug, Serialize)]
struct StoredLog<'a> {
    plugin_id: &'a PluginId,
    text: &'a str,
}

pub async fn handle(args: LogsArgs, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let plugin_id = PluginId::from(args.plugin_id);
    if args.last {
        let text = client.last_log(&plugin_id).await?;
        let log = StoredLog { plugin_id: &plugin_id, text: &text };
        return format_or_json(format, &log, || print!("{}", text));
    }
    follow(&plugin_id, client).await
}

/// Print lines as builds of `plugin_id` publish them, until interrupted or
/// the daemon goes away.
async fn follow(plugin_id: &PluginId, client: &DaemonClient) -> Result<()> {
    let mut follower = client.follow(plugin_id).await?;
    eprintln!("{}", color::muted(&format!("Following builds of {} (ctrl-c to stop)", plugin_id)));

    loop {
        tokio::select! {
            line = follower.next_line() => match line? {
                Some(line) if line.error => println!("{}", color::bad(&line.text)),
                Some(line) => println!("{}", line.text),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}
