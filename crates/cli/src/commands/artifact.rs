// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pf artifact` / `pf source` - Fetch stored build objects of a plugin

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use pf_core::PluginId;
use serde::Serialize;

use crate::client::DaemonClient;
use crate::output::{format_or_json, OutputFormat};

#[derive(Args)]
pub struct ArtifactArgs {
    /// Plugin ID
    pub plugin_id: String,
    /// Fetch the release binary instead of the debug one
    #[arg(long)]
    pub release: bool,
    /// Copy the binary here instead of printing its location
    #[arg(short = 'o', long = "out")]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct SourceArgs {
    /// Plugin ID
    pub plugin_id: String,
    /// Copy the archive here instead of printing its location
    #[arg(short = 'o', long = "out")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ArtifactLocation {
    path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<u64>,
}

pub async fn handle(args: ArtifactArgs, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let stored = client.artifact_path(&PluginId::from(args.plugin_id), args.release).await?;
    deliver(stored, args.out, format).await
}

pub async fn handle_source(
    args: SourceArgs,
    client: &DaemonClient,
    format: OutputFormat,
) -> Result<()> {
    let stored = client.source_path(&PluginId::from(args.plugin_id)).await?;
    deliver(stored, args.out, format).await
}

/// Copy a stored object to `out`, or just report where it lives.
async fn deliver(stored: PathBuf, out: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let location = match out {
        Some(dest) => copy_out(&stored, dest).await?,
        None => ArtifactLocation { path: stored, bytes: None },
    };
    format_or_json(format, &location, || match location.bytes {
        Some(bytes) => println!("Wrote {} ({} bytes)", location.path.display(), bytes),
        None => println!("{}", location.path.display()),
    })
}

async fn copy_out(stored: &Path, dest: PathBuf) -> Result<ArtifactLocation> {
    let bytes = tokio::fs::copy(stored, &dest)
        .await
        .with_context(|| format!("cannot copy {} to {}", stored.display(), dest.display()))?;
    Ok(ArtifactLocation { path: dest, bytes: Some(bytes) })
}
