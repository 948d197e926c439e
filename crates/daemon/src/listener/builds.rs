// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build submission, status, and lookup of stored build objects.

use std::path::Path;

use pf_adapters::{ArtifactError, ArtifactStore, MetadataError};
use pf_core::{ArtifactKey, BuildProfile, PluginId, PluginRecord};
use pf_engine::{Admission, Submission};
use pf_wire::Response;
use tracing::{info, warn};

use super::ListenCtx;

pub(super) async fn handle_build(
    ctx: &ListenCtx,
    plugin_id: PluginId,
    archive: &Path,
    submitter: Option<String>,
    release: bool,
) -> Response {
    let bytes = match tokio::fs::read(archive).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return Response::error(format!("cannot read archive {}: {}", archive.display(), e))
        }
    };

    let record = match ctx.metadata.plugin(&plugin_id).await {
        Ok(record) => record,
        Err(e) => return Response::error(e),
    };

    let submission = Submission {
        plugin_id: plugin_id.clone(),
        language: record.language,
        archive: bytes.clone(),
        submitter,
        profile: BuildProfile::from_release(release),
    };

    match ctx.queue.submit(submission).await {
        Ok(Admission::Accepted(handle)) => {
            // Keep the uploaded sources next to the build products
            if let Err(e) = ctx.artifacts.put(&ArtifactKey::source(&plugin_id), bytes).await {
                warn!(%plugin_id, error = %e, "failed to store source archive");
            }
            Response::BuildAccepted { job_id: handle.job_id, plugin_id: handle.plugin_id }
        }
        Ok(Admission::AlreadyRunning(plugin_id)) => Response::AlreadyRunning { plugin_id },
        Ok(Admission::NoChanges) => Response::NoChanges,
        Err(e) => Response::error(e),
    }
}

pub(super) fn handle_build_status(ctx: &ListenCtx, plugin_id: PluginId) -> Response {
    let running = ctx.queue.status(&plugin_id).map(Box::new);
    let last = ctx.queue.recent(&plugin_id);
    Response::BuildStatus { plugin_id, running, last }
}

/// Locate the binary of the last successful `profile` build.
pub(super) async fn handle_artifact_get(
    ctx: &ListenCtx,
    plugin_id: &PluginId,
    profile: BuildProfile,
) -> Response {
    let record = match lookup(ctx, plugin_id).await {
        Ok(record) => record,
        Err(response) => return response,
    };
    let Some(fingerprint) = record.fingerprint_for(profile) else {
        return Response::error(format!("plugin {} has no successful {} build", plugin_id, profile));
    };
    stored_path(ctx, plugin_id, ArtifactKey::binary(fingerprint, profile))
}

/// Locate the source archive of the last admitted build.
pub(super) async fn handle_source_get(ctx: &ListenCtx, plugin_id: &PluginId) -> Response {
    if let Err(response) = lookup(ctx, plugin_id).await {
        return response;
    }
    let key = ArtifactKey::source(plugin_id);
    if !ctx.artifacts.path_of(&key).is_file() {
        return Response::error(format!("plugin {} has no uploaded source", plugin_id));
    }
    stored_path(ctx, plugin_id, key)
}

/// Read back the toolchain output kept from the last finished build.
pub(super) async fn handle_logs_get(ctx: &ListenCtx, plugin_id: PluginId) -> Response {
    if let Err(response) = lookup(ctx, &plugin_id).await {
        return response;
    }
    match ctx.artifacts.get(&ArtifactKey::build_log(&plugin_id)).await {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            Response::Logs { plugin_id, text }
        }
        Err(ArtifactError::NotFound(_)) => {
            Response::error(format!("plugin {} has no finished build", plugin_id))
        }
        Err(e) => {
            warn!(%plugin_id, error = %e, "failed to read build log");
            Response::error(e)
        }
    }
}

async fn lookup(ctx: &ListenCtx, plugin_id: &PluginId) -> Result<PluginRecord, Response> {
    match ctx.metadata.plugin(plugin_id).await {
        Ok(record) => Ok(record),
        Err(e @ MetadataError::NotFound(_)) => Err(Response::error(e)),
        Err(e) => {
            warn!(%plugin_id, error = %e, "metadata lookup failed");
            Err(Response::error(e))
        }
    }
}

fn stored_path(ctx: &ListenCtx, plugin_id: &PluginId, key: ArtifactKey) -> Response {
    let path = ctx.artifacts.path_of(&key);
    if !path.is_file() {
        warn!(%plugin_id, %key, "recorded artifact is missing from the store");
        return Response::error(format!("artifact {} is missing", key));
    }
    info!(%plugin_id, %key, "artifact located");
    Response::Artifact { path }
}
