// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin registration handlers.

use pf_adapters::ArtifactStore;
use pf_core::{ArtifactKey, Language, PluginId};
use pf_wire::Response;
use tracing::{info, warn};

use super::ListenCtx;

pub(super) async fn handle_plugin_add(
    ctx: &ListenCtx,
    filename: &str,
    language: Language,
) -> Response {
    let filename = filename.trim();
    if filename.is_empty() {
        return Response::error("plugin filename must not be empty");
    }
    match ctx.metadata.register(filename, language).await {
        Ok(plugin) => {
            info!(plugin_id = %plugin.plugin_id, %language, "registered plugin");
            Response::Plugin { plugin }
        }
        Err(e) => Response::error(e),
    }
}

pub(super) async fn handle_plugin_list(ctx: &ListenCtx) -> Response {
    match ctx.metadata.list().await {
        Ok(plugins) => Response::Plugins { plugins },
        Err(e) => Response::error(e),
    }
}

pub(super) async fn handle_plugin_rename(
    ctx: &ListenCtx,
    id: &PluginId,
    filename: &str,
) -> Response {
    let filename = filename.trim();
    if filename.is_empty() {
        return Response::error("plugin filename must not be empty");
    }
    match ctx.metadata.rename(id, filename).await {
        Ok(plugin) => Response::Plugin { plugin },
        Err(e) => Response::error(e),
    }
}

/// Forget a plugin and delete its stored objects.
///
/// Refused while a build of the plugin is in flight. A binary shared with
/// another plugin (same archive and profile, so same key) is kept. A build
/// admitted after the check finishes into a missing record; the queue
/// discards its binary then.
pub(super) async fn handle_plugin_remove(ctx: &ListenCtx, id: &PluginId) -> Response {
    if ctx.queue.is_running(id) {
        return Response::error(format!("a build of plugin {} is in progress", id));
    }

    let plugin = match ctx.metadata.remove(id).await {
        Ok(plugin) => plugin,
        Err(e) => return Response::error(e),
    };

    let mut keys = vec![ArtifactKey::build_log(id), ArtifactKey::source(id)];
    let binaries = plugin.binaries();
    if !binaries.is_empty() {
        // Keep everything when ownership cannot be checked
        let others = ctx.metadata.list().await.ok();
        for binary in binaries {
            let shared = others
                .as_ref()
                .map_or(true, |others| others.iter().any(|p| p.binaries().contains(&binary)));
            if !shared {
                keys.push(binary);
            }
        }
    }
    for key in &keys {
        if let Err(e) = ctx.artifacts.delete(key).await {
            warn!(plugin_id = %id, %key, error = %e, "failed to delete stored object");
        }
    }

    info!(plugin_id = %id, "removed plugin");
    Response::Plugin { plugin }
}
