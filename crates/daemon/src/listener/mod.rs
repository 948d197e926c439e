// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener runs in a spawned task, accepting connections and handling
//! each one in its own task. Builds run in the background on the queue, so
//! a handler never waits for a toolchain.

mod builds;
mod follow;
mod plugins;

use std::sync::Arc;
use std::time::Instant;

use pf_adapters::{FsArtifactStore, MetadataStore, StatusChannel};
use pf_core::BuildProfile;
use pf_engine::BuildQueue;
use pf_wire::{ProtocolError, Request, Response};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::env::ipc_timeout;
use crate::lifecycle::DaemonState;

/// Shared daemon context for all request handlers.
pub struct ListenCtx {
    pub queue: BuildQueue,
    pub metadata: Arc<dyn MetadataStore>,
    pub artifacts: Arc<FsArtifactStore>,
    pub status: Arc<dyn StatusChannel>,
    pub start_time: Instant,
    pub shutdown: Arc<Notify>,
}

impl ListenCtx {
    pub fn new(daemon: &DaemonState, shutdown: Arc<Notify>) -> Self {
        Self {
            queue: daemon.queue.clone(),
            metadata: daemon.metadata.clone(),
            artifacts: daemon.artifacts.clone(),
            status: daemon.status.clone(),
            start_time: daemon.start_time,
            shutdown,
        }
    }
}

/// Listener task for accepting socket connections.
pub struct Listener {
    unix: UnixListener,
    ctx: Arc<ListenCtx>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub(crate) enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl Listener {
    pub fn new(unix: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { unix, ctx }
    }

    /// Run the listener loop, spawning a task for each connection.
    pub async fn run(self) {
        loop {
            match self.unix.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        let (reader, writer) = stream.into_split();
                        if let Err(e) = handle_connection(reader, writer, &ctx).await {
                            log_connection_error(e);
                        }
                    });
                }
                Err(e) => error!("Unix accept error: {}", e),
            }
        }
    }
}

fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Protocol(ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected")
        }
        ConnectionError::Protocol(ProtocolError::Timeout) => {
            warn!("Connection timeout")
        }
        _ => error!("Connection error: {}", e),
    }
}

/// Handle a single client connection.
///
/// Races the request handler against client disconnect detection, so a
/// client that gives up does not keep a handler alive. Builds admitted
/// before the disconnect keep running on the queue.
pub(crate) async fn handle_connection<R, W>(
    mut reader: R,
    mut writer: W,
    ctx: &ListenCtx,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + AsyncReadExt + Unpin + Send + 'static,
    W: AsyncWrite + AsyncWriteExt + Unpin + Send + 'static,
{
    let request = pf_wire::read_request(&mut reader, ipc_timeout()).await?;

    // Polling requests at debug level, everything else at info
    if matches!(request, Request::Ping | Request::Status | Request::BuildStatus { .. }) {
        debug!(request = ?request, "received query");
    } else {
        info!(request = ?request, "received request");
    }

    // Follow turns the connection into a one-way stream of lines.
    if let Request::Follow { plugin_id } = request {
        return follow::handle_follow(plugin_id, reader, writer, ctx).await;
    }

    let response = tokio::select! {
        response = handle_request(request, ctx) => response,
        _ = detect_client_disconnect(&mut reader) => {
            debug!("Client disconnected, cancelling handler");
            return Ok(());
        }
    };

    debug!("Sending response: {:?}", response);

    pf_wire::write_response(&mut writer, &response, ipc_timeout()).await?;

    Ok(())
}

/// Detect client disconnect by reading from the socket after the request.
///
/// In the request-response protocol, the client sends one request then waits.
/// If the client disconnects, reading returns 0 bytes (EOF).
async fn detect_client_disconnect<R: AsyncReadExt + Unpin>(reader: &mut R) {
    let mut buf = [0u8; 1];
    let _ = reader.read(&mut buf).await;
}

/// Handle a single request and return a response.
pub(crate) async fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Status => Response::Status {
            uptime_secs: ctx.start_time.elapsed().as_secs(),
            in_flight: ctx.queue.in_flight(),
        },

        Request::PluginAdd { filename, language } => {
            plugins::handle_plugin_add(ctx, &filename, language).await
        }

        Request::PluginList => plugins::handle_plugin_list(ctx).await,

        Request::PluginRemove { id } => plugins::handle_plugin_remove(ctx, &id).await,

        Request::PluginRename { id, filename } => {
            plugins::handle_plugin_rename(ctx, &id, &filename).await
        }

        Request::Build { plugin_id, archive, submitter, release } => {
            builds::handle_build(ctx, plugin_id, &archive, submitter, release).await
        }

        Request::BuildStatus { plugin_id } => builds::handle_build_status(ctx, plugin_id),

        Request::ArtifactGet { plugin_id, release } => {
            builds::handle_artifact_get(ctx, &plugin_id, BuildProfile::from_release(release)).await
        }

        Request::SourceGet { plugin_id } => builds::handle_source_get(ctx, &plugin_id).await,

        Request::LogsGet { plugin_id } => builds::handle_logs_get(ctx, plugin_id).await,

        // Handled before dispatch in handle_connection
        Request::Follow { .. } => Response::error("follow must be the only request on a connection"),

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }
    }
}

#[cfg(test)]
mod test_helpers;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
