// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live tail of a plugin's build lines.

use pf_core::PluginId;
use pf_wire::Response;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use super::{detect_client_disconnect, ConnectionError, ListenCtx};
use crate::env::ipc_timeout;

/// Stream `Line` frames for `plugin_id` until the client goes away.
///
/// Only lines published after the subscription are delivered. A follower
/// that falls behind loses the oldest lines rather than slowing builds.
pub(super) async fn handle_follow<R, W>(
    plugin_id: PluginId,
    mut reader: R,
    mut writer: W,
    ctx: &ListenCtx,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + AsyncReadExt + Unpin + Send + 'static,
    W: AsyncWrite + AsyncWriteExt + Unpin + Send + 'static,
{
    let mut lines = ctx.status.subscribe();
    // Acknowledge so the client knows the subscription is live
    pf_wire::write_response(&mut writer, &Response::Ok, ipc_timeout()).await?;

    let disconnected = detect_client_disconnect(&mut reader);
    tokio::pin!(disconnected);

    loop {
        let line = tokio::select! {
            line = lines.recv() => line,
            _ = &mut disconnected => {
                debug!(%plugin_id, "follower disconnected");
                return Ok(());
            }
        };
        match line {
            Ok(line) if line.channel == plugin_id => {
                let response = Response::Line { text: line.render(), error: line.error };
                pf_wire::write_response(&mut writer, &response, ipc_timeout()).await?;
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                debug!(%plugin_id, skipped, "follower lagged, lines dropped");
            }
            Err(RecvError::Closed) => return Ok(()),
        }
    }
}
