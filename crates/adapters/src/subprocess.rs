// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution with line streaming and a wall-clock limit.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum SubprocessError {
    #[error("failed to spawn: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("io error while waiting: {0}")]
    Io(#[from] std::io::Error),
}

/// Run `cmd`, handing every stdout and stderr line to `on_line` as it
/// arrives, and kill it if it runs longer than `timeout`.
///
/// Lines from the two streams are interleaved in arrival order. Output
/// that is not valid UTF-8 is decoded lossily.
pub async fn run_streaming<F>(
    mut cmd: Command,
    timeout: Duration,
    mut on_line: F,
) -> Result<ExitStatus, SubprocessError>
where
    F: FnMut(&str) + Send,
{
    cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);
    let mut child = cmd.spawn().map_err(SubprocessError::Spawn)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(forward_lines(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward_lines(stderr, tx.clone()));
    }
    drop(tx);

    let run = async {
        // Ends once both pipes are closed
        while let Some(line) = rx.recv().await {
            on_line(&line);
        }
        child.wait().await
    };
    let result = tokio::time::timeout(timeout, run).await;

    match result {
        Ok(status) => Ok(status?),
        Err(_) => {
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, "failed to kill timed out process");
            }
            Err(SubprocessError::Timeout(timeout))
        }
    }
}

async fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                if tx.send(line.to_string()).is_err() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
