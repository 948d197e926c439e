// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Starting and stopping the daemon process.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::client::{ClientError, DaemonClient};

/// How long to wait for `READY` from a freshly spawned daemon.
const START_TIMEOUT: Duration = Duration::from_secs(10);

/// How long to wait for the socket to disappear after a shutdown request.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

/// Locate `pfd`: `PF_DAEMON_BINARY`, then next to this executable, then `PATH`.
pub fn daemon_binary() -> PathBuf {
    if let Some(path) = std::env::var_os("PF_DAEMON_BINARY") {
        return PathBuf::from(path);
    }
    let sibling = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("pfd")))
        .filter(|path| path.is_file());
    sibling.unwrap_or_else(|| PathBuf::from("pfd"))
}

/// Spawn the daemon in the background and wait until it is serving.
pub async fn daemon_start(client: &DaemonClient) -> anyhow::Result<StartOutcome> {
    if client.ping().await.is_ok() {
        return Ok(StartOutcome::AlreadyRunning);
    }

    let binary = daemon_binary();
    let mut child = Command::new(&binary)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| anyhow::anyhow!("cannot start {}: {}", binary.display(), e))?;

    let stdout = child.stdout.take().ok_or_else(|| anyhow::anyhow!("daemon stdout unavailable"))?;
    let mut lines = BufReader::new(stdout).lines();
    let ready = tokio::time::timeout(START_TIMEOUT, async {
        while let Some(line) = lines.next_line().await? {
            if line.trim() == "READY" {
                return Ok(true);
            }
        }
        Ok::<_, std::io::Error>(false)
    })
    .await;

    match ready {
        Ok(Ok(true)) => Ok(StartOutcome::Started),
        Ok(Ok(false)) | Ok(Err(_)) => {
            let mut stderr = String::new();
            if let Some(mut err) = child.stderr.take() {
                use tokio::io::AsyncReadExt;
                let _ = err.read_to_string(&mut stderr).await;
            }
            Err(anyhow::anyhow!("Failed to start daemon: {}", startup_failure_reason(&stderr)))
        }
        Err(_) => Err(anyhow::anyhow!(
            "Daemon did not become ready within {}s",
            START_TIMEOUT.as_secs()
        )),
    }
}

/// Pick the daemon's own `pfd: ` message out of its stderr. The message
/// may span several lines (a TOML parse error does) and leads with the line
/// naming the cause.
fn startup_failure_reason(stderr: &str) -> &str {
    let mut lines = stderr.lines().map(str::trim).filter(|line| !line.is_empty());
    let first = lines.clone().next();
    lines
        .find_map(|line| line.strip_prefix("pfd: "))
        .or(first)
        .unwrap_or("exited before becoming ready")
}

/// Ask the daemon to shut down. Returns `false` when it was not running.
pub async fn daemon_stop(client: &DaemonClient) -> Result<bool, ClientError> {
    match client.shutdown().await {
        Ok(()) => {}
        Err(ClientError::DaemonNotRunning) => return Ok(false),
        Err(e) => return Err(e),
    }

    let deadline = tokio::time::Instant::now() + STOP_TIMEOUT;
    while client.socket_path().exists() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    Ok(true)
}

#[cfg(test)]
#[path = "client_lifecycle_tests.rs"]
mod tests;
