// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use pf_adapters::{
    BroadcastStatusChannel, FsArtifactStore, JsonMetadataStore, LocalWorkspaces,
    ProjectManifestReader,
};
use pf_engine::{BuildDeps, BuildQueue};
use tokio::net::UnixListener;
use tracing::info;

use super::{Config, DaemonState, LifecycleError, Settings, StartupResult};

/// Start the daemon
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // A failed lock means the files belong to the running daemon.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    // 1. Create state directory (needed for socket, lock, etc.)
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents races
    // Use OpenOptions to avoid truncating the file before we hold the lock,
    // which would wipe the running daemon's PID.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    // Write PID to lock file (truncate now that we hold the lock)
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file; // Drop mutability

    // 3. Settings before anything touches disk state, so a bad file fails fast
    let engine_config = Settings::load(&config.settings_path)?.engine_config();
    info!(
        build_timeout_ms = engine_config.build_timeout.as_millis() as u64,
        rust = %engine_config.compiled.program,
        js = %engine_config.interpreted.program,
        "loaded engine settings"
    );

    // 4. Create directories
    std::fs::create_dir_all(&config.artifacts_path)?;
    std::fs::create_dir_all(&config.workspaces_path)?;

    // 5. Sweep workspaces left behind by a previous process. Builds do not
    // survive a restart, so nothing under the root is live yet.
    let workspaces = Arc::new(LocalWorkspaces::new(&config.workspaces_path));
    let swept = workspaces.sweep().await?;
    if swept > 0 {
        info!(count = swept, "removed stale build workspaces");
    }

    // 6. Set up adapters
    let metadata = Arc::new(JsonMetadataStore::open(&config.metadata_path)?);
    let artifacts = Arc::new(FsArtifactStore::new(&config.artifacts_path));
    let status = Arc::new(BroadcastStatusChannel::default());
    let deps = BuildDeps {
        metadata: metadata.clone(),
        artifacts: artifacts.clone(),
        workspaces,
        manifests: Arc::new(ProjectManifestReader::new()),
        status: status.clone(),
    };
    let queue = BuildQueue::new(deps, engine_config);

    // 7. Remove stale socket and bind (LAST - only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!("Daemon started");

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            queue,
            metadata,
            artifacts,
            status,
            start_time: Instant::now(),
        },
        listener,
    })
}

/// Remove files created by a failed startup.
fn cleanup_on_failure(config: &Config) {
    // Remove socket if we created it
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }

    // Remove PID/lock file
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
