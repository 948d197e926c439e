// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

mod settings;
mod startup;
pub use settings::{Settings, ToolchainSettings};
pub use startup::startup;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use pf_adapters::{
    BroadcastStatusChannel, FsArtifactStore, JsonMetadataStore, MetadataError, WorkspaceError,
};
use pf_engine::BuildQueue;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/pf)
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Optional overrides for toolchains and limits
    pub settings_path: PathBuf,
    /// Plugin metadata document
    pub metadata_path: PathBuf,
    /// Root of the local object store
    pub artifacts_path: PathBuf,
    /// Root of the per-build workspaces
    pub workspaces_path: PathBuf,
}

impl Config {
    /// Load configuration for the user-level daemon.
    ///
    /// Uses fixed paths under `~/.local/state/pf/` (or `$XDG_STATE_HOME/pf/`).
    pub fn load() -> Result<Self, LifecycleError> {
        Ok(Self::at(crate::env::state_dir()?))
    }

    /// Lay out every path under `state_dir`.
    pub fn at(state_dir: impl Into<PathBuf>) -> Self {
        let state_dir = state_dir.into();
        Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            settings_path: state_dir.join("config.toml"),
            metadata_path: state_dir.join("plugins.json"),
            artifacts_path: state_dir.join("artifacts"),
            workspaces_path: state_dir.join("workspaces"),
            state_dir,
        }
    }
}

/// Daemon state during operation.
///
/// The listener is returned separately from startup to be spawned as a Listener task.
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub queue: BuildQueue,
    pub metadata: Arc<JsonMetadataStore>,
    pub artifacts: Arc<FsArtifactStore>,
    pub status: Arc<BroadcastStatusChannel>,
    /// When daemon started
    pub start_time: Instant,
}

/// Result of daemon startup - includes both the daemon state and the listener.
pub struct StartupResult {
    pub daemon: DaemonState,
    /// The Unix socket listener to spawn as a task
    pub listener: UnixListener,
}

impl DaemonState {
    /// Shutdown the daemon gracefully.
    ///
    /// In-flight builds are abandoned with the process; their workspaces are
    /// swept on the next startup and their plugins keep the previous fingerprint.
    pub fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        let abandoned = self.queue.in_flight();
        if !abandoned.is_empty() {
            warn!(count = abandoned.len(), "abandoning in-flight builds");
        }

        // 1. Remove socket file (listener task stops when tokio runtime exits)
        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            }
        }

        // 2. Remove PID file
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // 3. Lock file is released automatically when self.lock_file is dropped

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Invalid settings in {path}: {message}")]
    Settings { path: PathBuf, message: String },

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
