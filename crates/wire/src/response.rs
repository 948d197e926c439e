// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use pf_core::{BuildJob, BuildReport, JobId, PluginId, PluginRecord};
use serde::{Deserialize, Serialize};

/// Response from daemon to CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success
    Ok,

    /// Health check response
    Pong,

    /// Daemon is shutting down
    ShuttingDown,

    /// Daemon status
    Status { uptime_secs: u64, in_flight: Vec<BuildJob> },

    Plugin { plugin: PluginRecord },

    Plugins { plugins: Vec<PluginRecord> },

    /// Build admitted; it continues in the background
    BuildAccepted { job_id: JobId, plugin_id: PluginId },

    /// Another build of this plugin is still running
    AlreadyRunning { plugin_id: PluginId },

    /// Archive matches the last successful build
    NoChanges,

    BuildStatus {
        plugin_id: PluginId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        running: Option<Box<BuildJob>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last: Option<BuildReport>,
    },

    /// One streamed build line, already rendered
    Line {
        text: String,
        #[serde(default)]
        error: bool,
    },

    /// Path of a stored object on the daemon's filesystem
    Artifact { path: PathBuf },

    /// Toolchain output of the last finished build
    Logs { plugin_id: PluginId, text: String },

    /// Error response
    Error { message: String },
}

impl Response {
    pub fn error(message: impl std::fmt::Display) -> Self {
        Response::Error { message: message.to_string() }
    }
}
