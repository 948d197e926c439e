// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use pf_core::{Language, PluginId};
use serde::{Deserialize, Serialize};

/// Request from CLI to daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Get daemon status
    Status,

    /// Register a new plugin
    PluginAdd { filename: String, language: Language },

    PluginList,

    /// Forget a plugin and delete its stored objects
    PluginRemove { id: PluginId },

    PluginRename { id: PluginId, filename: String },

    /// Submit a source archive for building
    Build {
        plugin_id: PluginId,
        /// Zip archive on the daemon's filesystem
        archive: PathBuf,
        /// Who is asking; the daemon's system identity when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        submitter: Option<String>,
        #[serde(default)]
        release: bool,
    },

    /// In-flight and last finished build of a plugin
    BuildStatus { plugin_id: PluginId },

    /// Stream live build lines for a plugin until the client disconnects
    Follow { plugin_id: PluginId },

    /// Locate the last successfully built binary of a plugin
    ArtifactGet {
        plugin_id: PluginId,
        #[serde(default)]
        release: bool,
    },

    /// Locate the last uploaded source archive of a plugin
    SourceGet { plugin_id: PluginId },

    /// Stored output of the last finished build of a plugin
    LogsGet { plugin_id: PluginId },

    /// Request daemon shutdown
    Shutdown,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
