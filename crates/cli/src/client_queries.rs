// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query and command methods for DaemonClient.

use std::path::{Path, PathBuf};

use pf_core::{BuildJob, BuildReport, JobId, Language, PluginId, PluginRecord};
use pf_wire::{Request, Response};

use crate::client::{ClientError, DaemonClient};

/// How the daemon answered a build submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submitted {
    Accepted { job_id: JobId },
    AlreadyRunning,
    NoChanges,
}

impl DaemonClient {
    /// Health check
    pub async fn ping(&self) -> Result<(), ClientError> {
        match self.send(&Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Self::reject(other),
        }
    }

    /// Uptime and in-flight builds
    pub async fn status(&self) -> Result<(u64, Vec<BuildJob>), ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status { uptime_secs, in_flight } => Ok((uptime_secs, in_flight)),
            other => Self::reject(other),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(&Request::Shutdown).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            other => Self::reject(other),
        }
    }

    pub async fn add_plugin(
        &self,
        filename: &str,
        language: Language,
    ) -> Result<PluginRecord, ClientError> {
        let request = Request::PluginAdd { filename: filename.to_string(), language };
        match self.send(&request).await? {
            Response::Plugin { plugin } => Ok(plugin),
            other => Self::reject(other),
        }
    }

    pub async fn list_plugins(&self) -> Result<Vec<PluginRecord>, ClientError> {
        match self.send(&Request::PluginList).await? {
            Response::Plugins { plugins } => Ok(plugins),
            other => Self::reject(other),
        }
    }

    pub async fn rename_plugin(
        &self,
        id: &PluginId,
        filename: &str,
    ) -> Result<PluginRecord, ClientError> {
        let request = Request::PluginRename { id: id.clone(), filename: filename.to_string() };
        match self.send(&request).await? {
            Response::Plugin { plugin } => Ok(plugin),
            other => Self::reject(other),
        }
    }

    pub async fn remove_plugin(&self, id: &PluginId) -> Result<PluginRecord, ClientError> {
        match self.send(&Request::PluginRemove { id: id.clone() }).await? {
            Response::Plugin { plugin } => Ok(plugin),
            other => Self::reject(other),
        }
    }

    /// Submit an archive. The daemon reads the file itself, so relative
    /// paths are resolved against the current directory first.
    pub async fn submit_build(
        &self,
        plugin_id: &PluginId,
        archive: &Path,
        submitter: Option<String>,
        release: bool,
    ) -> Result<Submitted, ClientError> {
        let request = Request::Build {
            plugin_id: plugin_id.clone(),
            archive: absolute(archive),
            submitter,
            release,
        };
        match self.send(&request).await? {
            Response::BuildAccepted { job_id, .. } => Ok(Submitted::Accepted { job_id }),
            Response::AlreadyRunning { .. } => Ok(Submitted::AlreadyRunning),
            Response::NoChanges => Ok(Submitted::NoChanges),
            other => Self::reject(other),
        }
    }

    /// The in-flight build and the last finished build of a plugin
    pub async fn build_status(
        &self,
        plugin_id: &PluginId,
    ) -> Result<(Option<BuildJob>, Option<BuildReport>), ClientError> {
        match self.send(&Request::BuildStatus { plugin_id: plugin_id.clone() }).await? {
            Response::BuildStatus { running, last, .. } => Ok((running.map(|b| *b), last)),
            other => Self::reject(other),
        }
    }

    /// Where the daemon keeps the last built binary of a plugin
    pub async fn artifact_path(
        &self,
        plugin_id: &PluginId,
        release: bool,
    ) -> Result<PathBuf, ClientError> {
        match self.send(&Request::ArtifactGet { plugin_id: plugin_id.clone(), release }).await? {
            Response::Artifact { path } => Ok(path),
            other => Self::reject(other),
        }
    }

    /// Where the daemon keeps the last uploaded source archive of a plugin
    pub async fn source_path(&self, plugin_id: &PluginId) -> Result<PathBuf, ClientError> {
        match self.send(&Request::SourceGet { plugin_id: plugin_id.clone() }).await? {
            Response::Artifact { path } => Ok(path),
            other => Self::reject(other),
        }
    }

    /// Toolchain output of the last finished build of a plugin
    pub async fn last_log(&self, plugin_id: &PluginId) -> Result<String, ClientError> {
        match self.send(&Request::LogsGet { plugin_id: plugin_id.clone() }).await? {
            Response::Logs { text, .. } => Ok(text),
            other => Self::reject(other),
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}
