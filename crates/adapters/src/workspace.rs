// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build workspace adapter.
//!
//! A workspace is a scratch directory holding one build attempt's
//! extracted source. Each attempt gets a fresh directory, so two attempts
//! never share files even when they build the same plugin.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pf_core::{BuildProfile, ExtractionMode, PluginId};
use thiserror::Error;

use crate::archive::unpack_zip;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("workspace io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid archive: {0}")]
    Archive(String),
    #[error("archive entry escapes the workspace: {0}")]
    UnsafeEntry(String),
    #[error("refusing to remove {path}: not a {profile} workspace")]
    OutsideRoot { path: PathBuf, profile: BuildProfile },
    #[error("extraction task failed: {0}")]
    Join(String),
}

#[async_trait]
pub trait BuildWorkspace: Send + Sync {
    /// Create an empty, uniquely named directory for one build attempt.
    async fn create(&self, profile: BuildProfile, plugin_id: &PluginId)
        -> Result<PathBuf, WorkspaceError>;

    /// Unpack a zip archive into a workspace created by `create`.
    async fn extract(
        &self,
        archive: &[u8],
        mode: ExtractionMode,
        path: &Path,
    ) -> Result<(), WorkspaceError>;

    /// Delete a workspace. Removing an already-absent workspace succeeds.
    async fn remove(&self, profile: BuildProfile, path: &Path) -> Result<(), WorkspaceError>;
}

/// Workspaces under a local directory: `{root}/{build|release}/{plugin}-{nonce}`.
#[derive(Debug, Clone)]
pub struct LocalWorkspaces {
    root: PathBuf,
}

impl LocalWorkspaces {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn kind_root(&self, profile: BuildProfile) -> PathBuf {
        self.root.join(profile.to_string())
    }

    /// Remove every workspace left behind by a previous process.
    ///
    /// Only safe before any build is admitted. Returns how many directories
    /// were removed.
    pub async fn sweep(&self) -> Result<usize, WorkspaceError> {
        let mut removed = 0;
        for profile in [BuildProfile::Build, BuildProfile::Release] {
            let kind_root = self.kind_root(profile);
            let mut entries = match tokio::fs::read_dir(&kind_root).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                match tokio::fs::remove_dir_all(&path).await {
                    Ok(()) => removed += 1,
                    Err(e) => tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to sweep stale workspace"
                    ),
                }
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl BuildWorkspace for LocalWorkspaces {
    async fn create(
        &self,
        profile: BuildProfile,
        plugin_id: &PluginId,
    ) -> Result<PathBuf, WorkspaceError> {
        let path = self
            .kind_root(profile)
            .join(format!("{}-{}", plugin_id, nanoid::nanoid!(8, &nanoid::alphabet::SAFE)));
        tokio::fs::create_dir_all(&path).await?;
        tracing::debug!(%plugin_id, path = %path.display(), "created workspace");
        Ok(path)
    }

    async fn extract(
        &self,
        archive: &[u8],
        mode: ExtractionMode,
        path: &Path,
    ) -> Result<(), WorkspaceError> {
        let archive = archive.to_vec();
        let dest = path.to_path_buf();
        let written = tokio::task::spawn_blocking(move || unpack_zip(&archive, mode, &dest))
            .await
            .map_err(|e| WorkspaceError::Join(e.to_string()))??;
        tracing::debug!(path = %path.display(), files = written, "extracted archive");
        Ok(())
    }

    async fn remove(&self, profile: BuildProfile, path: &Path) -> Result<(), WorkspaceError> {
        let kind_root = self.kind_root(profile);
        if !path.starts_with(&kind_root) || path == kind_root {
            return Err(WorkspaceError::OutsideRoot { path: path.to_path_buf(), profile });
        }
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
