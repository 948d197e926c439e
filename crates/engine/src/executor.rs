// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build executor: runs a toolchain against a workspace and promotes the
//! produced binary to the artifact store.

use std::process::ExitStatus;
use std::sync::Arc;

use pf_adapters::{
    run_streaming, ArtifactStore, BuildWorkspace, MetadataStore, StatusChannel, SubprocessError,
};
use pf_core::{ArtifactKey, BuildFailure, BuildJob, BuildOutcome};

use crate::config::EngineConfig;
use crate::toolchain::is_within;
use crate::BuildDeps;

/// Runs admitted jobs. Holds no per-job state, so one executor can run
/// any number of jobs concurrently.
#[derive(Clone)]
pub struct BuildExecutor {
    artifacts: Arc<dyn ArtifactStore>,
    metadata: Arc<dyn MetadataStore>,
    workspaces: Arc<dyn BuildWorkspace>,
    status: Arc<dyn StatusChannel>,
    config: EngineConfig,
}

impl BuildExecutor {
    pub fn new(deps: &BuildDeps, config: EngineConfig) -> Self {
        Self {
            artifacts: Arc::clone(&deps.artifacts),
            metadata: Arc::clone(&deps.metadata),
            workspaces: Arc::clone(&deps.workspaces),
            status: Arc::clone(&deps.status),
            config,
        }
    }

    /// Build `job` to completion. Never fails: every problem becomes
    /// [`BuildOutcome::Failed`] plus an error line on the status channel.
    pub async fn run(&self, job: &BuildJob) -> BuildOutcome {
        let toolchain = self.config.toolchain(job.language);
        self.status.publish(&job.plugin_id, job.profile, "Starting build");
        tracing::info!(
            plugin_id = %job.plugin_id,
            job_id = %job.job_id,
            command = %toolchain.display(job),
            workspace = %job.workspace.display(),
            "running toolchain"
        );

        let mut log = String::new();
        let result = run_streaming(toolchain.command(job), self.config.build_timeout, |line| {
            self.status.publish(&job.plugin_id, job.profile, line);
            log.push_str(line);
            log.push('\n');
        })
        .await;
        self.upload_log(job, log).await;

        let outcome = match check_exit(result, self.config.build_timeout) {
            Ok(()) => self.promote(job).await,
            Err(reason) => BuildOutcome::failed(reason),
        };

        match &outcome {
            BuildOutcome::Succeeded { artifact, .. } => {
                self.status.publish(&job.plugin_id, job.profile, "Build done.");
                tracing::info!(plugin_id = %job.plugin_id, %artifact, "build succeeded");
            }
            BuildOutcome::Failed { reason } => {
                self.status.publish_error(&job.plugin_id, job.profile, &reason.to_string());
                tracing::warn!(plugin_id = %job.plugin_id, %reason, "build failed");
            }
        }

        if let Err(e) = self.workspaces.remove(job.profile, &job.workspace).await {
            tracing::warn!(
                plugin_id = %job.plugin_id,
                workspace = %job.workspace.display(),
                error = %e,
                "failed to remove workspace"
            );
        }
        outcome
    }

    /// Upload the produced binary under its content-addressed, per-profile key.
    async fn promote(&self, job: &BuildJob) -> BuildOutcome {
        let path = self.config.toolchain(job.language).artifact_path(job);
        if !is_within(&job.workspace, &path) {
            return BuildOutcome::failed(BuildFailure::MissingArtifact { path });
        }
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return BuildOutcome::failed(BuildFailure::MissingArtifact { path });
            }
            Err(e) => {
                return BuildOutcome::failed(BuildFailure::Internal { message: e.to_string() });
            }
        };

        let key = ArtifactKey::binary(&job.fingerprint, job.profile);
        if let Err(e) = self.artifacts.put(&key, bytes).await {
            return BuildOutcome::failed(BuildFailure::Upload { message: e.to_string() });
        }
        if let Err(e) = self.metadata.record_artifact(&job.plugin_id, &key, &job.artifact_name()).await
        {
            tracing::warn!(plugin_id = %job.plugin_id, error = %e, "failed to record artifact");
        }
        BuildOutcome::Succeeded {
            fingerprint: job.fingerprint.clone(),
            profile: job.profile,
            artifact: key,
        }
    }

    /// Keep the toolchain output for later inspection; a lost log never
    /// fails the build.
    async fn upload_log(&self, job: &BuildJob, log: String) {
        let key = ArtifactKey::build_log(&job.plugin_id);
        if let Err(e) = self.artifacts.put(&key, log.into_bytes()).await {
            tracing::warn!(plugin_id = %job.plugin_id, error = %e, "failed to upload build log");
        }
    }
}

fn check_exit(
    result: Result<ExitStatus, SubprocessError>,
    timeout: std::time::Duration,
) -> Result<(), BuildFailure> {
    match result {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(BuildFailure::Toolchain { code: status.code() }),
        Err(SubprocessError::Timeout(_)) => Err(BuildFailure::timeout(timeout)),
        Err(SubprocessError::Spawn(e)) => Err(BuildFailure::Spawn { message: e.to_string() }),
        Err(SubprocessError::Io(e)) => Err(BuildFailure::Internal { message: e.to_string() }),
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
