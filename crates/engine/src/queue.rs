// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build queue: admission control for plugin builds.
//!
//! At most one build per plugin id runs at a time. A submission either
//! wins the plugin's admission slot or is told a build is already running;
//! losers are expected to retry later rather than queue behind the winner.
//!
//! ```text
//! submit ─┬─ slot taken ──────────────────────────────> AlreadyRunning
//!         └─ reserve ─ workspace ─ extract ─ fingerprint
//!                      ├─ same as last success ───────> NoChanges
//!                      ├─ bad manifest ───────────────> InvalidProject
//!                      └─ admit ─ spawn supervisor ───> Accepted(handle)
//!
//! supervisor: executor task ─ remove workspace ─ complete ─ publish state
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use pf_adapters::MetadataError;
use pf_core::{
    ArtifactKey, BuildFailure, BuildJob, BuildOutcome, BuildProfile, BuildReport, BuildState,
    Clock, Fingerprint, JobId, Language, PluginId, SystemClock,
};
use thiserror::Error;
use tokio::sync::watch;

use crate::admission::AdmissionTable;
use crate::config::EngineConfig;
use crate::executor::BuildExecutor;
use crate::BuildDeps;

/// A request to build one plugin archive.
#[derive(Debug, Clone)]
pub struct Submission {
    pub plugin_id: PluginId,
    pub language: Language,
    pub archive: Vec<u8>,
    /// Falls back to the configured system identity
    pub submitter: Option<String>,
    pub profile: BuildProfile,
}

/// Expected outcomes of a submission.
#[derive(Debug)]
pub enum Admission {
    /// Build admitted and running in the background
    Accepted(JobHandle),
    /// Another build of this plugin is in flight; nothing was done
    AlreadyRunning(PluginId),
    /// Archive is identical to the last successful build
    NoChanges,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("empty archive")]
    EmptyArchive,
    #[error("unknown plugin: {0}")]
    UnknownPlugin(PluginId),
    #[error("failed to extract archive: {0}")]
    ExtractionFailed(String),
    #[error("invalid project: {0}")]
    InvalidProject(String),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Handle to an admitted build.
#[derive(Debug, Clone)]
pub struct JobHandle {
    pub job_id: JobId,
    pub plugin_id: PluginId,
    state: watch::Receiver<BuildState>,
}

impl JobHandle {
    pub fn state(&self) -> BuildState {
        *self.state.borrow()
    }

    /// Wait until the build reaches a terminal state.
    pub async fn wait(&mut self) -> BuildState {
        let seen = self.state.wait_for(BuildState::is_terminal).await.map(|state| *state);
        match seen {
            Ok(state) => state,
            // Supervisor gone without publishing; report what we last saw
            Err(_) => *self.state.borrow(),
        }
    }
}

/// The admission controller. Cheap to clone; clones share one table.
pub struct BuildQueue<C: Clock = SystemClock> {
    inner: Arc<Inner<C>>,
}

impl<C: Clock> Clone for BuildQueue<C> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

struct Inner<C: Clock> {
    deps: BuildDeps,
    config: EngineConfig,
    executor: BuildExecutor,
    table: AdmissionTable,
    reports: Mutex<HashMap<PluginId, BuildReport>>,
    clock: C,
}

impl BuildQueue<SystemClock> {
    pub fn new(deps: BuildDeps, config: EngineConfig) -> Self {
        Self::with_clock(deps, config, SystemClock)
    }
}

impl<C: Clock> BuildQueue<C> {
    pub fn with_clock(deps: BuildDeps, config: EngineConfig, clock: C) -> Self {
        let executor = BuildExecutor::new(&deps, config.clone());
        Self {
            inner: Arc::new(Inner {
                deps,
                config,
                executor,
                table: AdmissionTable::new(),
                reports: Mutex::new(HashMap::new()),
                clock,
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Submit an archive for building.
    ///
    /// Returns as soon as the build is admitted; execution continues in the
    /// background. Only the admission slot check is serialized, everything
    /// else runs outside the table lock.
    pub async fn submit(&self, submission: Submission) -> Result<Admission, SubmitError> {
        let Submission { plugin_id, language, archive, submitter, profile } = submission;
        if archive.is_empty() {
            return Err(SubmitError::EmptyArchive);
        }

        let Some(reservation) = self.inner.table.try_reserve(&plugin_id) else {
            tracing::info!(%plugin_id, "build already running, rejecting submission");
            return Ok(Admission::AlreadyRunning(plugin_id));
        };

        let record = match self.inner.deps.metadata.plugin(&plugin_id).await {
            Ok(record) => record,
            Err(MetadataError::NotFound(id)) => return Err(SubmitError::UnknownPlugin(id)),
            Err(e) => return Err(SubmitError::Internal(e.to_string())),
        };

        let workspaces = &self.inner.deps.workspaces;
        let workspace = workspaces
            .create(profile, &plugin_id)
            .await
            .map_err(|e| SubmitError::Internal(e.to_string()))?;

        if let Err(e) = workspaces.extract(&archive, language.extraction_mode(), &workspace).await {
            self.release_workspace(profile, &workspace).await;
            tracing::info!(%plugin_id, error = %e, "archive extraction failed");
            return Err(SubmitError::ExtractionFailed(e.to_string()));
        }

        let fingerprint = Fingerprint::of(&archive);
        if record.fingerprint_for(profile) == Some(&fingerprint) {
            self.release_workspace(profile, &workspace).await;
            self.inner.deps.status.publish(&plugin_id, profile, "No changes detected, skipping build");
            tracing::info!(%plugin_id, %fingerprint, "archive unchanged, skipping build");
            return Ok(Admission::NoChanges);
        }

        let manifest = match self.inner.deps.manifests.read(&workspace, language).await {
            Ok(manifest) => manifest,
            Err(e) => {
                self.release_workspace(profile, &workspace).await;
                tracing::info!(%plugin_id, error = %e, "invalid project");
                return Err(SubmitError::InvalidProject(e.to_string()));
            }
        };

        let job = BuildJob {
            job_id: JobId::new(),
            plugin_id: plugin_id.clone(),
            language,
            profile,
            workspace,
            fingerprint,
            previous_fingerprint: record.fingerprint_for(profile).cloned(),
            manifest,
            submitter: self.inner.config.submitter(submitter),
            state: BuildState::Queued,
            created_at_ms: self.inner.clock.epoch_ms(),
        };
        self.inner.deps.status.publish(&plugin_id, profile, "Different hash, scheduling build");
        tracing::info!(
            %plugin_id,
            job_id = %job.job_id,
            fingerprint = %job.fingerprint,
            submitter = %job.submitter,
            "build admitted"
        );

        let (state_tx, state_rx) = watch::channel(BuildState::Queued);
        let handle =
            JobHandle { job_id: job.job_id.clone(), plugin_id: plugin_id.clone(), state: state_rx };
        reservation.promote(job.clone());
        self.spawn_supervisor(job, state_tx);

        Ok(Admission::Accepted(handle))
    }

    /// Whether a build for `plugin_id` is in flight (or being admitted).
    pub fn is_running(&self, plugin_id: &PluginId) -> bool {
        self.inner.table.contains(plugin_id)
    }

    /// Record a terminal outcome and free the plugin's admission slot.
    ///
    /// The fingerprint is persisted before the slot is freed, so a
    /// resubmission admitted right after sees it. Safe to call when the
    /// plugin has no admitted build.
    pub async fn complete(&self, plugin_id: &PluginId, outcome: &BuildOutcome) {
        if let BuildOutcome::Succeeded { fingerprint, profile, artifact } = outcome {
            let metadata = &self.inner.deps.metadata;
            match metadata.set_last_fingerprint(plugin_id, *profile, fingerprint).await {
                Ok(()) => {}
                Err(MetadataError::NotFound(_)) => self.discard_orphan(plugin_id, artifact).await,
                Err(e) => {
                    tracing::error!(%plugin_id, error = %e, "failed to persist build fingerprint");
                }
            }
        }
        if !self.inner.table.remove(plugin_id) {
            tracing::debug!(%plugin_id, "complete called without an admitted build");
        }
    }

    /// The plugin was removed while its build ran. Nothing points at the
    /// objects the build stored, so delete them unless another plugin owns
    /// the same binary.
    async fn discard_orphan(&self, plugin_id: &PluginId, binary: &ArtifactKey) {
        tracing::warn!(%plugin_id, %binary, "plugin removed during build, discarding its objects");
        let mut keys = vec![ArtifactKey::build_log(plugin_id), ArtifactKey::source(plugin_id)];
        match self.inner.deps.metadata.list().await {
            Ok(others) if !others.iter().any(|p| p.binaries().contains(binary)) => {
                keys.push(binary.clone());
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(%plugin_id, error = %e, "cannot check binary owners, keeping it");
            }
        }
        for key in &keys {
            if let Err(e) = self.inner.deps.artifacts.delete(key).await {
                tracing::warn!(%plugin_id, %key, error = %e, "failed to delete stored object");
            }
        }
    }

    /// The in-flight build of `plugin_id`, if any.
    pub fn status(&self, plugin_id: &PluginId) -> Option<BuildJob> {
        self.inner.table.job(plugin_id)
    }

    pub fn in_flight(&self) -> Vec<BuildJob> {
        self.inner.table.snapshot()
    }

    /// The most recent finished build of `plugin_id` in this process.
    pub fn recent(&self, plugin_id: &PluginId) -> Option<BuildReport> {
        self.inner.reports.lock().get(plugin_id).cloned()
    }

    fn spawn_supervisor(&self, job: BuildJob, state_tx: watch::Sender<BuildState>) {
        let queue = self.clone();
        tokio::spawn(async move {
            let started = queue.inner.clock.now();
            queue.inner.table.set_state(&job.plugin_id, BuildState::Running);
            state_tx.send_replace(BuildState::Running);

            let executor = queue.inner.executor.clone();
            let exec_job = job.clone();
            let task = tokio::spawn(async move { executor.run(&exec_job).await });
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(plugin_id = %job.plugin_id, error = %e, "build task crashed");
                    let reason = BuildFailure::Internal { message: e.to_string() };
                    queue.inner.deps.status.publish_error(
                        &job.plugin_id,
                        job.profile,
                        &reason.to_string(),
                    );
                    BuildOutcome::failed(reason)
                }
            };

            queue.release_workspace(job.profile, &job.workspace).await;
            queue.complete(&job.plugin_id, &outcome).await;

            let elapsed = queue.inner.clock.now().saturating_duration_since(started);
            queue.record_report(&job, &outcome, elapsed.as_millis() as u64);
            state_tx.send_replace(outcome.state());
        });
    }

    fn record_report(&self, job: &BuildJob, outcome: &BuildOutcome, elapsed_ms: u64) {
        let (artifact, error) = match outcome {
            BuildOutcome::Succeeded { artifact, .. } => (Some(artifact.clone()), None),
            BuildOutcome::Failed { reason } => (None, Some(reason.to_string())),
        };
        let report = BuildReport {
            job_id: job.job_id.clone(),
            plugin_id: job.plugin_id.clone(),
            state: outcome.state(),
            fingerprint: job.fingerprint.clone(),
            artifact,
            error,
            finished_at_ms: self.inner.clock.epoch_ms(),
            elapsed_ms,
        };
        self.inner.reports.lock().insert(job.plugin_id.clone(), report);
    }

    async fn release_workspace(&self, profile: BuildProfile, workspace: &Path) {
        if let Err(e) = self.inner.deps.workspaces.remove(profile, workspace).await {
            tracing::warn!(workspace = %workspace.display(), error = %e, "failed to remove workspace");
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
