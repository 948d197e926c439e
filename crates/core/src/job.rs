// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build jobs and their state machine.
//!
//! ```text
//! Queued -> Running -> Succeeded
//!                   -> Failed
//! Skipped            (no-change resubmission, never admitted)
//! ```

use crate::artifact::ArtifactKey;
use crate::fingerprint::Fingerprint;
use crate::manifest::Manifest;
use crate::plugin::{BuildProfile, Language, PluginId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

crate::define_id! {
    /// Identifier of a single build attempt.
    pub struct JobId("bld-");
}

/// Lifecycle state of a build attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    /// Admitted, waiting for the executor task to start
    Queued,
    /// Toolchain is running
    Running,
    Succeeded,
    Failed,
    /// Archive matched the last successful build; nothing ran
    Skipped,
}

impl BuildState {
    /// Whether no further transitions are expected
    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildState::Succeeded | BuildState::Failed | BuildState::Skipped)
    }
}

crate::simple_display! {
    BuildState {
        Queued => "queued",
        Running => "running",
        Succeeded => "succeeded",
        Failed => "failed",
        Skipped => "skipped",
    }
}

/// One admitted build attempt.
///
/// The job exclusively owns `workspace` until it reaches a terminal state,
/// at which point the directory is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildJob {
    pub job_id: JobId,
    pub plugin_id: PluginId,
    pub language: Language,
    pub profile: BuildProfile,
    pub workspace: PathBuf,
    pub fingerprint: Fingerprint,
    /// Fingerprint of the last successful build, if any
    pub previous_fingerprint: Option<Fingerprint>,
    /// Name and version the project declares
    pub manifest: Manifest,
    /// Who asked for the build; the system identity when anonymous
    pub submitter: String,
    pub state: BuildState,
    pub created_at_ms: u64,
}

crate::builder! {
    pub struct BuildJobBuilder => BuildJob {
        into {
            plugin_id: PluginId = "plugin-1",
            workspace: PathBuf = "/tmp/pf-test-workspace",
            submitter: String = "tester@example.com",
        }
        set {
            job_id: JobId = JobId::new(),
            language: Language = Language::Compiled,
            profile: BuildProfile = BuildProfile::Build,
            fingerprint: Fingerprint = Fingerprint::of(b"archive"),
            previous_fingerprint: Option<Fingerprint> = None,
            manifest: Manifest = Manifest::new("demo", "0.1.0"),
            state: BuildState = BuildState::Queued,
            created_at_ms: u64 = 1_000_000,
        }
    }
}

impl BuildJob {
    /// `{name}-{version}`, the human-facing name of the produced binary.
    pub fn artifact_name(&self) -> String {
        self.manifest.artifact_name()
    }
}

/// Why a build attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildFailure {
    /// Toolchain exited non-zero (`None` when killed by a signal)
    Toolchain { code: Option<i32> },
    /// Toolchain exceeded the wall-clock limit and was killed
    Timeout { after_ms: u64 },
    /// Toolchain succeeded but the expected output file is absent
    MissingArtifact { path: PathBuf },
    /// Toolchain could not be started
    Spawn { message: String },
    /// Artifact store rejected the upload
    Upload { message: String },
    /// Executor crashed or bookkeeping failed
    Internal { message: String },
}

impl BuildFailure {
    pub fn timeout(after: Duration) -> Self {
        BuildFailure::Timeout { after_ms: after.as_millis() as u64 }
    }
}

impl std::fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildFailure::Toolchain { code: Some(code) } => {
                write!(f, "toolchain exited with status {}", code)
            }
            BuildFailure::Toolchain { code: None } => write!(f, "toolchain killed by signal"),
            BuildFailure::Timeout { after_ms } => {
                write!(f, "build timed out after {}s", after_ms / 1000)
            }
            BuildFailure::MissingArtifact { path } => {
                write!(f, "toolchain produced no artifact at {}", path.display())
            }
            BuildFailure::Spawn { message } => write!(f, "failed to start toolchain: {}", message),
            BuildFailure::Upload { message } => write!(f, "artifact upload failed: {}", message),
            BuildFailure::Internal { message } => write!(f, "internal error: {}", message),
        }
    }
}

/// Result of running a job to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BuildOutcome {
    Succeeded { fingerprint: Fingerprint, profile: BuildProfile, artifact: ArtifactKey },
    Failed { reason: BuildFailure },
}

impl BuildOutcome {
    pub fn failed(reason: BuildFailure) -> Self {
        BuildOutcome::Failed { reason }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Succeeded { .. })
    }

    pub fn state(&self) -> BuildState {
        match self {
            BuildOutcome::Succeeded { .. } => BuildState::Succeeded,
            BuildOutcome::Failed { .. } => BuildState::Failed,
        }
    }
}

/// Summary of the most recent terminal build of a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub job_id: JobId,
    pub plugin_id: PluginId,
    pub state: BuildState,
    pub fingerprint: Fingerprint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub finished_at_ms: u64,
    pub elapsed_ms: u64,
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
