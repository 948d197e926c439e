// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pf-engine: admission control and execution of plugin builds

pub mod admission;
mod config;
mod executor;
mod queue;
mod toolchain;

use std::sync::Arc;

use pf_adapters::{ArtifactStore, BuildWorkspace, ManifestReader, MetadataStore, StatusChannel};

pub use admission::{AdmissionTable, Reservation};
pub use config::{EngineConfig, DEFAULT_BUILD_TIMEOUT, DEFAULT_SYSTEM_IDENTITY};
pub use executor::BuildExecutor;
pub use queue::{Admission, BuildQueue, JobHandle, Submission, SubmitError};
pub use toolchain::ToolchainConfig;

/// Collaborators the build queue depends on.
#[derive(Clone)]
pub struct BuildDeps {
    pub metadata: Arc<dyn MetadataStore>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub workspaces: Arc<dyn BuildWorkspace>,
    pub manifests: Arc<dyn ManifestReader>,
    pub status: Arc<dyn StatusChannel>,
}

#[cfg(test)]
mod test_helpers;
