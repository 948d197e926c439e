// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pf-adapters: the build queue's collaborators and their implementations

mod archive;
pub mod artifact;
pub mod manifest;
pub mod metadata;
pub mod status;
pub mod subprocess;
pub mod workspace;

pub use artifact::{ArtifactError, ArtifactStore, FsArtifactStore};
pub use manifest::{ManifestError, ManifestReader, ProjectManifestReader};
pub use metadata::{JsonMetadataStore, MetadataError, MetadataStore};
pub use status::{BroadcastStatusChannel, StatusChannel, StatusLine};
pub use subprocess::{run_streaming, SubprocessError};
pub use workspace::{BuildWorkspace, LocalWorkspaces, WorkspaceError};

#[cfg(any(test, feature = "test-support"))]
pub use artifact::FakeArtifactStore;
#[cfg(any(test, feature = "test-support"))]
pub use metadata::FakeMetadataStore;
#[cfg(any(test, feature = "test-support"))]
pub use status::FakeStatusChannel;
