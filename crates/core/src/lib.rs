// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pf-core: domain types for the plugin build service

pub mod macros;

pub mod artifact;
pub mod clock;
pub mod fingerprint;
pub mod id;
pub mod job;
pub mod manifest;
pub mod plugin;

pub use artifact::{ArtifactKey, InvalidKey};
pub use clock::{Clock, FakeClock, SystemClock};
pub use fingerprint::Fingerprint;
pub use id::short;
#[cfg(any(test, feature = "test-support"))]
pub use job::BuildJobBuilder;
pub use job::{BuildFailure, BuildJob, BuildOutcome, BuildReport, BuildState, JobId};
pub use manifest::Manifest;
pub use plugin::{BuildProfile, ExtractionMode, Language, PluginId, PluginRecord, UnknownLanguage};
