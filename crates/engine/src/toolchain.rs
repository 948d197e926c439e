// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Toolchain invocation per plugin language.
//!
//! Arguments and the artifact path are templates. Placeholders:
//!
//! - `{name}`: manifest name
//! - `{crate_name}`: manifest name with `-` replaced by `_`
//! - `{version}`: manifest version
//! - `{profile}`: `debug` or `release`

use std::path::{Path, PathBuf};

use pf_core::{BuildJob, Manifest};
use serde::{Deserialize, Serialize};
use tokio::process::Command;

/// Program, arguments and expected output of one toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainConfig {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Appended to `args` for release builds
    #[serde(default)]
    pub release_args: Vec<String>,
    /// Path of the produced binary, relative to the workspace
    pub artifact: String,
}

impl ToolchainConfig {
    /// `cargo build` for the wasm32 target.
    pub fn cargo() -> Self {
        Self {
            program: "cargo".to_string(),
            args: vec![
                "build".to_string(),
                "--target".to_string(),
                "wasm32-unknown-unknown".to_string(),
            ],
            release_args: vec!["--release".to_string()],
            artifact: "target/wasm32-unknown-unknown/{profile}/{crate_name}.wasm".to_string(),
        }
    }

    /// `extism-js` packaging of `index.js`.
    pub fn extism_js() -> Self {
        Self {
            program: "extism-js".to_string(),
            args: vec!["index.js".to_string(), "-o".to_string(), "{name}.wasm".to_string()],
            release_args: Vec::new(),
            artifact: "{name}.wasm".to_string(),
        }
    }

    /// Arguments for `job`, placeholders expanded.
    pub fn expand_args(&self, job: &BuildJob) -> Vec<String> {
        let extra: &[String] = if job.profile.is_release() { &self.release_args } else { &[] };
        self.args.iter().chain(extra).map(|arg| expand(arg, job)).collect()
    }

    /// Where the produced binary of `job` is expected.
    pub fn artifact_path(&self, job: &BuildJob) -> PathBuf {
        job.workspace.join(expand(&self.artifact, job))
    }

    /// Command ready to run inside the job's workspace.
    pub fn command(&self, job: &BuildJob) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.expand_args(job)).current_dir(&job.workspace);
        cmd
    }

    /// Human-readable command line, for logs.
    pub fn display(&self, job: &BuildJob) -> String {
        std::iter::once(self.program.clone())
            .chain(self.expand_args(job))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn expand(template: &str, job: &BuildJob) -> String {
    let Manifest { name, version } = &job.manifest;
    template
        .replace("{crate_name}", &name.replace('-', "_"))
        .replace("{name}", name)
        .replace("{version}", version)
        .replace("{profile}", job.profile.target_dir())
}

/// Whether `path` stays inside `root` once placeholders are expanded.
pub(crate) fn is_within(root: &Path, path: &Path) -> bool {
    path.starts_with(root)
        && !path.components().any(|c| matches!(c, std::path::Component::ParentDir))
}

#[cfg(test)]
#[path = "toolchain_tests.rs"]
mod tests;
