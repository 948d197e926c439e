// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for the engine crate.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use pf_adapters::{
    FakeArtifactStore, FakeMetadataStore, FakeStatusChannel, LocalWorkspaces,
    ProjectManifestReader,
};
use pf_core::{BuildProfile, FakeClock, Fingerprint, Language, PluginId};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use crate::{BuildDeps, BuildQueue, EngineConfig, Submission, ToolchainConfig};

/// Toolchain that writes `out/{crate_name}.wasm` and prints a line.
pub(crate) const OK_SCRIPT: &str =
    "echo \"compiling {name} {version}\"; mkdir -p out; printf 'wasm:{name}' > out/{crate_name}.wasm";

pub(crate) const FAIL_SCRIPT: &str =
    "echo 'error[E0425]: cannot find value `x`' 1>&2; exit 101";

pub(crate) fn sh_toolchain(script: &str) -> ToolchainConfig {
    ToolchainConfig {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        release_args: Vec::new(),
        artifact: "out/{crate_name}.wasm".to_string(),
    }
}

pub(crate) fn config_with(script: &str) -> EngineConfig {
    EngineConfig {
        build_timeout: Duration::from_secs(20),
        compiled: sh_toolchain(script),
        interpreted: sh_toolchain(script),
        ..EngineConfig::default()
    }
}

/// Queue over fake stores, real workspaces and the real manifest reader.
pub(crate) struct TestContext {
    pub queue: BuildQueue<FakeClock>,
    pub metadata: FakeMetadataStore,
    pub artifacts: FakeArtifactStore,
    pub status: FakeStatusChannel,
    pub workspaces: Arc<LocalWorkspaces>,
    pub clock: FakeClock,
    /// Held for cleanup
    pub dir: TempDir,
}

pub(crate) fn setup(config: EngineConfig) -> TestContext {
    setup_in(tempfile::tempdir().unwrap(), config)
}

/// Like `setup`, but the toolchain blocks until `open_gate` is called.
pub(crate) fn setup_gated(script: &str) -> TestContext {
    let dir = tempfile::tempdir().unwrap();
    let gated = format!(
        "while [ ! -e '{}' ]; do sleep 0.02; done; {}",
        gate_path(dir.path()).display(),
        script
    );
    setup_in(dir, config_with(&gated))
}

fn gate_path(dir: &Path) -> PathBuf {
    dir.join("gate")
}

fn setup_in(dir: TempDir, config: EngineConfig) -> TestContext {
    let metadata = FakeMetadataStore::new();
    let artifacts = FakeArtifactStore::new();
    let status = FakeStatusChannel::new();
    let workspaces = Arc::new(LocalWorkspaces::new(dir.path().join("workspaces")));
    let clock = FakeClock::new();
    let deps = BuildDeps {
        metadata: Arc::new(metadata.clone()),
        artifacts: Arc::new(artifacts.clone()),
        workspaces: workspaces.clone(),
        manifests: Arc::new(ProjectManifestReader::new()),
        status: Arc::new(status.clone()),
    };
    let queue = BuildQueue::with_clock(deps, config, clock.clone());
    TestContext { queue, metadata, artifacts, status, workspaces, clock, dir }
}

impl TestContext {
    /// Release builds started by a `setup_gated` context.
    pub(crate) fn open_gate(&self) {
        std::fs::write(gate_path(self.dir.path()), "open").unwrap();
    }

    /// Number of workspace directories currently on disk for `profile`.
    pub(crate) fn workspace_count(&self, profile: BuildProfile) -> usize {
        match std::fs::read_dir(self.workspaces.root().join(profile.to_string())) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    pub(crate) fn add_plugin(&self, id: &str, language: Language) -> PluginId {
        self.metadata.add_plugin(id, language, None).plugin_id
    }

    pub(crate) fn add_built_plugin(&self, id: &str, archive: &[u8]) -> PluginId {
        self.metadata.add_plugin(id, Language::Compiled, Some(Fingerprint::of(archive))).plugin_id
    }
}

pub(crate) fn submission(plugin_id: &PluginId, archive: Vec<u8>) -> Submission {
    Submission {
        plugin_id: plugin_id.clone(),
        language: Language::Compiled,
        archive,
        submitter: None,
        profile: BuildProfile::Build,
    }
}

pub(crate) fn zip_of(files: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in files {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// A compiled project; `src` varies the archive bytes.
pub(crate) fn cargo_project(name: &str, src: &str) -> Vec<u8> {
    let manifest = format!("[package]\nname = \"{}\"\nversion = \"0.1.0\"\n", name);
    zip_of(&[("Cargo.toml", manifest.as_str()), ("src/lib.rs", src)])
}

/// An interpreted project wrapped in a top-level directory.
pub(crate) fn js_project(name: &str) -> Vec<u8> {
    let manifest = format!("{{\"name\": \"{}\", \"version\": \"1.0.0\"}}", name);
    zip_of(&[
        ("plugin/package.json", manifest.as_str()),
        ("plugin/index.js", "export function run() {}"),
    ])
}
