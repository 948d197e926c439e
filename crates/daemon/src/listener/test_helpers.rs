// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for listener tests: a started daemon over a temp state
//! directory whose toolchains are `sh` scripts.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use pf_core::{BuildReport, PluginId};
use pf_engine::ToolchainConfig;
use tempfile::TempDir;
use tokio::sync::Notify;
use zip::write::SimpleFileOptions;

use super::ListenCtx;
use crate::lifecycle::{startup, Config, DaemonState};

pub(super) const OK_SCRIPT: &str =
    "echo \"compiling {name}\"; mkdir -p out; printf 'wasm:{name}' > out/{crate_name}.wasm";

pub(super) struct TestDaemon {
    pub ctx: Arc<ListenCtx>,
    pub shutdown: Arc<Notify>,
    pub config: Config,
    /// Held for the lock file
    #[allow(dead_code)]
    pub daemon: DaemonState,
    pub dir: TempDir,
}

pub(super) async fn setup() -> TestDaemon {
    setup_in(tempfile::tempdir().unwrap(), OK_SCRIPT).await
}

/// Like `setup`, but builds block until `open_gate` is called.
pub(super) async fn setup_gated() -> TestDaemon {
    let dir = tempfile::tempdir().unwrap();
    let script = format!(
        "while [ ! -e '{}' ]; do sleep 0.02; done; {}",
        gate_path(dir.path()).display(),
        OK_SCRIPT
    );
    setup_in(dir, &script).await
}

async fn setup_in(dir: TempDir, script: &str) -> TestDaemon {
    let config = Config::at(dir.path().join("state"));
    std::fs::create_dir_all(&config.state_dir).unwrap();
    let toolchain = ToolchainConfig {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        release_args: Vec::new(),
        artifact: "out/{crate_name}.wasm".to_string(),
    };
    let settings = format!(
        "build_timeout_ms = 20000\n\n[toolchain.rust]\n{}",
        toml::to_string(&toolchain).unwrap()
    );
    std::fs::write(&config.settings_path, settings).unwrap();

    let result = startup(&config).await.unwrap();
    let shutdown = Arc::new(Notify::new());
    let ctx = Arc::new(ListenCtx::new(&result.daemon, Arc::clone(&shutdown)));
    TestDaemon { ctx, shutdown, config, daemon: result.daemon, dir }
}

fn gate_path(dir: &Path) -> PathBuf {
    dir.join("gate")
}

impl TestDaemon {
    pub(super) fn open_gate(&self) {
        std::fs::write(gate_path(self.dir.path()), "open").unwrap();
    }

    /// Write `bytes` as an archive file and return its path.
    pub(super) fn archive(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    /// Wait until the queue has a finished report for `plugin_id`.
    pub(super) async fn wait_for_report(&self, plugin_id: &PluginId) -> BuildReport {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(20);
        loop {
            if let Some(report) = self.ctx.queue.recent(plugin_id) {
                return report;
            }
            assert!(tokio::time::Instant::now() < deadline, "build of {plugin_id} never finished");
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

/// A compiled project; `src` varies the archive bytes.
pub(super) fn cargo_project(name: &str, src: &str) -> Vec<u8> {
    let manifest = format!("[package]\nname = \"{}\"\nversion = \"0.1.0\"\n", name);
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (file, content) in [("Cargo.toml", manifest.as_str()), ("src/lib.rs", src)] {
        zip.start_file(file, SimpleFileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}
