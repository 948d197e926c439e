//! Shared helpers for specs: isolated projects, CLI runners and polling.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use assert_cmd::Command;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Upper bound for waiting on asynchronous daemon work.
pub const SPEC_WAIT_MAX_MS: u64 = 20_000;

/// Upper bound for a single CLI invocation.
const CLI_TIMEOUT: Duration = Duration::from_secs(60);

/// Toolchain script that succeeds unless the sources mention `FAIL`.
pub const RUST_SCRIPT: &str = "echo compiling {name}; \
    if grep -q FAIL src/lib.rs; then echo broken build >&2; exit 1; fi; \
    mkdir -p out; printf wasm:{name} > out/{crate_name}.wasm";

/// Poll `check` every 50ms until it holds or `max_ms` elapses.
pub fn wait_for(max_ms: u64, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    loop {
        if check() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

/// `pf` with no project: state lands in a throwaway directory.
pub fn cli() -> CliBuilder {
    let state = TempDir::new().unwrap();
    let mut builder = CliBuilder::new(&state.path().join("state"));
    builder.keep = Some(state);
    builder
}

/// A temp directory holding the daemon state and the archives under test.
pub struct Project {
    dir: TempDir,
}

impl Project {
    /// A project whose rust toolchain is [`RUST_SCRIPT`].
    pub fn empty() -> Self {
        Self::with_script(RUST_SCRIPT)
    }

    /// A project whose builds wait for [`Project::open_gate`] before running `script`.
    pub fn gated() -> Self {
        let project = Self { dir: TempDir::new().unwrap() };
        let script =
            format!("while [ ! -e {} ]; do sleep 0.05; done; {}", project.gate().display(), RUST_SCRIPT);
        project.write_settings(&script);
        project
    }

    pub fn with_script(script: &str) -> Self {
        let project = Self { dir: TempDir::new().unwrap() };
        project.write_settings(script);
        project
    }

    fn write_settings(&self, script: &str) {
        let settings = format!(
            "build_timeout_ms = 20000\n\n\
             [toolchain.rust]\n\
             program = \"sh\"\n\
             args = [\"-c\", '{}']\n\
             artifact = \"out/{{crate_name}}.wasm\"\n",
            script
        );
        self.file("state/config.toml", &settings);
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_dir(&self) -> PathBuf {
        self.path().join("state")
    }

    /// Write `contents` at `rel`, creating parent directories.
    pub fn file(&self, rel: &str, contents: &str) {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    /// Zip a cargo project named `name` whose `src/lib.rs` is `src`.
    pub fn cargo_archive(&self, file: &str, name: &str, src: &str) -> PathBuf {
        let manifest = format!("[package]\nname = \"{}\"\nversion = \"0.1.0\"\n", name);
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (entry, content) in [("Cargo.toml", manifest.as_str()), ("src/lib.rs", src)] {
            zip.start_file(entry, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        let bytes = zip.finish().unwrap().into_inner();
        let path = self.path().join(file);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    pub fn gate(&self) -> PathBuf {
        self.path().join("gate")
    }

    pub fn open_gate(&self) {
        std::fs::write(self.gate(), "open").unwrap();
    }

    pub fn pf(&self) -> CliBuilder {
        let mut builder = CliBuilder::new(&self.state_dir());
        builder.cmd.current_dir(self.path());
        builder
    }

    /// Start the daemon and register a rust plugin, returning its id.
    pub fn start_with_plugin(&self, name: &str) -> String {
        self.pf().args(&["daemon", "start"]).passes();
        let out = self.pf().args(&["plugin", "add", name, "--output", "json"]).passes().stdout();
        let record: serde_json::Value = serde_json::from_str(&out).unwrap();
        record["plugin_id"].as_str().unwrap().to_string()
    }

    pub fn daemon_log(&self) -> String {
        std::fs::read_to_string(self.state_dir().join("daemon.log")).unwrap_or_default()
    }
}

impl Drop for Project {
    fn drop(&mut self) {
        let _ = self.pf().args(&["daemon", "stop"]).cmd.output();
    }
}

pub struct CliBuilder {
    cmd: Command,
    keep: Option<TempDir>,
}

impl CliBuilder {
    fn new(state_dir: &Path) -> Self {
        let mut cmd = Command::cargo_bin("pf").unwrap();
        cmd.env("PF_STATE_DIR", state_dir)
            .env("PF_DAEMON_BINARY", assert_cmd::cargo::cargo_bin("pfd"))
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .timeout(CLI_TIMEOUT);
        Self { cmd, keep: None }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn passes(mut self) -> RunAssert {
        let run = self.run();
        assert!(run.status.success(), "expected success, got {:?}\n{}", run.status, run.describe());
        run
    }

    pub fn fails(mut self) -> RunAssert {
        let run = self.run();
        assert!(!run.status.success(), "expected failure\n{}", run.describe());
        run
    }

    /// Run and expect exit status `code`.
    pub fn exits(mut self, code: i32) -> RunAssert {
        let run = self.run();
        assert_eq!(run.status.code(), Some(code), "unexpected exit status\n{}", run.describe());
        run
    }

    fn run(&mut self) -> RunAssert {
        let output = self.cmd.output().unwrap();
        RunAssert {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

pub struct RunAssert {
    status: std::process::ExitStatus,
    stdout: String,
    stderr: String,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        self.stdout.clone()
    }

    pub fn stderr(&self) -> String {
        self.stderr.clone()
    }

    pub fn stdout_has(&self, needle: &str) -> &Self {
        assert!(self.stdout.contains(needle), "stdout lacks {:?}\n{}", needle, self.describe());
        self
    }

    pub fn stdout_lacks(&self, needle: &str) -> &Self {
        assert!(!self.stdout.contains(needle), "stdout has {:?}\n{}", needle, self.describe());
        self
    }

    pub fn stderr_has(&self, needle: &str) -> &Self {
        assert!(self.stderr.contains(needle), "stderr lacks {:?}\n{}", needle, self.describe());
        self
    }

    fn describe(&self) -> String {
        format!("--- stdout ---\n{}\n--- stderr ---\n{}", self.stdout, self.stderr)
    }
}
