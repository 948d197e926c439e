//! Daemon lifecycle specs
//!
//! Verify daemon start/stop/status and what survives a restart.

use crate::prelude::*;

#[test]
fn daemon_status_when_not_running() {
    let temp = Project::empty();
    temp.pf().args(&["daemon", "status"]).passes().stdout_has("Daemon not running");
}

#[test]
fn daemon_start_reports_success() {
    let temp = Project::empty();
    temp.pf().args(&["daemon", "start"]).passes().stdout_has("Daemon started");
    temp.pf()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("Status: running")
        .stdout_has("Builds in flight: 0");
}

#[test]
fn daemon_start_twice_is_harmless() {
    let temp = Project::empty();
    temp.pf().args(&["daemon", "start"]).passes();
    temp.pf().args(&["daemon", "start"]).passes().stdout_has("Daemon already running");
}

#[test]
fn daemon_stop_removes_socket() {
    let temp = Project::empty();
    temp.pf().args(&["daemon", "start"]).passes();
    assert!(temp.state_dir().join("daemon.sock").exists());

    temp.pf().args(&["daemon", "stop"]).passes().stdout_has("Daemon stopped");
    assert!(!temp.state_dir().join("daemon.sock").exists());
    temp.pf().args(&["daemon", "stop"]).passes().stdout_has("Daemon not running");
}

#[test]
fn commands_without_daemon_explain_how_to_start_it() {
    let temp = Project::empty();
    temp.pf().args(&["plugin", "list"]).fails().stderr_has("pf daemon start");
}

#[test]
fn invalid_settings_fail_startup() {
    let temp = Project::empty();
    temp.file("state/config.toml", "build_timeout_ms = \"soon\"\n");
    temp.pf().args(&["daemon", "start"]).fails().stderr_has("config.toml");
    assert!(!temp.state_dir().join("daemon.sock").exists());
}

#[test]
fn daemon_logs_startup() {
    let temp = Project::empty();
    temp.pf().args(&["daemon", "start"]).passes();
    let logged = wait_for(SPEC_WAIT_MAX_MS, || !temp.daemon_log().is_empty());
    assert!(logged, "daemon.log should have startup lines");
}

#[test]
fn plugins_survive_restart() {
    let temp = Project::empty();
    let id = temp.start_with_plugin("hello");
    temp.pf().args(&["daemon", "stop"]).passes();

    temp.pf().args(&["daemon", "start"]).passes();
    temp.pf().args(&["plugin", "list"]).passes().stdout_has(&id).stdout_has("hello");
}

#[test]
fn fingerprint_survives_restart() {
    let temp = Project::empty();
    let id = temp.start_with_plugin("hello");
    let archive = temp.cargo_archive("hello.zip", "hello", "pub fn hi() {}");
    let archive = archive.to_str().unwrap();
    temp.pf().args(&["build", &id, archive, "--wait"]).passes();

    temp.pf().args(&["daemon", "stop"]).passes();
    temp.pf().args(&["daemon", "start"]).passes();

    temp.pf()
        .args(&["build", &id, archive])
        .passes()
        .stdout_has("No changes detected, skipping build");
}
