//! Build submission specs
//!
//! Verify admission, change detection and failure reporting.

use crate::prelude::*;

#[test]
fn build_wait_streams_output_and_succeeds() {
    let temp = Project::empty();
    let id = temp.start_with_plugin("hello");
    let archive = temp.cargo_archive("hello.zip", "hello", "pub fn hi() {}");

    temp.pf()
        .args(&["build", &id, archive.to_str().unwrap(), "--wait"])
        .passes()
        .stdout_has("[BUILD] Different hash, scheduling build")
        .stdout_has("[BUILD] compiling hello")
        .stdout_has("succeeded");
}

#[test]
fn unchanged_archive_is_skipped() {
    let temp = Project::empty();
    let id = temp.start_with_plugin("hello");
    let archive = temp.cargo_archive("hello.zip", "hello", "pub fn hi() {}");
    let archive = archive.to_str().unwrap();

    temp.pf().args(&["build", &id, archive, "--wait"]).passes();
    temp.pf()
        .args(&["build", &id, archive])
        .passes()
        .stdout_has("No changes detected, skipping build");
}

#[test]
fn changed_archive_builds_again() {
    let temp = Project::empty();
    let id = temp.start_with_plugin("hello");
    let first = temp.cargo_archive("v1.zip", "hello", "pub fn hi() {}");
    let second = temp.cargo_archive("v2.zip", "hello", "pub fn hi() { let _ = 2; }");

    temp.pf().args(&["build", &id, first.to_str().unwrap(), "--wait"]).passes();
    temp.pf()
        .args(&["build", &id, second.to_str().unwrap(), "--wait"])
        .passes()
        .stdout_lacks("No changes detected")
        .stdout_has("succeeded");
}

#[test]
fn build_without_wait_is_accepted() {
    let temp = Project::empty();
    let id = temp.start_with_plugin("hello");
    let archive = temp.cargo_archive("hello.zip", "hello", "pub fn hi() {}");

    temp.pf()
        .args(&["build", &id, archive.to_str().unwrap()])
        .passes()
        .stdout_has("accepted for plugin");

    let done = wait_for(SPEC_WAIT_MAX_MS, || {
        temp.pf().args(&["status", &id]).passes().stdout().contains("succeeded")
    });
    assert!(done, "build should finish\n{}", temp.daemon_log());
}

#[test]
fn second_build_while_running_is_busy() {
    let temp = Project::gated();
    let id = temp.start_with_plugin("hello");
    let first = temp.cargo_archive("v1.zip", "hello", "pub fn hi() {}");
    let second = temp.cargo_archive("v2.zip", "hello", "pub fn other() {}");

    temp.pf().args(&["build", &id, first.to_str().unwrap()]).passes();
    temp.pf()
        .args(&["build", &id, second.to_str().unwrap()])
        .exits(3)
        .stderr_has("already running");

    temp.pf().args(&["daemon", "status"]).passes().stdout_has("Builds in flight: 1");
    temp.open_gate();
    let done = wait_for(SPEC_WAIT_MAX_MS, || {
        temp.pf().args(&["status", &id]).passes().stdout().contains("succeeded")
    });
    assert!(done, "gated build should finish once opened");
}

#[test]
fn other_plugins_build_concurrently() {
    let temp = Project::gated();
    let a = temp.start_with_plugin("alpha");
    let b = temp.start_with_plugin("beta");
    let alpha = temp.cargo_archive("alpha.zip", "alpha", "pub fn a() {}");
    let beta = temp.cargo_archive("beta.zip", "beta", "pub fn b() {}");

    temp.pf().args(&["build", &a, alpha.to_str().unwrap()]).passes();
    temp.pf().args(&["build", &b, beta.to_str().unwrap()]).passes().stdout_has("accepted");
    temp.pf().args(&["daemon", "status"]).passes().stdout_has("Builds in flight: 2");
    temp.open_gate();
}

#[test]
fn failed_build_exits_with_build_failed() {
    let temp = Project::empty();
    let id = temp.start_with_plugin("hello");
    let archive = temp.cargo_archive("hello.zip", "hello", "// FAIL");

    temp.pf()
        .args(&["build", &id, archive.to_str().unwrap(), "--wait"])
        .exits(4)
        .stderr_has("failed");
    temp.pf().args(&["status", &id]).passes().stdout_has("failed").stdout_has("Error:");
}

#[test]
fn failed_build_is_retried_with_same_archive() {
    let temp = Project::empty();
    let id = temp.start_with_plugin("hello");
    let archive = temp.cargo_archive("hello.zip", "hello", "// FAIL");
    let archive = archive.to_str().unwrap();

    temp.pf().args(&["build", &id, archive, "--wait"]).exits(4);
    temp.pf().args(&["build", &id, archive]).passes().stdout_lacks("No changes detected");
}

#[test]
fn unknown_plugin_is_rejected() {
    let temp = Project::empty();
    temp.pf().args(&["daemon", "start"]).passes();
    let archive = temp.cargo_archive("hello.zip", "hello", "pub fn hi() {}");

    temp.pf().args(&["build", "nope", archive.to_str().unwrap()]).fails();
}

#[test]
fn json_output_reports_admission() {
    let temp = Project::empty();
    let id = temp.start_with_plugin("hello");
    let archive = temp.cargo_archive("hello.zip", "hello", "pub fn hi() {}");

    let out = temp
        .pf()
        .args(&["build", &id, archive.to_str().unwrap(), "--output", "json"])
        .passes()
        .stdout();
    let summary: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(summary["result"], "accepted");
    assert!(summary["job_id"].as_str().unwrap().starts_with("bld-"));
}
