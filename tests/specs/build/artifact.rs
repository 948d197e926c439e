//! Artifact specs
//!
//! Verify built binaries, source archives and build logs can be fetched,
//! and plugins cleaned up.

use crate::prelude::*;

#[test]
fn artifact_is_written_to_destination() {
    let temp = Project::empty();
    let id = temp.start_with_plugin("hello-world");
    let archive = temp.cargo_archive("hello.zip", "hello-world", "pub fn hi() {}");
    temp.pf().args(&["build", &id, archive.to_str().unwrap(), "--wait"]).passes();

    let dest = temp.path().join("plugin.wasm");
    temp.pf()
        .args(&["artifact", &id, "-o", dest.to_str().unwrap()])
        .passes()
        .stdout_has("Wrote");
    assert_eq!(std::fs::read_to_string(dest).unwrap(), "wasm:hello-world");
}

#[test]
fn release_binary_is_fetched_separately() {
    let temp = Project::empty();
    let id = temp.start_with_plugin("hello");
    let archive = temp.cargo_archive("hello.zip", "hello", "pub fn hi() {}");
    let archive = archive.to_str().unwrap();
    temp.pf().args(&["build", &id, archive, "--wait"]).passes();
    temp.pf().args(&["artifact", &id, "--release"]).fails();

    temp.pf()
        .args(&["build", &id, archive, "--release", "--wait"])
        .passes()
        .stdout_lacks("No changes");
    temp.pf().args(&["build", &id, archive, "--release"]).passes().stdout_has("No changes");

    let debug = temp.pf().args(&["artifact", &id]).passes().stdout();
    let release = temp.pf().args(&["artifact", &id, "--release"]).passes().stdout();
    assert_ne!(debug.trim(), release.trim());
    assert!(release.trim().ends_with("-release.wasm"), "got {release}");
}

#[test]
fn source_archive_is_written_to_destination() {
    let temp = Project::empty();
    let id = temp.start_with_plugin("hello");
    temp.pf().args(&["source", &id]).fails();

    let archive = temp.cargo_archive("hello.zip", "hello", "pub fn hi() {}");
    temp.pf().args(&["build", &id, archive.to_str().unwrap(), "--wait"]).passes();

    let dest = temp.path().join("fetched.zip");
    temp.pf().args(&["source", &id, "-o", dest.to_str().unwrap()]).passes().stdout_has("Wrote");
    assert_eq!(std::fs::read(dest).unwrap(), std::fs::read(archive).unwrap());
}

#[test]
fn last_build_log_is_printed() {
    let temp = Project::empty();
    let id = temp.start_with_plugin("hello");
    temp.pf().args(&["logs", &id, "--last"]).fails();

    let archive = temp.cargo_archive("hello.zip", "hello", "FAIL");
    temp.pf().args(&["build", &id, archive.to_str().unwrap(), "--wait"]).exits(4);

    temp.pf()
        .args(&["logs", &id, "--last"])
        .passes()
        .stdout_has("compiling hello")
        .stdout_has("broken build");
}

#[test]
fn artifact_before_any_build_fails() {
    let temp = Project::empty();
    let id = temp.start_with_plugin("hello");
    temp.pf().args(&["artifact", &id]).fails();
}

#[test]
fn removed_plugin_disappears_from_list() {
    let temp = Project::empty();
    let id = temp.start_with_plugin("hello");
    let archive = temp.cargo_archive("hello.zip", "hello", "pub fn hi() {}");
    temp.pf().args(&["build", &id, archive.to_str().unwrap(), "--wait"]).passes();

    temp.pf().args(&["plugin", "rm", &id]).passes().stdout_has("removed");
    temp.pf().args(&["plugin", "list"]).passes().stdout_lacks(&id);
    temp.pf().args(&["artifact", &id]).fails();
}

#[test]
fn rename_changes_display_name() {
    let temp = Project::empty();
    let id = temp.start_with_plugin("hello");
    temp.pf().args(&["plugin", "rename", &id, "greeter"]).passes();
    temp.pf().args(&["plugin", "list"]).passes().stdout_has("greeter").stdout_lacks("hello");
}
