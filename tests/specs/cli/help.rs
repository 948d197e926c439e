//! CLI help output specs
//!
//! Verify help text displays for all commands.

use crate::prelude::*;

#[test]
fn pf_no_args_shows_usage_and_exits_zero() {
    cli().passes().stdout_has("Usage:");
}

#[test]
fn pf_help_lists_commands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("plugin")
        .stdout_has("build")
        .stdout_has("artifact")
        .stdout_has("daemon");
}

#[test]
fn pf_plugin_help_shows_subcommands() {
    cli()
        .args(&["plugin", "--help"])
        .passes()
        .stdout_has("add")
        .stdout_has("list")
        .stdout_has("rm")
        .stdout_has("rename");
}

#[test]
fn pf_build_help_shows_flags() {
    cli().args(&["build", "--help"]).passes().stdout_has("--release").stdout_has("--wait");
}

#[test]
fn pf_daemon_help_shows_subcommands() {
    cli()
        .args(&["daemon", "--help"])
        .passes()
        .stdout_has("start")
        .stdout_has("stop")
        .stdout_has("status");
}

#[test]
fn pf_version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.1");
}

#[test]
fn pf_rejects_unknown_language() {
    cli().args(&["plugin", "add", "x", "--language", "go"]).fails().stderr_has("go");
}
