// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    single_line    = { "pfd: daemon already running\n", "daemon already running" },
    trailing_blank = {
        "pfd: invalid settings in /s/config.toml: TOML parse error at line 1\n  |\n1 | [[\n  |  ^\n\n",
        "invalid settings in /s/config.toml: TOML parse error at line 1"
    },
    noise_first    = { "\nwarning: something\npfd: cannot bind socket\n", "cannot bind socket" },
    unprefixed     = { "\n  thread 'main' panicked\n", "thread 'main' panicked" },
    empty          = { "", "exited before becoming ready" },
    blank_only     = { "\n \n", "exited before becoming ready" },
)]
fn failure_reason_is_the_daemons_message(stderr: &str, expected: &str) {
    assert_eq!(startup_failure_reason(stderr), expected);
}
