// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use std::fmt;

/// Another build of the plugin is still running
pub const EXIT_BUSY: i32 = 3;

/// A waited-for build finished in a failed state
pub const EXIT_BUILD_FAILED: i32 = 4;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn busy(plugin_id: &str) -> Self {
        Self::new(EXIT_BUSY, format!("A build of plugin {} is already running", plugin_id))
    }

    pub fn build_failed(message: impl Into<String>) -> Self {
        Self::new(EXIT_BUILD_FAILED, message)
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}
