// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Resolve state directory: PF_STATE_DIR > XDG_STATE_HOME/pf > ~/.local/state/pf
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("PF_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("pf"));
    }
    let home = dirs::home_dir().ok_or(LifecycleError::NoStateDir)?;
    Ok(home.join(".local/state/pf"))
}

/// Default IPC timeout
pub fn ipc_timeout() -> Duration {
    duration_ms("PF_IPC_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

/// Build timeout override; takes precedence over `config.toml`.
pub fn build_timeout() -> Option<Duration> {
    duration_ms("PF_BUILD_TIMEOUT_MS")
}

/// Identity recorded for anonymous submissions; takes precedence over `config.toml`.
pub fn system_identity() -> Option<String> {
    std::env::var("PF_SYSTEM_IDENTITY").ok().filter(|s| !s.trim().is_empty())
}

fn duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
