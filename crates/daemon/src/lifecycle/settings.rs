// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Optional `config.toml` in the state directory.
//!
//! ```toml
//! build_timeout_ms = 600000
//! system_identity = "builds@example.com"
//!
//! [toolchain.rust]
//! program = "cargo"
//! args = ["build", "--target", "wasm32-unknown-unknown"]
//! release_args = ["--release"]
//! artifact = "target/wasm32-unknown-unknown/{profile}/{crate_name}.wasm"
//! ```
//!
//! Environment variables win over the file.

use std::path::Path;
use std::time::Duration;

use pf_engine::{EngineConfig, ToolchainConfig};
use serde::Deserialize;

use super::LifecycleError;

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub build_timeout_ms: Option<u64>,
    #[serde(default)]
    pub system_identity: Option<String>,
    #[serde(default)]
    pub toolchain: ToolchainSettings,
}

/// Per-language toolchain replacements.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolchainSettings {
    #[serde(default)]
    pub rust: Option<ToolchainConfig>,
    #[serde(default)]
    pub js: Option<ToolchainConfig>,
}

impl Settings {
    /// Read settings from `path`. A missing file means defaults.
    pub fn load(path: &Path) -> Result<Self, LifecycleError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        Self::parse(&text)
            .map_err(|message| LifecycleError::Settings { path: path.to_path_buf(), message })
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }

    /// Engine configuration with the file applied over the defaults, then
    /// the environment over the file.
    pub fn engine_config(self) -> EngineConfig {
        let mut config = EngineConfig::default();
        if let Some(ms) = self.build_timeout_ms {
            config.build_timeout = Duration::from_millis(ms);
        }
        if let Some(identity) = self.system_identity.filter(|s| !s.trim().is_empty()) {
            config.system_identity = identity;
        }
        if let Some(rust) = self.toolchain.rust {
            config.compiled = rust;
        }
        if let Some(js) = self.toolchain.js {
            config.interpreted = js;
        }

        if let Some(timeout) = crate::env::build_timeout() {
            config.build_timeout = timeout;
        }
        if let Some(identity) = crate::env::system_identity() {
            config.system_identity = identity;
        }
        config
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
