// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration.

use std::time::Duration;

use pf_core::Language;

use crate::toolchain::ToolchainConfig;

/// Wall-clock limit for a single toolchain run.
pub const DEFAULT_BUILD_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Identity recorded for builds submitted anonymously.
pub const DEFAULT_SYSTEM_IDENTITY: &str = "admin@otoroshi.io";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub build_timeout: Duration,
    pub compiled: ToolchainConfig,
    pub interpreted: ToolchainConfig,
    pub system_identity: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            build_timeout: DEFAULT_BUILD_TIMEOUT,
            compiled: ToolchainConfig::cargo(),
            interpreted: ToolchainConfig::extism_js(),
            system_identity: DEFAULT_SYSTEM_IDENTITY.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn toolchain(&self, language: Language) -> &ToolchainConfig {
        match language {
            Language::Compiled => &self.compiled,
            Language::Interpreted => &self.interpreted,
        }
    }

    /// The submitter to record, falling back to the system identity.
    pub fn submitter(&self, submitter: Option<String>) -> String {
        submitter.filter(|s| !s.trim().is_empty()).unwrap_or_else(|| self.system_identity.clone())
    }
}
