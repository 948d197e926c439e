// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object-store keys for build products.
//!
//! Binaries are content addressed by the fingerprint of the source archive
//! they were built from plus the build profile, so the build path and the
//! delete path derive the same key from the plugin record. Per-plugin
//! objects (source archive, last build log) are keyed by plugin id.

use crate::fingerprint::Fingerprint;
use crate::plugin::{BuildProfile, PluginId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid artifact key '{0}'")]
pub struct InvalidKey(pub String);

/// A flat object-store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactKey(String);

impl ArtifactKey {
    /// Key of the binary built with `profile` from an archive with this
    /// fingerprint. Debug and release builds of one archive never share a key.
    pub fn binary(fingerprint: &Fingerprint, profile: BuildProfile) -> Self {
        Self(format!("{}-{}.wasm", fingerprint, profile))
    }

    /// Key of the most recent build log of a plugin.
    pub fn build_log(plugin_id: &PluginId) -> Self {
        Self(format!("{}-logs.txt", plugin_id))
    }

    /// Key of the uploaded source archive of a plugin.
    pub fn source(plugin_id: &PluginId) -> Self {
        Self(format!("{}.zip", plugin_id))
    }

    /// Validate an arbitrary key. Keys map to single files in the local
    /// store, so separators and parent references are rejected.
    pub fn parse(key: impl Into<String>) -> Result<Self, InvalidKey> {
        let key = key.into();
        let bad = key.is_empty()
            || key == "."
            || key.contains("..")
            || key.contains('/')
            || key.contains('\\')
            || key.chars().any(|c| c.is_control());
        if bad {
            return Err(InvalidKey(key));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ArtifactKey {
    type Error = InvalidKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ArtifactKey> for String {
    fn from(key: ArtifactKey) -> Self {
        key.0
    }
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
