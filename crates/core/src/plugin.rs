// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugins and the languages they are written in.

use crate::artifact::ArtifactKey;
use crate::fingerprint::Fingerprint;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

crate::define_id! {
    /// Stable identifier of a user-owned plugin.
    ///
    /// Assigned once at registration and used as the admission key, the
    /// status channel id, and the prefix of per-plugin store keys.
    pub struct PluginId;
}

impl PluginId {
    /// Assign a fresh identifier for a newly registered plugin.
    pub fn generate() -> Self {
        Self::from_string(uuid::Uuid::new_v4().to_string())
    }
}

/// Source language of a plugin, which selects its toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// Compiled with the Rust toolchain
    #[serde(rename = "rust")]
    Compiled,
    /// Packaged with the JavaScript toolchain
    #[serde(rename = "js")]
    Interpreted,
}

/// How an uploaded archive is laid out in the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Entries land at their archived paths
    Preserve,
    /// A single directory shared by every entry is dropped
    StripRoot,
}

impl Language {
    pub fn extraction_mode(self) -> ExtractionMode {
        match self {
            Language::Compiled => ExtractionMode::Preserve,
            Language::Interpreted => ExtractionMode::StripRoot,
        }
    }

    /// Project description file read to name the artifact.
    pub fn manifest_file(self) -> &'static str {
        match self {
            Language::Compiled => "Cargo.toml",
            Language::Interpreted => "package.json",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Compiled => "rust",
            Language::Interpreted => "js",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown plugin language '{0}' (expected rust or js)")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rust" => Ok(Language::Compiled),
            "js" | "javascript" => Ok(Language::Interpreted),
            _ => Err(UnknownLanguage(s.to_string())),
        }
    }
}

/// Which flavour of build a job is; tags every status line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildProfile {
    #[default]
    Build,
    Release,
}

impl BuildProfile {
    pub fn from_release(release: bool) -> Self {
        if release {
            BuildProfile::Release
        } else {
            BuildProfile::Build
        }
    }

    pub fn is_release(self) -> bool {
        matches!(self, BuildProfile::Release)
    }

    /// Status line tag, e.g. `BUILD`.
    pub fn tag(self) -> &'static str {
        match self {
            BuildProfile::Build => "BUILD",
            BuildProfile::Release => "RELEASE",
        }
    }

    /// Cargo output directory name for this profile.
    pub fn target_dir(self) -> &'static str {
        match self {
            BuildProfile::Build => "debug",
            BuildProfile::Release => "release",
        }
    }
}

crate::simple_display! {
    BuildProfile {
        Build => "build",
        Release => "release",
    }
}

/// A plugin as recorded in the metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRecord {
    pub plugin_id: PluginId,
    /// Display name chosen by the owner
    pub filename: String,
    pub language: Language,
    /// Fingerprint of the last archive that built successfully
    #[serde(default, rename = "last_hash", skip_serializing_if = "Option::is_none")]
    pub last_fingerprint: Option<Fingerprint>,
    /// Same, for release builds
    #[serde(default, rename = "last_release_hash", skip_serializing_if = "Option::is_none")]
    pub last_release_fingerprint: Option<Fingerprint>,
    /// Store key of the last produced binary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_artifact: Option<ArtifactKey>,
    /// `{name}-{version}` from the manifest of the last successful build
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_artifact_name: Option<String>,
    #[serde(default)]
    pub updated_at_ms: u64,
}

impl PluginRecord {
    pub fn new(plugin_id: PluginId, filename: impl Into<String>, language: Language) -> Self {
        Self {
            plugin_id,
            filename: filename.into(),
            language,
            last_fingerprint: None,
            last_release_fingerprint: None,
            last_artifact: None,
            last_artifact_name: None,
            updated_at_ms: 0,
        }
    }

    /// Fingerprint of the last archive that built successfully with `profile`.
    pub fn fingerprint_for(&self, profile: BuildProfile) -> Option<&Fingerprint> {
        match profile {
            BuildProfile::Build => self.last_fingerprint.as_ref(),
            BuildProfile::Release => self.last_release_fingerprint.as_ref(),
        }
    }

    pub fn set_fingerprint(&mut self, profile: BuildProfile, fingerprint: Fingerprint) {
        match profile {
            BuildProfile::Build => self.last_fingerprint = Some(fingerprint),
            BuildProfile::Release => self.last_release_fingerprint = Some(fingerprint),
        }
    }

    /// Store keys of the binaries this record points at, one per profile
    /// that has built successfully.
    pub fn binaries(&self) -> Vec<ArtifactKey> {
        [BuildProfile::Build, BuildProfile::Release]
            .into_iter()
            .filter_map(|profile| {
                self.fingerprint_for(profile).map(|fp| ArtifactKey::binary(fp, profile))
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "plugin_tests.rs"]
mod tests;
