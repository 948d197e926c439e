// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project manifest reader.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pf_core::{Language, Manifest};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("{file} not found in project")]
    Missing { file: &'static str },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed {file}: {message}")]
    Malformed { file: &'static str, message: String },
    #[error("{file} has no {field}")]
    MissingField { file: &'static str, field: &'static str },
}

/// Reads the name and version a project declares for itself.
#[async_trait]
pub trait ManifestReader: Send + Sync {
    async fn read(&self, workspace: &Path, language: Language) -> Result<Manifest, ManifestError>;
}

/// Reads `Cargo.toml` for compiled plugins and `package.json` for
/// interpreted ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectManifestReader;

#[derive(Deserialize)]
struct CargoManifest {
    package: Option<NameVersion>,
}

#[derive(Deserialize)]
struct NameVersion {
    name: Option<String>,
    version: Option<String>,
}

impl ProjectManifestReader {
    pub fn new() -> Self {
        Self
    }

    /// Parse manifest text; split out from `read` so it can be tested
    /// without a filesystem.
    pub fn parse(language: Language, text: &str) -> Result<Manifest, ManifestError> {
        let file = language.manifest_file();
        let fields = match language {
            Language::Compiled => {
                let cargo: CargoManifest = toml::from_str(text)
                    .map_err(|e| ManifestError::Malformed { file, message: e.to_string() })?;
                cargo
                    .package
                    .ok_or(ManifestError::MissingField { file, field: "[package]" })?
            }
            Language::Interpreted => serde_json::from_str::<NameVersion>(text)
                .map_err(|e| ManifestError::Malformed { file, message: e.to_string() })?,
        };
        let name = non_empty(fields.name).ok_or(ManifestError::MissingField { file, field: "name" })?;
        let version =
            non_empty(fields.version).ok_or(ManifestError::MissingField { file, field: "version" })?;
        Ok(Manifest::new(name, version))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[async_trait]
impl ManifestReader for ProjectManifestReader {
    async fn read(&self, workspace: &Path, language: Language) -> Result<Manifest, ManifestError> {
        let file = language.manifest_file();
        let path = workspace.join(file);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ManifestError::Missing { file });
            }
            Err(source) => return Err(ManifestError::Io { path, source }),
        };
        Self::parse(language, &text)
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
