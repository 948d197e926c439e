// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin metadata store.
//!
//! Holds one [`PluginRecord`] per registered plugin, including the
//! fingerprint of its last successful build. That fingerprint survives
//! restarts and is what makes resubmitting an unchanged archive a no-op.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use pf_core::{
    ArtifactKey, BuildProfile, Clock, Fingerprint, Language, PluginId, PluginRecord, SystemClock,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("plugin not found: {0}")]
    NotFound(PluginId),
    #[error("metadata io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("metadata document is corrupt: {0}")]
    Json(#[from] serde_json::Error),
    #[error("metadata store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Look up a registered plugin.
    async fn plugin(&self, id: &PluginId) -> Result<PluginRecord, MetadataError>;

    /// Record the fingerprint of a successful build with `profile`.
    async fn set_last_fingerprint(
        &self,
        id: &PluginId,
        profile: BuildProfile,
        fingerprint: &Fingerprint,
    ) -> Result<(), MetadataError>;

    /// Record where the last successful build's binary lives.
    async fn record_artifact(
        &self,
        id: &PluginId,
        key: &ArtifactKey,
        artifact_name: &str,
    ) -> Result<(), MetadataError>;

    /// Register a new plugin under a freshly generated id.
    async fn register(
        &self,
        filename: &str,
        language: Language,
    ) -> Result<PluginRecord, MetadataError>;

    async fn list(&self) -> Result<Vec<PluginRecord>, MetadataError>;

    async fn rename(&self, id: &PluginId, filename: &str) -> Result<PluginRecord, MetadataError>;

    /// Forget a plugin, returning its last record.
    async fn remove(&self, id: &PluginId) -> Result<PluginRecord, MetadataError>;
}

/// In-memory plugin table shared by the store implementations.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct PluginTable {
    #[serde(default)]
    plugins: Vec<PluginRecord>,
}

impl PluginTable {
    fn get(&self, id: &PluginId) -> Result<&PluginRecord, MetadataError> {
        self.plugins
            .iter()
            .find(|p| &p.plugin_id == id)
            .ok_or_else(|| MetadataError::NotFound(id.clone()))
    }

    fn get_mut(&mut self, id: &PluginId) -> Result<&mut PluginRecord, MetadataError> {
        self.plugins
            .iter_mut()
            .find(|p| &p.plugin_id == id)
            .ok_or_else(|| MetadataError::NotFound(id.clone()))
    }

    fn insert(&mut self, record: PluginRecord) {
        self.plugins.push(record);
    }

    fn remove(&mut self, id: &PluginId) -> Result<PluginRecord, MetadataError> {
        let idx = self
            .plugins
            .iter()
            .position(|p| &p.plugin_id == id)
            .ok_or_else(|| MetadataError::NotFound(id.clone()))?;
        Ok(self.plugins.remove(idx))
    }
}

/// Metadata store backed by a single JSON document on disk.
///
/// Every mutation rewrites the document via temp file + rename while the
/// table lock is held, so concurrent writers never interleave.
pub struct JsonMetadataStore<C: Clock = SystemClock> {
    path: PathBuf,
    table: Mutex<PluginTable>,
    clock: C,
}

impl JsonMetadataStore<SystemClock> {
    /// Open the document at `path`, starting empty if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, MetadataError> {
        Self::open_with_clock(path, SystemClock)
    }
}

impl<C: Clock> JsonMetadataStore<C> {
    pub fn open_with_clock(path: impl Into<PathBuf>, clock: C) -> Result<Self, MetadataError> {
        let path = path.into();
        let table = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PluginTable::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, table: Mutex::new(table), clock })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `f` to the table and persist the result. The in-memory table
    /// is only replaced once the document is safely on disk.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut PluginTable) -> Result<T, MetadataError>,
    ) -> Result<T, MetadataError> {
        let mut table = self.table.lock();
        let mut next = table.clone();
        let value = f(&mut next)?;
        write_atomic(&self.path, &serde_json::to_vec_pretty(&next)?)?;
        *table = next;
        Ok(value)
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}

#[async_trait]
impl<C: Clock> MetadataStore for JsonMetadataStore<C> {
    async fn plugin(&self, id: &PluginId) -> Result<PluginRecord, MetadataError> {
        self.table.lock().get(id).cloned()
    }

    async fn set_last_fingerprint(
        &self,
        id: &PluginId,
        profile: BuildProfile,
        fingerprint: &Fingerprint,
    ) -> Result<(), MetadataError> {
        let now = self.clock.epoch_ms();
        self.mutate(|table| {
            let record = table.get_mut(id)?;
            record.set_fingerprint(profile, fingerprint.clone());
            record.updated_at_ms = now;
            Ok(())
        })
    }

    async fn record_artifact(
        &self,
        id: &PluginId,
        key: &ArtifactKey,
        artifact_name: &str,
    ) -> Result<(), MetadataError> {
        let now = self.clock.epoch_ms();
        self.mutate(|table| {
            let record = table.get_mut(id)?;
            record.last_artifact = Some(key.clone());
            record.last_artifact_name = Some(artifact_name.to_string());
            record.updated_at_ms = now;
            Ok(())
        })
    }

    async fn register(
        &self,
        filename: &str,
        language: Language,
    ) -> Result<PluginRecord, MetadataError> {
        let mut record = PluginRecord::new(PluginId::generate(), filename, language);
        record.updated_at_ms = self.clock.epoch_ms();
        self.mutate(|table| {
            table.insert(record.clone());
            Ok(())
        })?;
        tracing::info!(plugin_id = %record.plugin_id, %language, "registered plugin");
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<PluginRecord>, MetadataError> {
        Ok(self.table.lock().plugins.clone())
    }

    async fn rename(&self, id: &PluginId, filename: &str) -> Result<PluginRecord, MetadataError> {
        let now = self.clock.epoch_ms();
        self.mutate(|table| {
            let record = table.get_mut(id)?;
            record.filename = filename.to_string();
            record.updated_at_ms = now;
            Ok(record.clone())
        })
    }

    async fn remove(&self, id: &PluginId) -> Result<PluginRecord, MetadataError> {
        self.mutate(|table| table.remove(id))
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{MetadataError, MetadataStore, PluginTable};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pf_core::{ArtifactKey, BuildProfile, Fingerprint, Language, PluginId, PluginRecord};
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeMetadataState {
        table: PluginTable,
        fingerprint_writes: Vec<(PluginId, Fingerprint)>,
        fail_writes: bool,
    }

    /// In-memory metadata store for tests
    #[derive(Clone, Default)]
    pub struct FakeMetadataStore {
        inner: Arc<Mutex<FakeMetadataState>>,
    }

    impl FakeMetadataStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed a plugin with a known id.
        pub fn add_plugin(
            &self,
            id: impl Into<PluginId>,
            language: Language,
            last_fingerprint: Option<Fingerprint>,
        ) -> PluginRecord {
            let id = id.into();
            let mut record = PluginRecord::new(id.clone(), id.to_string(), language);
            record.last_fingerprint = last_fingerprint;
            self.inner.lock().table.insert(record.clone());
            record
        }

        /// Every `set_last_fingerprint` call, in order.
        pub fn fingerprint_writes(&self) -> Vec<(PluginId, Fingerprint)> {
            self.inner.lock().fingerprint_writes.clone()
        }

        /// Make every mutating call fail with `Unavailable`.
        pub fn fail_writes(&self, fail: bool) {
            self.inner.lock().fail_writes = fail;
        }

        fn check_writable(state: &FakeMetadataState) -> Result<(), MetadataError> {
            if state.fail_writes {
                return Err(MetadataError::Unavailable("injected failure".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl MetadataStore for FakeMetadataStore {
        async fn plugin(&self, id: &PluginId) -> Result<PluginRecord, MetadataError> {
            self.inner.lock().table.get(id).cloned()
        }

        async fn set_last_fingerprint(
            &self,
            id: &PluginId,
            profile: BuildProfile,
            fingerprint: &Fingerprint,
        ) -> Result<(), MetadataError> {
            let mut state = self.inner.lock();
            Self::check_writable(&state)?;
            state.table.get_mut(id)?.set_fingerprint(profile, fingerprint.clone());
            state.fingerprint_writes.push((id.clone(), fingerprint.clone()));
            Ok(())
        }

        async fn record_artifact(
            &self,
            id: &PluginId,
            key: &ArtifactKey,
            artifact_name: &str,
        ) -> Result<(), MetadataError> {
            let mut state = self.inner.lock();
            Self::check_writable(&state)?;
            let record = state.table.get_mut(id)?;
            record.last_artifact = Some(key.clone());
            record.last_artifact_name = Some(artifact_name.to_string());
            Ok(())
        }

        async fn register(
            &self,
            filename: &str,
            language: Language,
        ) -> Result<PluginRecord, MetadataError> {
            let mut state = self.inner.lock();
            Self::check_writable(&state)?;
            let record = PluginRecord::new(PluginId::generate(), filename, language);
            state.table.insert(record.clone());
            Ok(record)
        }

        async fn list(&self) -> Result<Vec<PluginRecord>, MetadataError> {
            Ok(self.inner.lock().table.plugins.clone())
        }

        async fn rename(
            &self,
            id: &PluginId,
            filename: &str,
        ) -> Result<PluginRecord, MetadataError> {
            let mut state = self.inner.lock();
            Self::check_writable(&state)?;
            let record = state.table.get_mut(id)?;
            record.filename = filename.to_string();
            Ok(record.clone())
        }

        async fn remove(&self, id: &PluginId) -> Result<PluginRecord, MetadataError> {
            let mut state = self.inner.lock();
            Self::check_writable(&state)?;
            state.table.remove(id)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeMetadataStore;

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
