// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact (object) store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pf_core::ArtifactKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found: {0}")]
    NotFound(ArtifactKey),
    #[error("artifact store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("artifact store unavailable: {0}")]
    Unavailable(String),
}

/// Key/value blob storage for build products.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn get(&self, key: &ArtifactKey) -> Result<Vec<u8>, ArtifactError>;

    /// Store `bytes` under `key`, replacing any previous object.
    async fn put(&self, key: &ArtifactKey, bytes: Vec<u8>) -> Result<(), ArtifactError>;

    /// Delete `key`. Deleting an absent key succeeds.
    async fn delete(&self, key: &ArtifactKey) -> Result<(), ArtifactError>;
}

/// Store that keeps one file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local path of an object, for callers that want to hand out a file.
    pub fn path_of(&self, key: &ArtifactKey) -> PathBuf {
        self.root.join(key.as_str())
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn get(&self, key: &ArtifactKey) -> Result<Vec<u8>, ArtifactError> {
        match tokio::fs::read(self.path_of(key)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ArtifactError::NotFound(key.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &ArtifactKey, bytes: Vec<u8>) -> Result<(), ArtifactError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let dest = self.path_of(key);
        // Readers must never observe a partially written object
        let tmp = self.root.join(format!(".{}.{}.partial", key, nanoid::nanoid!(8)));
        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &dest).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        tracing::debug!(%key, size = bytes.len(), "stored artifact");
        Ok(())
    }

    async fn delete(&self, key: &ArtifactKey) -> Result<(), ArtifactError> {
        match tokio::fs::remove_file(self.path_of(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ArtifactError, ArtifactStore};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pf_core::ArtifactKey;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeArtifactState {
        objects: HashMap<ArtifactKey, Vec<u8>>,
        puts: Vec<ArtifactKey>,
        fail_puts: bool,
    }

    /// In-memory artifact store for tests
    #[derive(Clone, Default)]
    pub struct FakeArtifactStore {
        inner: Arc<Mutex<FakeArtifactState>>,
    }

    impl FakeArtifactStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn contains(&self, key: &ArtifactKey) -> bool {
            self.inner.lock().objects.contains_key(key)
        }

        pub fn object(&self, key: &ArtifactKey) -> Option<Vec<u8>> {
            self.inner.lock().objects.get(key).cloned()
        }

        /// Keys passed to `put`, in call order.
        pub fn puts(&self) -> Vec<ArtifactKey> {
            self.inner.lock().puts.clone()
        }

        /// Make `put` fail with `Unavailable`.
        pub fn fail_puts(&self, fail: bool) {
            self.inner.lock().fail_puts = fail;
        }
    }

    #[async_trait]
    impl ArtifactStore for FakeArtifactStore {
        async fn get(&self, key: &ArtifactKey) -> Result<Vec<u8>, ArtifactError> {
            self.object(key).ok_or_else(|| ArtifactError::NotFound(key.clone()))
        }

        async fn put(&self, key: &ArtifactKey, bytes: Vec<u8>) -> Result<(), ArtifactError> {
            let mut state = self.inner.lock();
            state.puts.push(key.clone());
            if state.fail_puts {
                return Err(ArtifactError::Unavailable("injected failure".to_string()));
            }
            state.objects.insert(key.clone(), bytes);
            Ok(())
        }

        async fn delete(&self, key: &ArtifactKey) -> Result<(), ArtifactError> {
            self.inner.lock().objects.remove(key);
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeArtifactStore;

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
