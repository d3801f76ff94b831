//! Filesystem-backed asset store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{validate_key, AssetStore, StorageError};
use crate::config::StorageConfig;

/// Stores assets under a root directory that the server also serves at
/// `public_base_url`.
pub struct LocalAssetStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalAssetStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.root, &config.public_base_url)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    /// Write through a sibling temp file and rename, so readers never see a
    /// partially written asset.
    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StorageError::WriteFailed {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
        if let Err(source) = fs::write(&tmp, bytes).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(StorageError::WriteFailed {
                path: tmp,
                source,
            });
        }
        fs::rename(&tmp, path)
            .await
            .map_err(|source| StorageError::WriteFailed {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let path = self.resolve(key)?;
        self.write_atomic(&path, bytes).await?;
        tracing::debug!(key = %key, bytes = bytes.len(), "Stored asset");
        Ok(key.to_string())
    }

    async fn put_file(&self, key: &str, source: &Path) -> Result<String, StorageError> {
        let bytes = fs::read(source).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(source.display().to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        self.put(key, &bytes).await
    }

    async fn fetch_to(&self, locator: &str, dest: &Path) -> Result<u64, StorageError> {
        let path = self.resolve(locator)?;
        fs::copy(&path, dest).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(locator.to_string())
            } else {
                StorageError::Io(e)
            }
        })
    }

    fn public_url(&self, locator: &str) -> String {
        format!("{}/{}", self.public_base_url, locator)
    }
}
