//! Asset storage for synthesized audio and rendered videos.
//!
//! Assets are addressed by a relative key (`audio/{id}.mp3`,
//! `videos/{id}.mp4`). The key doubles as the locator stored on records;
//! [`AssetStore::public_url`] turns it into a link reviewers can open.

mod local;

pub use local::LocalAssetStore;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the asset store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Key is empty, absolute, or escapes the store root.
    #[error("Invalid asset key: {0}")]
    InvalidKey(String),

    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Failed to write asset {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where pipeline assets live between stages.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any previous asset. Returns the locator.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError>;

    /// Store the contents of a local file under `key`. Returns the locator.
    async fn put_file(&self, key: &str, source: &Path) -> Result<String, StorageError>;

    /// Copy the asset at `locator` to `dest`, returning the byte count.
    async fn fetch_to(&self, locator: &str, dest: &Path) -> Result<u64, StorageError>;

    /// Publicly reachable URL for a locator.
    fn public_url(&self, locator: &str) -> String;
}

/// Reject keys that could resolve outside the store root.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let path = Path::new(key);
    let escapes = path
        .components()
        .any(|c| !matches!(c, std::path::Component::Normal(_)));
    if key.is_empty() || escapes {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
