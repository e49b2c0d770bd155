//! Local-filesystem blob storage

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use creator_core::error::DomainError;
use creator_core::traits::{BlobStorage, RepoResult};

/// Reject empty, absolute, and parent-escaping paths
pub(crate) fn validate_blob_path(path: &str) -> RepoResult<&str> {
    let trimmed = path.trim();
    if trimmed.is_empty()
        || trimmed.starts_with('/')
        || trimmed.starts_with('\\')
        || trimmed.split(['/', '\\']).any(|segment| segment == ".." || segment.is_empty())
    {
        return Err(DomainError::InvalidPath(path.to_string()));
    }
    Ok(trimmed)
}

pub(crate) fn join_public_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Stores blobs under a root directory and serves them from a public base URL
#[derive(Debug, Clone)]
pub struct LocalBlobStorage {
    root: PathBuf,
    public_base: String,
}

impl LocalBlobStorage {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
        }
    }

    pub fn from_config(config: &creator_common::StorageConfig) -> Self {
        Self::new(&config.upload_dir, config.public_url.clone())
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

#[async_trait]
impl BlobStorage for LocalBlobStorage {
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    async fn upload(&self, path: &str, bytes: &[u8], overwrite: bool) -> RepoResult<String> {
        let path = validate_blob_path(path)?;
        let target = self.root.join(path);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::StorageError(e.to_string()))?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut file = options.open(&target).await.map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => DomainError::BlobExists(path.to_string()),
            _ => DomainError::StorageError(e.to_string()),
        })?;
        file.write_all(bytes)
            .await
            .map_err(|e| DomainError::StorageError(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| DomainError::StorageError(e.to_string()))?;

        debug!(path, "Blob stored");
        Ok(path.to_string())
    }

    fn public_url(&self, path: &str) -> String {
        join_public_url(&self.public_base, path)
    }
}
