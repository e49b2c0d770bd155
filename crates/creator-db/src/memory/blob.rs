use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use creator_core::error::DomainError;
use creator_core::traits::{BlobStorage, RepoResult};

use crate::storage::{join_public_url, validate_blob_path};

/// Blob storage held in process memory
#[derive(Debug)]
pub struct MemoryBlobStorage {
    public_base: String,
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    failing: AtomicBool,
}

impl MemoryBlobStorage {
    pub fn new(public_base: impl Into<String>) -> Self {
        Self {
            public_base: public_base.into(),
            blobs: RwLock::new(HashMap::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.blobs.read().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    /// Make uploads fail until called again with `false`
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Default for MemoryBlobStorage {
    fn default() -> Self {
        Self::new("memory://blobs")
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobStorage {
    async fn upload(&self, path: &str, bytes: &[u8], overwrite: bool) -> RepoResult<String> {
        let path = validate_blob_path(path)?;
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::StorageError("injected upload failure".to_string()));
        }

        let mut blobs = self.blobs.write();
        if !overwrite && blobs.contains_key(path) {
            return Err(DomainError::BlobExists(path.to_string()));
        }
        blobs.insert(path.to_string(), bytes.to_vec());
        Ok(path.to_string())
    }

    fn public_url(&self, path: &str) -> String {
        join_public_url(&self.public_base, path)
    }
}
