//! Blob storage port

use async_trait::async_trait;

use super::RepoResult;

/// Object storage for attachments and avatars
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store `bytes` under `path` and return the stored path
    ///
    /// Fails with `BlobExists` when the path is taken and `overwrite` is false.
    async fn upload(&self, path: &str, bytes: &[u8], overwrite: bool) -> RepoResult<String>;

    /// Public URL clients can fetch the blob from
    fn public_url(&self, path: &str) -> String;
}
