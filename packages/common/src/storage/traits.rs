use async_trait::async_trait;

use super::category::UploadCategory;
use super::error::StorageError;

/// Storage for user-uploaded files.
///
/// The rest of the application only ever sees the public path returned by
/// [`UploadStore::store`], never the bytes.
#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Store an uploaded file and return its public path,
    /// `/uploads/<category>/<generated-name>`.
    async fn store(
        &self,
        category: UploadCategory,
        original_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, StorageError>;

    /// Read a previously stored file by its generated name.
    async fn open(&self, category: UploadCategory, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Remove a stored file. Returns `false` if it did not exist.
    async fn remove(&self, category: UploadCategory, name: &str) -> Result<bool, StorageError>;
}

/// Splits a public path produced by [`UploadStore::store`] into its parts.
pub fn parse_public_path(path: &str) -> Option<(UploadCategory, &str)> {
    let rest = path.strip_prefix("/uploads/")?;
    let (category, name) = rest.split_once('/')?;
    let category = category.parse().ok()?;
    (!name.is_empty() && !name.contains('/')).then_some((category, name))
}
