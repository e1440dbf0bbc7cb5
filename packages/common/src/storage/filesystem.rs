use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::category::UploadCategory;
use super::error::StorageError;
use super::traits::UploadStore;

const MAX_EXTENSION_LEN: usize = 10;

/// Filesystem-backed upload store.
///
/// Files live at `{base_path}/{category}/{prefix}-{uuid}{.ext}`. Writes go to
/// `{base_path}/.tmp` first and are renamed into place, so a partially
/// written file is never served.
pub struct FilesystemUploadStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemUploadStore {
    /// Create a new store, creating the category directories if needed.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(base_path.join(".tmp")).await?;
        for category in UploadCategory::ALL {
            fs::create_dir_all(base_path.join(category.as_str())).await?;
        }
        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn file_path(&self, category: UploadCategory, name: &str) -> Result<PathBuf, StorageError> {
        if !is_flat_name(name) {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(self.base_path.join(category.as_str()).join(name))
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

/// Lowercased alphanumeric extension of the original name, if it has a usable one.
fn sanitized_extension(original_name: &str) -> Option<String> {
    let base = original_name.rsplit(['/', '\\']).next().unwrap_or_default();
    let ext = Path::new(base).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > MAX_EXTENSION_LEN {
        return None;
    }
    ext.chars()
        .all(|c| c.is_ascii_alphanumeric())
        .then(|| ext.to_ascii_lowercase())
}

fn is_flat_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && name != ".."
}

#[async_trait]
impl UploadStore for FilesystemUploadStore {
    async fn store(
        &self,
        category: UploadCategory,
        original_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, StorageError> {
        if !category.accepts(content_type) {
            return Err(StorageError::UnsupportedType {
                category,
                content_type: content_type.to_string(),
            });
        }
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let name = match sanitized_extension(original_name) {
            Some(ext) => format!("{}-{}.{ext}", category.prefix(), uuid::Uuid::new_v4()),
            None => format!("{}-{}", category.prefix(), uuid::Uuid::new_v4()),
        };
        let final_path = self.file_path(category, &name)?;

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(%category, name, size = data.len(), "Stored upload");
        Ok(format!("/uploads/{category}/{name}"))
    }

    async fn open(&self, category: UploadCategory, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.file_path(category, name)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(format!("{category}/{name}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, category: UploadCategory, name: &str) -> Result<bool, StorageError> {
        let path = self.file_path(category, name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
