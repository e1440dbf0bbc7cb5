use thiserror::Error;

use super::category::UploadCategory;

/// Errors that can occur while storing or reading uploaded files.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested file does not exist.
    #[error("upload not found: {0}")]
    NotFound(String),
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The file exceeds the configured size limit.
    #[error("file exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
    /// The content type is not accepted for the upload category.
    #[error("content type '{content_type}' is not accepted for {category} uploads")]
    UnsupportedType {
        category: UploadCategory,
        content_type: String,
    },
    /// The requested file name is not a plain, flat name.
    #[error("invalid file name: {0}")]
    InvalidName(String),
}

impl StorageError {
    /// Whether the error was caused by the client's input rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::SizeLimitExceeded { .. } | Self::UnsupportedType { .. } | Self::InvalidName(_)
        )
    }
}
