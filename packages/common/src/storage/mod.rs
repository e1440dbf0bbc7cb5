mod category;
mod error;
mod traits;

pub mod filesystem;

pub use category::{ParseCategoryError, UploadCategory};
pub use error::StorageError;
pub use filesystem::FilesystemUploadStore;
pub use traits::{UploadStore, parse_public_path};
