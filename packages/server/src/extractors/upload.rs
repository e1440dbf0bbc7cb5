use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::header,
};
use common::storage::{UploadCategory, UploadStore};
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::utils::filename::client_file_name;

/// Name of the multipart part that carries the JSON body.
pub const PAYLOAD_FIELD: &str = "payload";

/// A file part received with a create/update request. Not yet stored.
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Persist the file and return its public path.
    pub async fn store(
        &self,
        store: &dyn UploadStore,
        category: UploadCategory,
    ) -> Result<String, AppError> {
        Ok(store
            .store(category, &self.file_name, &self.content_type, &self.bytes)
            .await?)
    }
}

/// Request body for endpoints that accept optional file uploads.
///
/// Accepts either `multipart/form-data` (a `payload` part holding the JSON
/// body plus any number of file parts) or a plain JSON body with no files.
/// Files are only buffered here; handlers store them after authorization.
pub struct UploadForm<T> {
    pub payload: T,
    pub files: Vec<UploadedFile>,
}

impl<T> UploadForm<T> {
    /// Removes and returns the first file sent under `field`.
    pub fn take(&mut self, field: &str) -> Option<UploadedFile> {
        let idx = self.files.iter().position(|f| f.field == field)?;
        Some(self.files.remove(idx))
    }

    /// Removes and returns every file sent under `field`, in order.
    pub fn take_all(&mut self, field: &str) -> Vec<UploadedFile> {
        let (taken, rest) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|f| f.field == field);
        self.files = rest;
        taken
    }

    /// Rejects file parts no handler asked for.
    pub fn ensure_consumed(&self) -> Result<(), AppError> {
        match self.files.first() {
            Some(f) => Err(AppError::validation(format!(
                "Unexpected file field '{}'",
                f.field
            ))),
            None => Ok(()),
        }
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

impl<S, T> FromRequest<S> for UploadForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let Json(payload) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::validation(e.body_text()))?;
            return Ok(Self {
                payload,
                files: Vec::new(),
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;

        let mut payload_text: Option<String> = None;
        let mut files = Vec::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::validation(e.body_text()))?
        {
            let name = field
                .name()
                .unwrap_or_default()
                .trim_end_matches("[]")
                .to_string();

            let file_name = field.file_name().map(|n| client_file_name(n).to_string());
            let declared_type = field.content_type().map(str::to_string);

            if let Some(file_name) = file_name {
                let content_type = declared_type.unwrap_or_else(|| {
                    mime_guess::from_path(&file_name)
                        .first_or_octet_stream()
                        .to_string()
                });
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(e.body_text()))?;
                files.push(UploadedFile {
                    field: name,
                    file_name,
                    content_type,
                    bytes,
                });
            } else if name == PAYLOAD_FIELD {
                payload_text = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::validation(e.body_text()))?,
                );
            } else {
                return Err(AppError::validation(format!(
                    "Unexpected form field '{name}'; send fields inside '{PAYLOAD_FIELD}'"
                )));
            }
        }

        let payload_text = payload_text.as_deref().unwrap_or("{}");
        let payload = serde_json::from_str(payload_text)
            .map_err(|e| AppError::validation(format!("Invalid {PAYLOAD_FIELD}: {e}")))?;

        Ok(Self { payload, files })
    }
}
