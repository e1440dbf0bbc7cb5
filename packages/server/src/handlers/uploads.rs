use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use common::storage::UploadCategory;
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Serves a stored upload by its public path, `/uploads/<category>/<name>`.
#[instrument(skip(state))]
pub async fn serve_upload(
    State(state): State<AppState>,
    Path((category, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let category: UploadCategory = category
        .parse()
        .map_err(|_| AppError::NotFound("File not found".into()))?;

    let content = state.uploads.open(category, &name).await?;
    let mime = mime_guess::from_path(&name).first_or_octet_stream();

    Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from(content))
        .map_err(|e| AppError::Internal(e.to_string()))
}
