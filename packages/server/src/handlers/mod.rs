pub mod applicant;
pub mod auth;
pub mod calendar;
pub mod category;
pub mod dashboard;
pub mod event;
pub mod guest;
pub mod news;
pub mod notification;
pub mod opportunity;
pub mod payment;
pub mod registration;
pub mod uploads;
pub mod user;

use std::collections::BTreeMap;
use std::future::Future;

use axum::extract::DefaultBodyLimit;
use common::storage::{UploadCategory, parse_public_path};
use sea_orm::*;

use crate::error::AppError;
use crate::extractors::upload::UploadedFile;
use crate::models::shared::{PageParams, Pagination};
use crate::state::AppState;

/// Body limit for routes that accept multipart uploads (several images per request).
pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(64 * 1024 * 1024)
}

/// Runs `select` for one page and counts the full filtered set.
pub(crate) async fn fetch_page<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    page: PageParams,
) -> Result<(Vec<E::Model>, Pagination), DbErr>
where
    E: EntityTrait,
    E::Model: Send + Sync,
{
    let total = select.clone().count(db).await?;
    let items = select
        .offset(Some(page.offset()))
        .limit(Some(page.per_page))
        .all(db)
        .await?;
    Ok((items, Pagination::new(total, page)))
}

/// Row counts grouped by `column`. NULL keys are reported as `none`.
pub(crate) async fn count_by<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    column: E::Column,
) -> Result<BTreeMap<String, u64>, DbErr>
where
    E: EntityTrait,
{
    let rows: Vec<(Option<String>, i64)> = select
        .select_only()
        .column(column)
        .column_as(column.count(), "count")
        .group_by(column)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(key, count)| (key.unwrap_or_else(|| "none".into()), Ord::max(count, 0) as u64))
        .collect())
}

/// Aggregates are optional extras on list responses; a failure is logged and
/// the listing is returned without them.
pub(crate) async fn best_effort_stats<T, F>(resource: &str, stats: F) -> Option<T>
where
    F: Future<Output = Result<T, DbErr>>,
{
    match stats.await {
        Ok(stats) => Some(stats),
        Err(e) => {
            tracing::warn!(resource, error = %e, "Failed to compute list stats");
            None
        }
    }
}

/// Maps a missing row to `NotFound("<what> not found")`.
pub(crate) fn found<T>(row: Option<T>, what: &str) -> Result<T, AppError> {
    row.ok_or_else(|| AppError::NotFound(format!("{what} not found")))
}

/// Stores an optional upload under `category`, returning its public path.
pub(crate) async fn store_upload(
    state: &AppState,
    file: Option<UploadedFile>,
    category: UploadCategory,
) -> Result<Option<String>, AppError> {
    match file {
        Some(file) => Ok(Some(file.store(state.uploads.as_ref(), category).await?)),
        None => Ok(None),
    }
}

pub(crate) async fn store_uploads(
    state: &AppState,
    files: &[UploadedFile],
    category: UploadCategory,
) -> Result<Vec<String>, AppError> {
    let mut paths = Vec::with_capacity(files.len());
    for file in files {
        match file.store(state.uploads.as_ref(), category).await {
            Ok(path) => paths.push(path),
            Err(e) => {
                discard_uploads(state, &paths).await;
                return Err(e);
            }
        }
    }
    Ok(paths)
}

/// Awaits `write`; if it fails, the files already stored for it are removed.
pub(crate) async fn discard_on_error<T, E, F>(
    state: &AppState,
    stored: &[String],
    write: F,
) -> Result<T, AppError>
where
    F: Future<Output = Result<T, E>>,
    AppError: From<E>,
{
    match write.await {
        Ok(value) => Ok(value),
        Err(e) => {
            discard_uploads(state, stored).await;
            Err(e.into())
        }
    }
}

/// Best-effort removal of stored uploads by public path.
pub(crate) async fn discard_uploads(state: &AppState, paths: &[String]) {
    for path in paths {
        let Some((category, name)) = parse_public_path(path) else {
            tracing::warn!(path, "Not an upload path, nothing to discard");
            continue;
        };
        match state.uploads.remove(category, name).await {
            Ok(_) => tracing::debug!(path, "Discarded upload"),
            Err(e) => tracing::warn!(path, error = %e, "Failed to discard upload"),
        }
    }
}
