use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::NewsStatus;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use super::event::strings_from_json;
use super::shared::{FieldErrors, Pagination, double_option};
use crate::entity::news;
use crate::error::AppError;

const MAX_TAGS: usize = 20;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateNewsRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub status: NewsStatus,
    pub category_id: Option<i32>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Ignored; the author is the caller.
    #[schema(value_type = Option<i32>)]
    pub author_id: Option<IgnoredAny>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateNewsRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<NewsStatus>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub category_id: Option<Option<i32>>,
    pub tags: Option<Vec<String>>,
    /// Ignored; ownership cannot be transferred through an update.
    #[schema(value_type = Option<i32>)]
    pub author_id: Option<IgnoredAny>,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NewsListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<NewsStatus>,
    pub category_id: Option<i32>,
    #[serde(default)]
    pub include_stats: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewsResponse {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub status: NewsStatus,
    pub category_id: Option<i32>,
    pub tags: Vec<String>,
    pub author_id: i32,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewsStats {
    pub total: u64,
    pub by_status: BTreeMap<String, u64>,
    pub published_last7_days: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NewsListResponse {
    pub news: Vec<NewsResponse>,
    pub pagination: Pagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<NewsStats>,
}

impl From<news::Model> for NewsResponse {
    fn from(m: news::Model) -> Self {
        Self {
            id: m.id,
            tags: strings_from_json(&m.tags),
            title: m.title,
            content: m.content,
            image: m.image,
            status: m.status,
            category_id: m.category_id,
            author_id: m.author_id,
            published_at: m.published_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Normalized tag list: trimmed, empties dropped, duplicates removed in order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Publication timestamp after a status change: stamped once, on the first
/// transition to `published`, and kept afterwards.
pub fn published_at_after(
    current: Option<DateTime<Utc>>,
    status: NewsStatus,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match (current, status) {
        (Some(at), _) => Some(at),
        (None, NewsStatus::Published) => Some(now),
        (None, _) => None,
    }
}

fn check_tags(errors: &mut FieldErrors, tags: &[String]) {
    errors.check(tags.len() <= MAX_TAGS, format!("at most {MAX_TAGS} tags are allowed"));
    errors.check(
        tags.iter().all(|t| t.chars().count() <= 50),
        "tags must be at most 50 characters",
    );
}

pub fn validate_create_news(req: &CreateNewsRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    errors.required_text("title", &req.title, 200);
    errors.required_text("content", &req.content, 100_000);
    check_tags(&mut errors, &req.tags);
    errors.finish()
}

pub fn validate_update_news(req: &UpdateNewsRequest) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    if let Some(ref title) = req.title {
        errors.required_text("title", title, 200);
    }
    if let Some(ref content) = req.content {
        errors.required_text("content", content, 100_000);
    }
    if let Some(ref tags) = req.tags {
        check_tags(&mut errors, tags);
    }
    errors.finish()
}
