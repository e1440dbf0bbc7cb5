use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AppError;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Pagination metadata included in list responses.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Total number of matching items across all pages.
    #[schema(example = 25)]
    pub total: u64,
    #[schema(example = 3)]
    pub total_pages: u64,
    /// Current page number (1-based).
    #[schema(example = 2)]
    pub current_page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    /// Whether a page after this one exists.
    pub has_more: bool,
}

impl Pagination {
    pub fn new(total: u64, page: PageParams) -> Self {
        let total_pages = total.div_ceil(page.per_page);
        Self {
            total,
            total_pages,
            current_page: page.page,
            per_page: page.per_page,
            has_more: page.page < total_pages,
        }
    }
}

/// Resolved `page`/`limit` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: u64,
    pub per_page: u64,
}

impl PageParams {
    /// Applies defaults (1/10), a floor of 1 and the page-size cap.
    pub fn resolve(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: Ord::max(page.unwrap_or(1), 1),
            per_page: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Rows to skip. Saturates at `i64::MAX`, the largest OFFSET a database accepts;
    /// such a page is simply empty.
    pub fn offset(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.per_page)
            .min(i64::MAX as u64)
    }
}

/// Bare `page`/`limit` query for nested list endpoints.
#[derive(Deserialize, utoipa::IntoParams)]
#[serde(deny_unknown_fields)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Collects per-field validation messages so a request reports all of them at once.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    /// Records `message` unless `ok` holds.
    pub fn check(&mut self, ok: bool, message: impl Into<String>) {
        if !ok {
            self.push(message);
        }
    }

    pub fn required_text(&mut self, field: &str, value: &str, max_chars: usize) {
        let len = value.trim().chars().count();
        self.check(
            len > 0 && len <= max_chars,
            format!("{field} must be 1-{max_chars} characters"),
        );
    }

    pub fn optional_text(&mut self, field: &str, value: Option<&str>, max_chars: usize) {
        if let Some(value) = value {
            self.check(
                value.chars().count() <= max_chars,
                format!("{field} must be at most {max_chars} characters"),
            );
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        self.check(is_valid_email(value), format!("{field} must be a valid email address"));
    }

    pub fn finish(self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.0))
        }
    }
}

/// Structural email check: one `@`, non-empty local part, dotted domain, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

/// Normalizes an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Response body for successful deletes.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Event deleted successfully")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
