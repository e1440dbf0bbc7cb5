use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

const DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Destination of an uploaded file.
///
/// Each handler names its category explicitly; the category decides the
/// directory, the generated file-name prefix and which content types are
/// accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UploadCategory {
    Events,
    Guests,
    News,
    Opportunities,
    Resumes,
}

impl UploadCategory {
    pub const ALL: &'static [UploadCategory] = &[
        Self::Events,
        Self::Guests,
        Self::News,
        Self::Opportunities,
        Self::Resumes,
    ];

    /// Directory name, also the second segment of the public path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Guests => "guests",
            Self::News => "news",
            Self::Opportunities => "opportunities",
            Self::Resumes => "resumes",
        }
    }

    /// Prefix of generated file names.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Events => "event",
            Self::Guests => "guest",
            Self::News => "news",
            Self::Opportunities => "opportunity",
            Self::Resumes => "resume",
        }
    }

    pub fn accepted_types(&self) -> &'static [&'static str] {
        match self {
            Self::Resumes => DOCUMENT_TYPES,
            _ => IMAGE_TYPES,
        }
    }

    /// Checks a declared content type, ignoring parameters such as `charset`.
    pub fn accepts(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.accepted_types().contains(&essence.as_str())
    }
}

impl fmt::Display for UploadCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unknown category name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseCategoryError(String);

impl fmt::Display for ParseCategoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown upload category '{}'", self.0)
    }
}

impl std::error::Error for ParseCategoryError {}

impl FromStr for UploadCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}
