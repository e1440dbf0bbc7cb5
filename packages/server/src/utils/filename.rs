/// Why a stored-file name from a URL was refused.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    Empty,
    ContainsPathSeparator,
    PathTraversal,
    Hidden,
    ControlCharacter,
}

impl FilenameError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::PathTraversal => "Invalid filename: '..' is not allowed",
            Self::Hidden => "Invalid filename: hidden files are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
        }
    }
}

/// Validates a flat file name (no directory components) taken from a request path.
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    if filename.is_empty() {
        return Err(FilenameError::Empty);
    }
    // NUL is a control character too.
    if filename.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }
    if filename.contains(['/', '\\']) {
        return Err(FilenameError::ContainsPathSeparator);
    }
    if filename == ".." {
        return Err(FilenameError::PathTraversal);
    }
    if filename.starts_with('.') {
        return Err(FilenameError::Hidden);
    }
    Ok(filename)
}

/// Last path component of a client-supplied multipart file name.
///
/// Browsers on some platforms send the full local path.
pub fn client_file_name(raw: &str) -> &str {
    raw.rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("upload")
}
