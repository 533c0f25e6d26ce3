/// Result of validating an uploaded file's display name.
#[derive(Debug)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename is longer than [`MAX_FILENAME_CHARS`].
    TooLong,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename contains control characters (CR, LF, NUL, etc.).
    ControlCharacter,
    /// Filename starts with a dot (hidden file).
    Hidden,
}

pub const MAX_FILENAME_CHARS: usize = 255;

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::TooLong => "Filename is too long",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
            Self::Hidden => "Invalid filename: hidden files (starting with '.') are not allowed",
        }
    }
}

/// Validates a display filename (no directory components allowed).
///
/// The name is only ever shown back to clients, never used as a path; the
/// checks keep it safe to echo into headers and UI.
pub fn validate_display_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.chars().count() > MAX_FILENAME_CHARS {
        return Err(FilenameError::TooLong);
    }

    // Reject control characters (including NUL) to prevent
    // HTTP header injection (e.g. CRLF in Content-Disposition).
    if trimmed.chars().any(char::is_control) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    Ok(trimmed)
}

/// Percent-encode a filename the way `encodeURIComponent` does.
pub fn percent_encode_filename(filename: &str) -> String {
    filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => String::from(b as char),
            _ => format!("%{b:02X}"),
        })
        .collect()
}

/// Build an `inline` `Content-Disposition` header value.
///
/// `inline` keeps browsers rendering the PDF in place instead of handing the
/// response to a download manager.
pub fn inline_content_disposition(filename: &str) -> String {
    let encoded = percent_encode_filename(filename);
    format!("inline; filename=\"{encoded}\"; filename*=UTF-8''{encoded}")
}
