//! # Upload File-Name Sanitization
//!
//! Client-supplied names are reduced to a conservative ASCII alphabet
//! before they touch the filesystem:
//!
//! 1. Non-ASCII characters are dropped.
//! 2. `/` and `\` become whitespace, and runs of whitespace become `_`.
//! 3. Everything outside `[A-Za-z0-9_.-]` is removed.
//! 4. Leading and trailing `.` and `_` are stripped, so `..` can never survive.
//! 5. Windows device names (`CON`, `NUL`, `COM1`, ...) get a `_` prefix.
//! 6. The result is capped at [`MAX_FILE_NAME_LEN`] bytes. The stem is
//!    shortened first so an extension of up to [`MAX_EXTENSION_LEN`] bytes
//!    survives.
//!
//! An empty result is an error; callers report it as invalid input.

use serde::Serialize;

use crate::error::ValidationError;

/// Longest sanitized name, in bytes (common filesystem limit).
pub const MAX_FILE_NAME_LEN: usize = 255;

/// Longest extension kept intact when a name is capped.
pub const MAX_EXTENSION_LEN: usize = 16;

const WINDOWS_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "LPT1", "LPT2", "LPT3",
];

/// A file name that is safe to join onto a directory path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct FileName(String);

impl FileName {
    /// Access the sanitized name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rebuild a name read back from storage.
    ///
    /// The stored value must already be in sanitized form; anything the
    /// sanitizer would change is rejected.
    pub fn from_stored(value: &str) -> Result<Self, ValidationError> {
        let name = sanitize_file_name(value)?;
        if name.0 != value {
            return Err(ValidationError::UnsanitizedFileName(value.to_string()));
        }
        Ok(name)
    }
}

impl From<FileName> for String {
    fn from(name: FileName) -> Self {
        name.0
    }
}

impl std::fmt::Display for FileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<std::path::Path> for FileName {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

/// Sanitize a client-supplied file name.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyFileName`] when nothing survives.
pub fn sanitize_file_name(original: &str) -> Result<FileName, ValidationError> {
    let spaced: String = original
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let filtered: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let mut name = filtered.trim_matches(|c| c == '.' || c == '_').to_string();

    if let Some(stem) = name.split('.').next() {
        if WINDOWS_DEVICE_NAMES.contains(&stem.to_ascii_uppercase().as_str()) {
            name.insert(0, '_');
        }
    }

    let name = cap_length(name);
    let name = name.trim_end_matches(|c| c == '.' || c == '_').to_string();

    if name.is_empty() {
        return Err(ValidationError::EmptyFileName(original.to_string()));
    }
    Ok(FileName(name))
}

/// Shorten an over-long name, keeping a short extension where there is one.
///
/// Input is ASCII, so byte slicing is char-safe.
fn cap_length(mut name: String) -> String {
    if name.len() <= MAX_FILE_NAME_LEN {
        return name;
    }
    if let Some((stem, ext)) = name.rsplit_once('.') {
        if !ext.is_empty() && ext.len() <= MAX_EXTENSION_LEN {
            let keep = MAX_FILE_NAME_LEN - ext.len() - 1;
            let stem = stem[..keep.min(stem.len())].trim_end_matches(|c| c == '.' || c == '_');
            if !stem.is_empty() {
                return format!("{stem}.{ext}");
            }
        }
    }
    name.truncate(MAX_FILE_NAME_LEN);
    name
}
