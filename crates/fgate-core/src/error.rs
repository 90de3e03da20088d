//! # Error Types
//!
//! Validation failures raised by the validated constructors in this crate.

use thiserror::Error;

/// Rejected input for a domain newtype.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Namespace identifier is empty or contains whitespace/control characters.
    #[error("invalid file system id: \"{0}\"")]
    InvalidFileSystemId(String),

    /// Content identifier is empty, too long, or contains characters outside `[A-Za-z0-9]`.
    #[error("invalid content id: \"{0}\" (expected 1-128 ASCII alphanumerics)")]
    InvalidContentId(String),

    /// Namespace credential is empty.
    #[error("file system token must not be empty")]
    EmptyToken,

    /// Sanitization removed every character of the original file name.
    #[error("file name \"{0}\" is empty after sanitization")]
    EmptyFileName(String),

    /// A stored file name is not in the form sanitization produces.
    #[error("stored file name \"{0}\" is not in sanitized form")]
    UnsanitizedFileName(String),
}
