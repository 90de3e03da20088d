//! # Gateway Identifier Newtypes
//!
//! Identifiers handed out by the storage gateway. They are opaque to fgate
//! but are validated on the way in: a `ContentId` doubles as a directory
//! name under the upload directory and as a URL path segment, and a
//! `FileSystemToken` must never reach a log line.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Longest content identifier accepted from the gateway.
pub const MAX_CONTENT_ID_LEN: usize = 128;

/// Identifier of a gateway file-system namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FileSystemId(String);

impl FileSystemId {
    /// Create a namespace identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidFileSystemId`] if the value is empty
    /// or contains whitespace or control characters.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() || s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValidationError::InvalidFileSystemId(s));
        }
        Ok(Self(s))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FileSystemId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FileSystemId> for String {
    fn from(id: FileSystemId) -> Self {
        id.0
    }
}

impl std::fmt::Display for FileSystemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content identifier returned by the gateway's hot-set ingestion.
///
/// # Validation
///
/// - 1 to [`MAX_CONTENT_ID_LEN`] characters
/// - ASCII alphanumerics only, so the value is safe as a path component
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    /// Create a content identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidContentId`] on an empty, oversized or
    /// non-alphanumeric value.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty()
            || s.len() > MAX_CONTENT_ID_LEN
            || !s.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ValidationError::InvalidContentId(s));
        }
        Ok(Self(s))
    }

    /// Access the identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ContentId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ContentId> for String {
    fn from(id: ContentId) -> Self {
        id.0
    }
}

impl std::str::FromStr for ContentId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Credential scoping gateway calls to one namespace.
///
/// Custom `Debug` redacts the value to prevent credential leakage in logs.
/// There is deliberately no `Display` or `Serialize` impl.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct FileSystemToken(String);

impl FileSystemToken {
    /// Wrap a credential string.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyToken`] for an empty value.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let s = value.into();
        if s.is_empty() {
            return Err(ValidationError::EmptyToken);
        }
        Ok(Self(s))
    }

    /// Expose the raw credential for header construction or persistence.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FileSystemToken {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::fmt::Debug for FileSystemToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FileSystemToken([REDACTED])")
    }
}
