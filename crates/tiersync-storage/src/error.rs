//! Storage error types.

use std::fmt;

/// Errors that can occur during object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Object not found: {kind}/{name}")]
    NotFound { kind: String, name: String },

    /// The `if_match` precondition did not hold.
    #[error("Version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: String, actual: String },

    #[error("Object already exists: {kind}/{name}")]
    AlreadyExists { kind: String, name: String },

    /// The object is missing required fields or has the wrong shape.
    #[error("Invalid object: {message}")]
    InvalidObject { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl StorageError {
    #[must_use]
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn version_conflict(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::VersionConflict {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    #[must_use]
    pub fn already_exists(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind: kind.into(),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn invalid_object(message: impl Into<String>) -> Self {
        Self::InvalidObject {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Returns the error category for logging.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::VersionConflict { .. } | Self::AlreadyExists { .. } => ErrorCategory::Conflict,
            Self::InvalidObject { .. } | Self::Serialization { .. } => ErrorCategory::Validation,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

/// Categories of storage errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    NotFound,
    /// Version or existence conflict.
    Conflict,
    Validation,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Validation => write!(f, "validation"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::not_found("Space", "ws-1");
        assert_eq!(err.to_string(), "Object not found: Space/ws-1");

        let err = StorageError::version_conflict("3", "4");
        assert_eq!(err.to_string(), "Version conflict: expected 3, found 4");

        let err = StorageError::already_exists("MasterUserRecord", "alice");
        assert_eq!(err.to_string(), "Object already exists: MasterUserRecord/alice");
    }

    #[test]
    fn test_error_predicates() {
        let err = StorageError::not_found("Space", "ws-1");
        assert!(err.is_not_found());
        assert!(!err.is_version_conflict());

        let err = StorageError::version_conflict("1", "2");
        assert!(err.is_version_conflict());
        assert!(!err.is_already_exists());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            StorageError::not_found("Space", "ws-1").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            StorageError::already_exists("Space", "ws-1").category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            StorageError::invalid_object("missing metadata.name").category(),
            ErrorCategory::Validation
        );
        assert_eq!(ErrorCategory::Conflict.to_string(), "conflict");
    }

    #[test]
    fn test_from_serde_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: StorageError = json_err.into();
        assert!(matches!(err, StorageError::Serialization { .. }));
    }
}
