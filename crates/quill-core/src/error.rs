//! Error types for quill.

use thiserror::Error;

/// Result type alias using quill's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for quill operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Document tree fails structural invariants. Never silently repaired;
    /// always rejected at ingestion.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// A step's bounds fall outside the current document size.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// An insertion is structurally impossible (e.g. marks on a non-text
    /// node, nested block content in a slice).
    #[error("Incompatible slice: {0}")]
    IncompatibleSlice(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(uuid::Uuid),

    /// Actor is known but not allowed to perform the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A save raced another writer: the base version no longer matches the
    /// stored version.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A sharing grant already exists for this (document, grantee) pair.
    #[error("Already shared: {0}")]
    AlreadyShared(String),

    /// Language-model or persistence collaborator unavailable or erroring.
    /// The only retryable class; retry policy belongs to the caller.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::ExternalService(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_malformed_document() {
        let err = Error::MalformedDocument("marks on paragraph".to_string());
        assert_eq!(err.to_string(), "Malformed document: marks on paragraph");
    }

    #[test]
    fn test_error_display_invalid_range() {
        let err = Error::InvalidRange("to=9 exceeds size 4".to_string());
        assert_eq!(err.to_string(), "Invalid range: to=9 exceeds size 4");
    }

    #[test]
    fn test_error_display_forbidden() {
        let err = Error::Forbidden("actor may not manage shares".to_string());
        assert_eq!(
            err.to_string(),
            "Forbidden: actor may not manage shares"
        );
    }

    #[test]
    fn test_error_display_note_not_found() {
        let id = uuid::Uuid::nil();
        let err = Error::NoteNotFound(id);
        assert_eq!(err.to_string(), format!("Note not found: {}", id));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
