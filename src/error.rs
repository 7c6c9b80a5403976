//! Error types
//!
//! Provides a unified error type hierarchy for all facade operations.
//!
//! # REST Reference
//! - `google.rpc.Code` canonical status names returned in REST error bodies
//!
//! # Design
//! Uses thiserror for ergonomic error definitions. Store failures are carried
//! by [`FirestoreError`] and convert into [`FirebaseError`] via `From`.
//! Projection failures have their own type because callers decide whether
//! they abort a batch.

use thiserror::Error;

/// Top-level error type
///
/// # Example
/// ```
/// use firestore_facade::{FirebaseError, FirestoreError};
///
/// let err: FirebaseError = FirestoreError::NotFound.into();
/// assert!(err.is_not_found());
/// ```
#[derive(Debug, Error)]
pub enum FirebaseError {
    /// Firestore-related errors
    #[error("Firestore error: {0}")]
    Firestore(#[from] FirestoreError),

    /// Network/HTTP errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filter operator outside the allowed set
    #[error("Invalid operator '{op}', must be one of {allowed:?}")]
    InvalidOperator {
        /// Operator as supplied by the caller
        op: String,
        /// Accepted operator spellings
        allowed: Vec<&'static str>,
    },

    /// Credentials could not be loaded or exchanged for a token
    #[error("Credentials error: {0}")]
    Credentials(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Firestore errors
///
/// Maps Firestore status codes to Rust enum variants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FirestoreError {
    /// Document not found
    #[error("Document not found")]
    NotFound,

    /// Permission denied
    #[error("Permission denied")]
    PermissionDenied,

    /// Resource already exists
    #[error("Resource already exists")]
    AlreadyExists,

    /// Resource exhausted (e.g., quota exceeded)
    #[error("Resource exhausted")]
    ResourceExhausted,

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Query or write rejected by the current state of the database
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// Deadline exceeded
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// Operation was aborted
    #[error("Operation aborted")]
    Aborted,

    /// Unimplemented feature
    #[error("Feature not implemented")]
    Unimplemented,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable
    #[error("Service unavailable")]
    Unavailable,

    /// Unauthenticated
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Unknown error with HTTP status code
    #[error("Unknown Firestore error: code {0}")]
    Unknown(u16),
}

/// Typed projection failure
///
/// Produced when a record cannot be turned into the caller's type, e.g. a
/// missing field, a type mismatch, or an unknown field on a type that
/// denies them.
#[derive(Debug, Error)]
#[error("Cannot project document '{id}': {source}")]
pub struct ProjectionError {
    /// Id of the record that failed to project
    pub id: String,
    /// Underlying deserialization error
    #[source]
    pub source: serde_json::Error,
}

impl FirebaseError {
    /// Create an internal error from a string
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a credentials error from a string
    pub fn credentials(msg: impl Into<String>) -> Self {
        Self::Credentials(msg.into())
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::Firestore(FirestoreError::Unavailable)
                | Self::Firestore(FirestoreError::DeadlineExceeded)
                | Self::Firestore(FirestoreError::ResourceExhausted)
                | Self::Firestore(FirestoreError::Aborted)
        )
    }

    /// Check if the store reported a missing document
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Firestore(FirestoreError::NotFound))
    }
}

impl FirestoreError {
    /// Create from a canonical status name (`"NOT_FOUND"`, `"PERMISSION_DENIED"`, ...)
    ///
    /// Falls back to the HTTP status when the name is not recognised.
    pub fn from_status(status: &str, message: impl Into<String>, http_status: u16) -> Self {
        let message = message.into();
        match status {
            "NOT_FOUND" => Self::NotFound,
            "PERMISSION_DENIED" => Self::PermissionDenied,
            "ALREADY_EXISTS" => Self::AlreadyExists,
            "RESOURCE_EXHAUSTED" => Self::ResourceExhausted,
            "INVALID_ARGUMENT" | "OUT_OF_RANGE" => Self::InvalidArgument(message),
            "FAILED_PRECONDITION" => Self::FailedPrecondition(message),
            "DEADLINE_EXCEEDED" => Self::DeadlineExceeded,
            "ABORTED" => Self::Aborted,
            "UNIMPLEMENTED" => Self::Unimplemented,
            "INTERNAL" | "DATA_LOSS" => Self::Internal(message),
            "UNAVAILABLE" => Self::Unavailable,
            "UNAUTHENTICATED" => Self::Unauthenticated,
            _ => Self::from_http_status(http_status, message),
        }
    }

    /// Create from a bare HTTP status code
    pub fn from_http_status(code: u16, message: impl Into<String>) -> Self {
        match code {
            400 => Self::InvalidArgument(message.into()),
            401 => Self::Unauthenticated,
            403 => Self::PermissionDenied,
            404 => Self::NotFound,
            409 => Self::AlreadyExists,
            412 => Self::FailedPrecondition(message.into()),
            429 => Self::ResourceExhausted,
            500 => Self::Internal(message.into()),
            501 => Self::Unimplemented,
            503 => Self::Unavailable,
            504 => Self::DeadlineExceeded,
            _ => Self::Unknown(code),
        }
    }
}
