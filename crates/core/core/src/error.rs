//! Error types for service registration.
//!
//! This module defines the `RegisterError` enum which covers validation of
//! incoming registration records and failures of the persistence layer.
//! Admission failures of the event pipeline live in the events crate.

use thiserror::Error;

use crate::types::RpcType;

/// The main error type for registration operations.
#[derive(Debug, Error)]
pub enum RegisterError {
    // ==================== Validation Errors ====================
    /// A required field is missing or blank.
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// A field value is invalid.
    #[error("Invalid field value for '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    /// The record was tagged with a protocol other than the one it was submitted for.
    #[error("Protocol mismatch: expected {expected}, got {actual}")]
    RpcTypeMismatch { expected: RpcType, actual: RpcType },

    // ==================== Storage Errors ====================
    /// A storage operation failed.
    #[error("Storage error: {message}")]
    StorageError { message: String },

    /// A plugin handle could not be encoded.
    #[error("Serialization error: {message}")]
    SerializationError { message: String },
}

impl RegisterError {
    /// Creates a new missing field error.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates a new invalid field error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError {
            message: message.into(),
        }
    }

    /// Returns true if the error was caused by the registering client's input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. } | Self::InvalidField { .. } | Self::RpcTypeMismatch { .. }
        )
    }

    /// Returns an HTTP status code appropriate for this error.
    pub fn status_code(&self) -> u16 {
        if self.is_validation() { 422 } else { 500 }
    }
}

/// A Result type alias using RegisterError.
pub type RegisterResult<T> = Result<T, RegisterError>;

impl From<serde_json::Error> for RegisterError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            message: err.to_string(),
        }
    }
}
