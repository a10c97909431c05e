// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the custreg service.

use thiserror::Error;

/// The primary error type used across all custreg crates.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An outbox payload could not be serialized. Aborts the enclosing unit of work.
    #[error("serialization error: {source}")]
    Serialization {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The broker rejected or failed to accept a message.
    #[error("publish error: {message}")]
    Publish {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// A requested entity does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    /// A uniqueness constraint would be violated.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A business rule rejected the request.
    #[error("{code}: {message}")]
    BusinessRule { code: String, message: String },

    /// Request field validation failed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RegistryError {
    /// Shorthand for a [`RegistryError::Storage`] wrapping any error.
    pub fn storage(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        RegistryError::Storage {
            source: Box::new(e),
        }
    }

    /// Shorthand for a [`RegistryError::NotFound`].
    pub fn not_found(entity: &str, key: impl ToString) -> Self {
        RegistryError::NotFound {
            entity: entity.to_string(),
            key: key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = RegistryError::not_found("customer", 7);
        assert_eq!(e.to_string(), "customer not found: 7");

        let e = RegistryError::BusinessRule {
            code: "AGE_NOT_ELIGIBLE".into(),
            message: "age must be between 21 and 65".into(),
        };
        assert_eq!(e.to_string(), "AGE_NOT_ELIGIBLE: age must be between 21 and 65");

        let e = RegistryError::Timeout {
            duration: std::time::Duration::from_millis(250),
        };
        assert!(e.to_string().contains("250ms"));
    }
}
