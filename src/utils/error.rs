//! Error handling for the engine
//!
//! This module defines all error types used throughout the engine.

use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Result type alias for the engine
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Unknown migration key, missing or expired job
    #[error("Not found: {0}")]
    NotFound(String),

    /// A migration precondition is not satisfied
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// Identity or token mismatch
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Export filter matched zero rows
    #[error("Empty export: {0}")]
    EmptyExport(String),

    /// Optimistic version check on stored job state failed
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Artifact or dataset write failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Request validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Standard error response format
#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(serde::Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub timestamp: i64,
}

impl ResponseError for EngineError {
    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code, message) = match self {
            EngineError::Config(_) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                self.to_string(),
            ),
            EngineError::Io(_) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                "IO operation failed".to_string(),
            ),
            EngineError::Serialization(_) | EngineError::Yaml(_) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "SERIALIZATION_ERROR",
                "Serialization failed".to_string(),
            ),
            EngineError::NotFound(_) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                self.to_string(),
            ),
            EngineError::PreconditionFailed(_) => (
                actix_web::http::StatusCode::PRECONDITION_FAILED,
                "PRECONDITION_FAILED",
                self.to_string(),
            ),
            EngineError::Unauthorized(_) => (
                actix_web::http::StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                self.to_string(),
            ),
            EngineError::EmptyExport(_) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "EMPTY_EXPORT",
                self.to_string(),
            ),
            EngineError::Conflict(_) => (
                actix_web::http::StatusCode::CONFLICT,
                "CONFLICT",
                self.to_string(),
            ),
            EngineError::Storage(_) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                self.to_string(),
            ),
            EngineError::Validation(_) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                self.to_string(),
            ),
            EngineError::Internal(_) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: error_code.to_string(),
                message,
                timestamp: chrono::Utc::now().timestamp(),
            },
        };

        HttpResponse::build(status_code).json(error_response)
    }
}

/// Helper functions for creating specific errors
impl EngineError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }

    pub fn precondition<S: Into<String>>(message: S) -> Self {
        Self::PreconditionFailed(message.into())
    }

    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn empty_export<S: Into<String>>(message: S) -> Self {
        Self::EmptyExport(message.into())
    }

    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::Conflict(message.into())
    }

    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage(message.into())
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = EngineError::not_found("unknown migration: bogus");
        assert!(matches!(error, EngineError::NotFound(_)));

        let error = EngineError::precondition("meta store unavailable");
        assert!(matches!(error, EngineError::PreconditionFailed(_)));
    }

    #[test]
    fn test_error_display_includes_context() {
        let error = EngineError::conflict("job abc version 3 != 4");
        assert!(error.to_string().contains("version 3"));
    }

    #[test]
    fn test_http_status_mapping() {
        use actix_web::http::StatusCode;

        let resp = EngineError::not_found("x").error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = EngineError::unauthorized("x").error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = EngineError::precondition("x").error_response();
        assert_eq!(resp.status(), StatusCode::PRECONDITION_FAILED);

        let resp = EngineError::conflict("x").error_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
