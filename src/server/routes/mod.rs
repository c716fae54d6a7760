//! HTTP route modules
//!
//! This module contains all HTTP route handlers organized by functionality.

pub mod exports;
pub mod health;
pub mod migrations;
pub mod tokens;

/// Standard success envelope
///
/// Error paths never use this: they go through the
/// [`crate::utils::error::ErrorResponse`] body built by the
/// `ResponseError` impl on `EngineError`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T>
where
    T: serde::Serialize,
{
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }
}
