// ABOUTME: Unified error handling for the nutrient intelligence library
// ABOUTME: Defines error codes, the AppError type, and convenience constructors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Nutrient Intelligence

//! # Unified Error Handling
//!
//! Centralized error types for the library. The engine's design philosophy is
//! fail-quiet-toward-undercounting: classification problems are recovered
//! locally by skipping the offending entry, and persistence failures degrade to
//! stale or empty state rather than propagating to callers. The error types
//! here cover the remaining boundaries where callers do need a `Result`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Standard error codes used throughout the library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The provided input is invalid
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput,
    /// The data format is invalid
    #[serde(rename = "INVALID_FORMAT")]
    InvalidFormat,
    /// The requested resource was not found
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound,
    /// An external service encountered an error
    #[serde(rename = "EXTERNAL_SERVICE_ERROR")]
    ExternalServiceError,
    /// An external service is currently unavailable
    #[serde(rename = "EXTERNAL_SERVICE_UNAVAILABLE")]
    ExternalServiceUnavailable,
    /// Configuration error encountered
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError,
    /// Storage operation failed
    #[serde(rename = "STORAGE_ERROR")]
    StorageError,
    /// Data serialization/deserialization failed
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError,
    /// An internal error occurred
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

impl ErrorCode {
    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::InvalidFormat => "The data format is invalid",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ExternalServiceError => "An external service encountered an error",
            Self::ExternalServiceUnavailable => "An external service is currently unavailable",
            Self::ConfigError => "Configuration error encountered",
            Self::StorageError => "Storage operation failed",
            Self::SerializationError => "Data serialization/deserialization failed",
            Self::InternalError => "An internal error occurred",
        }
    }
}

/// Additional context that can be attached to errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// User ID if available
    pub user_id: Option<Uuid>,
    /// Resource ID if applicable (e.g. a daily score document key)
    pub resource_id: Option<String>,
    /// Additional key-value context
    pub details: serde_json::Value,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            user_id: None,
            resource_id: None,
            details: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

/// Unified error type for the library
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    pub context: ErrorContext,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add a user ID to the error context
    #[must_use]
    pub fn with_user_id(mut self, user_id: Uuid) -> Self {
        self.context.user_id = Some(user_id);
        self
    }

    /// Add a resource ID to the error context
    #[must_use]
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.context.resource_id = Some(resource_id.into());
        self
    }

    /// Add details to the error context
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.context.details = details;
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Convenience functions for creating common errors
impl AppError {
    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Invalid format
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidFormat, message)
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// External service error
    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("{}: {}", service.into(), message.into()),
        )
    }

    /// External service unavailable
    pub fn service_unavailable(service: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceUnavailable,
            format!("{} is unavailable", service.into()),
        )
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

/// Conversion from `anyhow::Error` for store-adapter boundaries
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        match error.source() {
            Some(source) => {
                Self::new(ErrorCode::InternalError, error.to_string()).with_details(
                    serde_json::json!({
                        "source": source.to_string()
                    }),
                )
            }
            None => Self::new(ErrorCode::InternalError, error.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(ErrorCode::SerializationError, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_creation() {
        let error = AppError::storage("write failed")
            .with_user_id(Uuid::new_v4())
            .with_resource_id("vitamin_c:2025-06-01");

        assert_eq!(error.code, ErrorCode::StorageError);
        assert!(error.context.user_id.is_some());
        assert_eq!(
            error.context.resource_id.as_deref(),
            Some("vitamin_c:2025-06-01")
        );
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::ExternalServiceUnavailable).unwrap();
        assert_eq!(json, "\"EXTERNAL_SERVICE_UNAVAILABLE\"");
    }

    #[test]
    fn test_display_includes_description() {
        let error = AppError::invalid_input("serving size must be positive");
        let text = error.to_string();
        assert!(text.contains("invalid"));
        assert!(text.contains("serving size"));
    }
}
