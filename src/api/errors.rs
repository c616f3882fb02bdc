//! Structured errors reported by the flashcards API

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable error code carried by every API failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad input shape or length
    ValidationError,
    /// Missing or invalid credential
    Unauthorized,
    /// Id does not exist or is not owned by the caller
    NotFound,
    /// Backend persistence failure
    DatabaseError,
    /// Unexpected failure, including transport errors
    InternalServerError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound => "NOT_FOUND",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Best-effort code for a response that carried no error envelope
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::ValidationError,
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            _ => Self::InternalServerError,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error payload returned by every flashcards API operation
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn validation_with_details(message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::validation(message).with_details(details)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalServerError, message)
    }

    /// Whether the caller should be sent back to the login screen
    pub fn is_unauthorized(&self) -> bool {
        self.code == ErrorCode::Unauthorized
    }
}

/// Wire envelope: `{"error": {"code": ..., "message": ..., "details": ...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ApiError,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
