// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for entire application

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: Comprehensive error enum for all possible failures
/// Each variant maps to appropriate HTTP status code and error response
#[derive(Error, Debug)]
pub enum MarketplaceError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Forbidden access")]
    Forbidden,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Cannot move rental from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Payment error: {0}")]
    PaymentError(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Internal server error")]
    InternalError,

    #[error("Service temporarily unavailable")]
    ServiceUnavailable,
}

impl MarketplaceError {
    /// Stable machine-readable code included in every error body
    pub fn code(&self) -> &'static str {
        match self {
            MarketplaceError::NotFound(_) => "NOT_FOUND",
            MarketplaceError::AlreadyExists(_) => "ALREADY_EXISTS",
            MarketplaceError::DatabaseError(_) => "DATABASE_ERROR",
            MarketplaceError::InvalidInput(_) => "INVALID_INPUT",
            MarketplaceError::ValidationError(_) => "VALIDATION_ERROR",
            MarketplaceError::Unauthorized => "UNAUTHORIZED",
            MarketplaceError::Forbidden => "FORBIDDEN",
            MarketplaceError::Conflict(_) => "CONFLICT",
            MarketplaceError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            MarketplaceError::PaymentError(_) => "PAYMENT_ERROR",
            MarketplaceError::ExternalApiError(_) => "EXTERNAL_API_ERROR",
            MarketplaceError::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            MarketplaceError::InternalError => "INTERNAL_ERROR",
            MarketplaceError::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

/// Lets repositories write `.map_err(MarketplaceError::from)` for plain lookups
impl From<sqlx::Error> for MarketplaceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => MarketplaceError::NotFound("row not found".to_string()),
            other => MarketplaceError::DatabaseError(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for MarketplaceError {
    fn from(err: validator::ValidationErrors) -> Self {
        MarketplaceError::ValidationError(err.to_string())
    }
}

/// Convert MarketplaceError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for MarketplaceError {
    fn error_response(&self) -> HttpResponse {
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(self.status_code()).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            MarketplaceError::NotFound(_) => StatusCode::NOT_FOUND,
            MarketplaceError::AlreadyExists(_) => StatusCode::CONFLICT,
            MarketplaceError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            MarketplaceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            MarketplaceError::ValidationError(_) => StatusCode::BAD_REQUEST,
            MarketplaceError::Unauthorized => StatusCode::UNAUTHORIZED,
            MarketplaceError::Forbidden => StatusCode::FORBIDDEN,
            MarketplaceError::Conflict(_) => StatusCode::CONFLICT,
            MarketplaceError::InvalidStateTransition { .. } => StatusCode::CONFLICT,
            MarketplaceError::PaymentError(_) => StatusCode::PAYMENT_REQUIRED,
            MarketplaceError::ExternalApiError(_) => StatusCode::BAD_GATEWAY,
            MarketplaceError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            MarketplaceError::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            MarketplaceError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}
