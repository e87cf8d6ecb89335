//! Centralized error handling module
//!
//! Provides unified error types and HTTP response mapping for the entire application.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::dispatch::DispatchError;

/// Application-wide error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("No zone for location: {0}")]
    NoZoneForLocation(String),

    #[error("No ambulance available: {0}")]
    NoAmbulanceAvailable(String),

    #[error("No hospital available: {0}")]
    NoHospitalAvailable(String),

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<DispatchError> for AppError {
    fn from(err: DispatchError) -> Self {
        let message = err.to_string();
        match err {
            DispatchError::InputValidation(_) => AppError::ValidationError(message),
            DispatchError::NoZoneForLocation { .. } => AppError::NoZoneForLocation(message),
            DispatchError::NoAmbulanceAvailable => AppError::NoAmbulanceAvailable(message),
            DispatchError::NoHospitalAvailable { .. } => AppError::NoHospitalAvailable(message),
        }
    }
}

/// Standardized error response format
#[derive(Serialize)]
pub struct ErrorResponse {
    /// Unique correlation ID for tracing
    pub correlation_id: String,
    /// Error type classification
    pub error_type: String,
    /// Human-readable error message (safe for clients)
    pub message: String,
    /// HTTP status code
    pub status_code: u16,
    /// Timestamp of the error
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str, status_code: StatusCode) -> Self {
        Self {
            correlation_id: Uuid::new_v4().to_string(),
            error_type: error_type.to_string(),
            message: message.to_string(),
            status_code: status_code.as_u16(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type, self.message)
    }
}

impl AppError {
    fn error_type(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NoZoneForLocation(_) => "NO_ZONE_FOR_LOCATION",
            AppError::NoAmbulanceAvailable(_) => "NO_AMBULANCE_AVAILABLE",
            AppError::NoHospitalAvailable(_) => "NO_HOSPITAL_AVAILABLE",
            AppError::InvalidTransition(_) => "INVALID_TRANSITION",
            AppError::InternalError(_) => "INTERNAL_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BadRequest(_) => "BAD_REQUEST",
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_type = self.error_type();
        let message = match self {
            AppError::InternalError(msg) => {
                // Log internal errors but return safe message to client
                error!(error = %msg, "Internal server error occurred");
                "An internal error occurred"
            }
            AppError::ValidationError(msg)
            | AppError::NoZoneForLocation(msg)
            | AppError::NoAmbulanceAvailable(msg)
            | AppError::NoHospitalAvailable(msg)
            | AppError::InvalidTransition(msg)
            | AppError::NotFound(msg)
            | AppError::BadRequest(msg) => msg.as_str(),
        };

        let error_response = ErrorResponse::new(error_type, message, status);

        error!(
            correlation_id = %error_response.correlation_id,
            error_type = %error_type,
            status_code = %status.as_u16(),
            "Error response generated"
        );

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NoZoneForLocation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NoAmbulanceAvailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::NoHospitalAvailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;
