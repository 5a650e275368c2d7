use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

use crate::models::FieldErrors;
use crate::store::StoreError;
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(FieldErrors),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    TransportError(String),

    #[error("Internal server error")]
    InternalServerError(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::TransportError(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::TransportError(_) => "TRANSPORT_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// The message a client is allowed to see.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(_) => "The provided input is invalid".to_string(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::TransportError(_) => {
                "The event store could not be reached, please try again".to_string()
            }
            AppError::InternalServerError(_) => "An internal error occurred".to_string(),
        }
    }

    pub fn log(&self) {
        match self {
            AppError::ValidationError(fields) => {
                warn!(error = %fields, "Validation failed");
            }
            AppError::NotFound(msg) => {
                warn!(message = %msg, "Resource not found");
            }
            AppError::TransportError(msg) | AppError::InternalServerError(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("Event not found".to_string()),
            other => AppError::TransportError(other.to_string()),
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(fields: FieldErrors) -> Self {
        AppError::ValidationError(fields)
    }
}

impl From<tera::Error> for AppError {
    fn from(err: tera::Error) -> Self {
        AppError::InternalServerError(format!("template rendering failed: {err:?}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Log internal details
        self.log();

        let details = match &self {
            AppError::ValidationError(fields) => serde_json::to_value(fields).ok(),
            _ => None,
        };

        error_response(code, self.public_message(), details, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_keep_their_kind() {
        let not_found: AppError = StoreError::NotFound.into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let transport: AppError = StoreError::Cancelled.into();
        assert_eq!(transport.code(), "TRANSPORT_ERROR");
        assert_eq!(transport.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_transport_details_stay_private() {
        let err = AppError::TransportError("connection refused at 10.0.0.3:5432".to_string());
        assert!(!err.public_message().contains("10.0.0.3"));
    }

    #[test]
    fn test_validation_error_is_bad_request() {
        let err: AppError = FieldErrors::single("name", "too short").into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Validation error: name: too short");
    }
}
