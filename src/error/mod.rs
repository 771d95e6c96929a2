use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use sqlx::error::Error as SqlxError;

/// Message returned for every authentication failure, regardless of cause.
/// Clients must not be able to tell an expired token from a forged one.
pub const GENERIC_AUTH_MESSAGE: &str = "Unauthorized request";

#[derive(Debug)]
pub enum AppError {
    /// Missing/invalid/expired access token, or the subject no longer exists.
    Unauthenticated(String),
    /// Refresh token failed codec verification.
    InvalidToken(String),
    /// Refresh token fingerprint did not match the stored session record.
    SessionRevoked(String),
    /// Authenticated caller does not own the resource.
    Forbidden(String),
    NotFound(String),
    /// A store/codec dependency did not answer within its deadline. Retryable.
    InfrastructureTimeout(String),
    Database(String),
    Internal(String),
    BadRequest(String),
    Validation(String),
    Conflict(String),
    Configuration(String),
    External(String),
}

#[derive(Serialize, Deserialize)]
struct ErrorResponse {
    code: u16,
    message: String,
    error_type: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Unauthenticated(e) => write!(f, "Unauthenticated: {}", e),
            AppError::InvalidToken(e) => write!(f, "Invalid token: {}", e),
            AppError::SessionRevoked(e) => write!(f, "Session revoked or reused: {}", e),
            AppError::Forbidden(e) => write!(f, "Forbidden: {}", e),
            AppError::NotFound(e) => write!(f, "Not found: {}", e),
            AppError::InfrastructureTimeout(e) => write!(f, "Infrastructure timeout: {}", e),
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::Internal(e) => write!(f, "Internal error: {}", e),
            AppError::BadRequest(e) => write!(f, "Bad request: {}", e),
            AppError::Validation(e) => write!(f, "Validation error: {}", e),
            AppError::Conflict(e) => write!(f, "Conflict: {}", e),
            AppError::Configuration(e) => write!(f, "Configuration error: {}", e),
            AppError::External(e) => write!(f, "External service error: {}", e),
        }
    }
}

impl StdError for AppError {}

impl AppError {
    /// True for the retryable infrastructure kind, false for everything else.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::InfrastructureTimeout(_))
    }

    fn kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::InvalidToken(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::SessionRevoked(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::InfrastructureTimeout(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "infrastructure_timeout")
            }
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::Configuration(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error")
            }
            AppError::External(_) => (StatusCode::BAD_GATEWAY, "external_service_error"),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status_code, error_type) = self.kind();

        // All 401 kinds collapse into one generic body; the precise cause is
        // logged server-side only.
        let message = if status_code == StatusCode::UNAUTHORIZED {
            log::warn!("Authentication failure: {}", self);
            GENERIC_AUTH_MESSAGE.to_string()
        } else {
            self.to_string()
        };

        let error_response = ErrorResponse {
            code: status_code.as_u16(),
            message,
            error_type: error_type.to_string(),
        };

        HttpResponse::build(status_code).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        self.kind().0
    }
}

impl From<SqlxError> for AppError {
    fn from(error: SqlxError) -> Self {
        match error {
            SqlxError::RowNotFound => AppError::NotFound("Record not found".to_string()),
            _ => AppError::Database(error.to_string()),
        }
    }
}

impl From<actix_multipart::MultipartError> for AppError {
    fn from(error: actix_multipart::MultipartError) -> Self {
        AppError::BadRequest(format!("Multipart error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON deserialization/serialization error: {}", error))
    }
}

// Define AppResult type alias for Result<T, AppError>
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_kinds_map_to_401() {
        for err in [
            AppError::Unauthenticated("no token".to_string()),
            AppError::InvalidToken("bad signature".to_string()),
            AppError::SessionRevoked("fingerprint mismatch".to_string()),
        ] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn auth_kinds_share_one_status() {
        let expired = AppError::Unauthenticated("token expired".to_string());
        let reused = AppError::SessionRevoked("stale fingerprint".to_string());

        let body_a = expired.error_response();
        let body_b = reused.error_response();
        assert_eq!(body_a.status(), body_b.status());
    }

    #[test]
    fn timeout_is_the_only_retryable_kind() {
        assert!(AppError::InfrastructureTimeout("store".to_string()).is_retryable());
        assert!(!AppError::SessionRevoked("x".to_string()).is_retryable());
        assert!(!AppError::Database("x".to_string()).is_retryable());
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        let err: AppError = SqlxError::RowNotFound.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
