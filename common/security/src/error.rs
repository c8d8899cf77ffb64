use common_auth::AuthError;
use common_http_errors::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("authorization header missing")]     MissingAuthorization,
    #[error("unauthorized - missing required role")]    Forbidden,
    #[error("invalid authorization token: {0}")]  InvalidToken(String),
    #[error("internal security error: {0}")]      Internal(String),
}

impl From<AuthError> for SecurityError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingAuthorization => SecurityError::MissingAuthorization,
            other if other.is_client_error() => SecurityError::InvalidToken(other.to_string()),
            other => SecurityError::Internal(other.to_string()),
        }
    }
}

impl From<SecurityError> for ApiError {
    fn from(e: SecurityError) -> Self {
        match e {
            SecurityError::MissingAuthorization => ApiError::MissingAuthHeader,
            SecurityError::Forbidden => ApiError::unauthorized(),
            SecurityError::InvalidToken(_) => ApiError::Unauthorized { message: Some(e.to_string()) },
            SecurityError::Internal(_) => ApiError::internal(e),
        }
    }
}
