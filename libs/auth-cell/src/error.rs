use thiserror::Error;

use shared_api::ApiError;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Account already exists: {0}")]
    AlreadyRegistered(String),

    #[error("Unexpected auth response: {0}")]
    InvalidResponse(String),

    #[error("Auth service error: {0}")]
    Api(ApiError),
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized(msg) => AuthError::InvalidCredentials(msg),
            ApiError::Conflict(msg) => AuthError::AlreadyRegistered(msg),
            ApiError::BadRequest(msg) => AuthError::Validation(msg),
            other => AuthError::Api(other),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => AppError::Validation(msg),
            AuthError::InvalidCredentials(msg) => AppError::Auth(msg),
            AuthError::AlreadyRegistered(msg) => AppError::Conflict(msg),
            AuthError::InvalidResponse(msg) => AppError::Internal(msg),
            AuthError::Api(api) => api.into(),
        }
    }
}
