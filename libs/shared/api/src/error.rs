use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication error: {0}")]
    Unauthorized(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("API error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => ApiError::Unauthorized(message),
            404 => ApiError::NotFound(message),
            409 => ApiError::Conflict(message),
            400 | 422 => ApiError::BadRequest(message),
            _ => ApiError::Server { status, message },
        }
    }
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized(msg) => AppError::Auth(msg),
            ApiError::NotFound(msg) => AppError::NotFound(msg),
            ApiError::Conflict(msg) => AppError::Conflict(msg),
            ApiError::BadRequest(msg) => AppError::Validation(msg),
            ApiError::InvalidHeader(msg) => AppError::Internal(msg),
            other => AppError::Transport(other.to_string()),
        }
    }
}
