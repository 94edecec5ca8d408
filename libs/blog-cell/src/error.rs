use thiserror::Error;

use shared_api::ApiError;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum BlogError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Blog post not found: {0}")]
    NotFound(String),

    #[error("Unexpected blog response: {0}")]
    InvalidResponse(String),

    #[error("Blog service error: {0}")]
    Api(ApiError),
}

impl From<ApiError> for BlogError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound(msg) => BlogError::NotFound(msg),
            ApiError::BadRequest(msg) => BlogError::Validation(msg),
            ApiError::Unauthorized(msg) => BlogError::Forbidden(msg),
            other => BlogError::Api(other),
        }
    }
}

impl From<BlogError> for AppError {
    fn from(err: BlogError) -> Self {
        match err {
            BlogError::Validation(msg) => AppError::Validation(msg),
            BlogError::Forbidden(msg) => AppError::Auth(msg),
            BlogError::NotFound(msg) => AppError::NotFound(msg),
            BlogError::InvalidResponse(msg) => AppError::Internal(msg),
            BlogError::Api(api) => api.into(),
        }
    }
}
