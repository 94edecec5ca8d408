use thiserror::Error;

use shared_api::ApiError;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("Doctor not found: {0}")]
    NotFound(String),

    #[error("Unexpected doctor response: {0}")]
    InvalidResponse(String),

    #[error("Doctor service error: {0}")]
    Api(ApiError),
}

impl From<ApiError> for DoctorError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound(msg) => DoctorError::NotFound(msg),
            other => DoctorError::Api(other),
        }
    }
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound(msg) => AppError::NotFound(msg),
            DoctorError::InvalidResponse(msg) => AppError::Internal(msg),
            DoctorError::Api(api) => api.into(),
        }
    }
}
