use thiserror::Error;

use shared_api::ApiError;
use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Slot conflict: {0}")]
    Conflict(String),

    #[error("This time slot has already passed")]
    SlotElapsed,

    #[error("Schedule entry not found: {0}")]
    NotFound(String),

    #[error("Another request is still in progress")]
    RequestInFlight,

    #[error("Schedule service error: {0}")]
    Api(ApiError),
}

impl ScheduleError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, ScheduleError::Conflict(_))
    }
}

impl From<ApiError> for ScheduleError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Conflict(msg) => ScheduleError::Conflict(msg),
            ApiError::NotFound(msg) => ScheduleError::NotFound(msg),
            ApiError::BadRequest(msg) => ScheduleError::Validation(msg),
            other => ScheduleError::Api(other),
        }
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::Validation(msg) => AppError::Validation(msg),
            ScheduleError::Conflict(msg) => AppError::Conflict(msg),
            ScheduleError::SlotElapsed | ScheduleError::RequestInFlight => {
                AppError::Validation(err.to_string())
            }
            ScheduleError::NotFound(msg) => AppError::NotFound(msg),
            ScheduleError::Api(api) => api.into(),
        }
    }
}
