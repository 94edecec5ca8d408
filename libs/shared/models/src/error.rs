use thiserror::Error;

/// How an error is presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Blocked client-side before anything was submitted.
    Validation,
    /// The backend (or the local pre-check) refused because the resource is taken.
    Conflict,
    /// Network or server failure; shown generically.
    Transport,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Auth(_)
            | AppError::NotFound(_)
            | AppError::Transport(_)
            | AppError::Internal(_) => ErrorKind::Transport,
        }
    }

    /// Message suitable for direct display. Validation and conflict messages are
    /// shown verbatim, everything else collapses to a generic notice.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::Auth(_) => "Your session is not valid. Please log in again.".to_string(),
            AppError::NotFound(_) => "The requested item no longer exists.".to_string(),
            AppError::Transport(_) | AppError::Internal(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }

    pub fn log(&self) {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::Conflict => tracing::warn!("{}", self),
            ErrorKind::Transport => tracing::error!("{}", self),
        }
    }
}
