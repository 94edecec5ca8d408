pub mod auth;
pub mod error;

pub use auth::{Role, Session, User};
pub use error::{AppError, ErrorKind};
