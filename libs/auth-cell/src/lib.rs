pub mod error;
pub mod models;
pub mod services;

pub use error::AuthError;
pub use models::*;
pub use services::AuthService;
