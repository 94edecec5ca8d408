pub mod error;
pub mod models;
pub mod services;

pub use error::BlogError;
pub use models::*;
pub use services::BlogService;
