//! Domain layer - core types, errors and local validation.
//!
//! This layer contains pure domain models and error types
//! without any I/O.

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

pub use config::{ApiConfig, AppConfig, PathConfig, UiConfig};
pub use error::{AppError, ErrorInfo, ErrorKind, Result, LOGIN_REQUIRED_MESSAGE};
pub use models::{
    greeting_name, sort_by_creation, OperationKind, OperationState, Session, ShortenedLink, User,
};
pub use validation::{require_field, validate_password, validate_url};
