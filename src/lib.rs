//! Shortlink Client - session-aware URL shortening workflow.
//!
//! Tracks the login session across execution contexts, routes each action to
//! the guest or account API, and keeps short-lived UI state (copy
//! confirmation, slug editor) consistent with the latest results.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{
    Completion, RequestOrchestrator, SessionBus, SessionStore, ShortenerClient, TransientController,
};
pub use domain::{AppError, OperationState, Result, Session, ShortenedLink, User};
