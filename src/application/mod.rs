//! Application layer - session tracking, request orchestration and
//! transient UI state.
//!
//! This layer decides which remote call runs for a user action and how its
//! outcome shows up in the UI.

pub mod client;
pub mod formatter;
pub mod operation;
pub mod orchestrator;
pub mod session_store;
pub mod transient;

pub use client::ShortenerClient;
pub use formatter::{
    format_failure, format_history_json, format_history_table, format_link, format_status,
    OutputFormat,
};
pub use operation::{Completion, OperationSlot, Ticket};
pub use orchestrator::RequestOrchestrator;
pub use session_store::{
    ExternalChanges, ExternalWatch, SessionBus, SessionStore, Subscription, DEFAULT_EXTERNAL_POLL,
};
pub use transient::{TransientController, TransientView, DEFAULT_COPY_FEEDBACK};
