//! Infrastructure layer - external adapters (HTTP, session storage,
//! clipboard, config files).
//!
//! This layer handles all I/O operations and external dependencies.

pub mod clipboard;
pub mod config;
pub mod local_storage;
pub mod session_backend;
pub mod shortener_api;

#[cfg(test)]
pub mod testing;

pub use clipboard::{Clipboard, MemoryClipboard, Osc52Clipboard};
pub use config::{
    config_file_path, ensure_config_exists, load_config, load_config_from_file, save_config,
};
pub use local_storage::LocalStorage;
pub use session_backend::{MemoryBackend, SessionBackend};
pub use shortener_api::{HttpShortenerApi, ShortenerApi};

#[cfg(test)]
pub use shortener_api::MockShortenerApi;
