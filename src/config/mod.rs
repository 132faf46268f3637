//! Configuration management for vetbox.
//!
//! This module handles loading and saving configuration from `~/.vetbox/`.

mod paths;
mod settings;

pub use paths::Paths;
pub use settings::{
    Config, GeneralConfig, OutboxConfig, RetryConfig, ServerConfig, DEFAULT_STORAGE_KEY,
    DEFAULT_TIMEOUT_MS,
};
