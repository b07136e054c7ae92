//! RuneMate configuration
//!
//! User-level settings (submission credential and endpoint) stored as TOML,
//! and the staging layout shared by every pipeline stage.

pub mod config;
pub mod layout;

use std::path::PathBuf;
use thiserror::Error;

pub use config::Config;
pub use layout::BuildLayout;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Unknown config key: {0}. Supported keys: submission-key, submission-url")]
    UnknownKey(String),
}
