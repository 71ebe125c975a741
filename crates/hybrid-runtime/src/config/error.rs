//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

/// Why a configuration could not be loaded or was rejected.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("config file {0} does not exist")]
    FileNotFound(PathBuf),

    /// The file extension has no enabled format feature.
    #[error("unsupported config format '.{0}' (enable the matching *-config feature)")]
    UnsupportedFormat(String),

    /// A source could not be parsed or does not fit [`HybridConfig`](super::HybridConfig).
    #[error(transparent)]
    Extract(#[from] figment::Error),

    #[error("invalid config: {message}")]
    Validation { message: String },

    /// `forwarder.agent_url` is not an absolute http(s) URL.
    #[error("invalid agent URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid server port {0}")]
    InvalidPort(u16),
}

impl ConfigError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
