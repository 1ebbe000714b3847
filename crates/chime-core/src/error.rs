//! Unified error types for Chime.

use thiserror::Error;

/// Result type alias using ChimeError.
pub type Result<T> = std::result::Result<T, ChimeError>;

#[derive(Error, Debug)]
pub enum ChimeError {
    // Collaborator errors
    #[error("Store error: {0}")]
    Store(String),

    #[error("Wake-up service error: {0}")]
    Wakeup(String),

    // Payload errors
    #[error("Invalid wake-up payload: {0}")]
    InvalidPayload(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ChimeError {
    pub fn wakeup(msg: impl Into<String>) -> Self {
        Self::Wakeup(msg.into())
    }

    pub fn payload(msg: impl Into<String>) -> Self {
        Self::InvalidPayload(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
