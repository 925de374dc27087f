//! Error types shared across crates

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Handoff sink error: {0}")]
    Handoff(String),

    #[error("Timed out after {0}ms")]
    Timeout(u64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Timeout(_) | Error::Delivery(_) | Error::Generation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
