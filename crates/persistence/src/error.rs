//! Persistence errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unreadable record for {phone}: {message}")]
    Migration { phone: String, message: String },
}

impl From<PersistenceError> for lead_agent_core::Error {
    fn from(err: PersistenceError) -> Self {
        lead_agent_core::Error::Store(err.to_string())
    }
}
