use lead_agent_persistence::PersistenceError;
use thiserror::Error;

/// Errors surfaced by the conversation engine
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("State store error: {0}")]
    Store(String),

    #[error("Initialization error: {0}")]
    Initialization(String),
}

impl From<lead_agent_core::Error> for AgentError {
    fn from(err: lead_agent_core::Error) -> Self {
        match err {
            lead_agent_core::Error::Config(msg) => AgentError::Initialization(msg),
            other => AgentError::Store(other.to_string()),
        }
    }
}

impl From<PersistenceError> for AgentError {
    fn from(err: PersistenceError) -> Self {
        AgentError::Store(err.to_string())
    }
}

impl From<lead_agent_config::ConfigError> for AgentError {
    fn from(err: lead_agent_config::ConfigError) -> Self {
        AgentError::Initialization(err.to_string())
    }
}
