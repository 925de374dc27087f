//! Configuration management for the lead agent
//!
//! Supports loading configuration from:
//! - YAML files (`config/default.yaml`, `config/{env}.yaml`)
//! - Environment variables (`LEAD_AGENT__` prefix, `__` separator)
//!
//! # Domain Configuration
//!
//! Business tables live in the `domain` module and may also be loaded from
//! standalone YAML files:
//! - scoring weights, penalties and rank thresholds
//! - reply template pools
//! - the project catalog

pub mod constants;
pub mod domain;
pub mod settings;

pub use domain::{
    PhrasePenalty, ProjectCatalog, ScoringConfig, TemplateEntry, TemplatePool, TemplatesConfig,
};
pub use settings::{
    load_settings, ConversationConfig, HandoffConfig, HandoffSinkKind, LlmSettings,
    ObservabilityConfig, PostHandoffPolicy, RuntimeEnvironment, ServerConfig, Settings,
    WhatsAppConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for lead_agent_core::Error {
    fn from(err: ConfigError) -> Self {
        lead_agent_core::Error::Config(err.to_string())
    }
}
