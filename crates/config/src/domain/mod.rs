//! Domain configuration
//!
//! Business tables that shape the conversation: scoring rules, reply
//! templates and the project catalog. Each section has built-in defaults
//! and can be overridden from YAML.

mod projects;
mod scoring;
mod templates;

pub use projects::ProjectCatalog;
pub use scoring::{PhrasePenalty, ScoringConfig};
pub use templates::{TemplateEntry, TemplatePool, TemplatesConfig};

use std::path::Path;

use crate::ConfigError;

/// Read and parse a standalone YAML file
pub(crate) fn load_yaml<T, P>(path: P) -> Result<T, ConfigError>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::FileNotFound(format!("{}: {}", path.display(), e)))?;

    serde_yaml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
}
