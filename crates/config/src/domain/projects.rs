//! Project catalog

use lead_agent_core::ProjectContext;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

/// Projects the agent can talk about, loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectCatalog {
    /// Project assigned to new conversations
    #[serde(default)]
    pub default_project: Option<String>,

    #[serde(default)]
    pub projects: Vec<ProjectContext>,
}

impl ProjectCatalog {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let catalog: Self = super::load_yaml(path)?;
        catalog.validate()?;
        tracing::info!(projects = catalog.projects.len(), "Loaded project catalog");
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&ProjectContext> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Project for new conversations: the configured default, or the only
    /// project when the catalog holds exactly one
    pub fn default_project(&self) -> Option<&ProjectContext> {
        match &self.default_project {
            Some(id) => self.get(id),
            None if self.projects.len() == 1 => self.projects.first(),
            None => None,
        }
    }

    /// First project named in the lowercased text
    pub fn find_mentioned(&self, lowered: &str) -> Option<&ProjectContext> {
        self.projects.iter().find(|p| p.is_mentioned_in(lowered))
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, project) in self.projects.iter().enumerate() {
            if project.id.trim().is_empty() || project.name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("projects[{}]", i),
                    message: "Project needs an id and a name".to_string(),
                });
            }
            if self.projects[..i].iter().any(|p| p.id == project.id) {
                return Err(ConfigError::InvalidValue {
                    field: format!("projects[{}].id", i),
                    message: format!("Duplicate project id '{}'", project.id),
                });
            }
        }

        if let Some(id) = &self.default_project {
            if self.get(id).is_none() {
                return Err(ConfigError::InvalidValue {
                    field: "default_project".to_string(),
                    message: format!("Unknown project id '{}'", id),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r#"
default_project: skyline
projects:
  - id: skyline
    name: Skyline Residency
    location: Baner, Pune
    price_range: "₹85L - ₹1.4Cr"
    unit_types: [2BHK, 3BHK]
    status: Under construction
    amenities: [Clubhouse, Pool]
  - id: green-valley
    name: Green Valley Plots
    location: Talegaon
    aliases: [green valley]
"#;

    #[test]
    fn test_load_catalog() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", CATALOG).unwrap();

        let catalog = ProjectCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.projects.len(), 2);
        assert_eq!(catalog.default_project().unwrap().id, "skyline");
        assert_eq!(
            catalog.find_mentioned("what about green valley?").unwrap().id,
            "green-valley"
        );
    }

    #[test]
    fn test_unknown_default_rejected() {
        let catalog = ProjectCatalog {
            default_project: Some("missing".to_string()),
            projects: vec![],
        };
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_single_project_is_default() {
        let catalog = ProjectCatalog {
            default_project: None,
            projects: vec![ProjectContext {
                id: "only".to_string(),
                name: "Only Towers".to_string(),
                ..Default::default()
            }],
        };
        assert_eq!(catalog.default_project().unwrap().id, "only");
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let project = ProjectContext {
            id: "dup".to_string(),
            name: "Dup".to_string(),
            ..Default::default()
        };
        let catalog = ProjectCatalog {
            default_project: None,
            projects: vec![project.clone(), project],
        };
        assert!(catalog.validate().is_err());
    }
}
