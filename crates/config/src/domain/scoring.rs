//! Lead Scoring Configuration
//!
//! Per-intent weights, negative phrase penalties and rank thresholds.

use lead_agent_core::{Intent, RankThresholds};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::ConfigError;

/// A literal phrase that lowers the score every time it appears
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhrasePenalty {
    pub phrase: String,
    /// Amount subtracted from the score (positive number)
    pub penalty: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Score added when an intent differs from the previous one
    #[serde(default = "default_intent_weights")]
    pub intent_weights: HashMap<Intent, i64>,

    /// Checked in order; every matching phrase applies
    #[serde(default = "default_negative_signals")]
    pub negative_signals: Vec<PhrasePenalty>,

    #[serde(default)]
    pub thresholds: RankThresholds,
}

fn default_intent_weights() -> HashMap<Intent, i64> {
    use Intent::*;
    [
        (SiteVisit, 30),
        (CallbackRequest, 25),
        (DocumentRequest, 15),
        (TimelineQuery, 10),
        (PriceQuery, 8),
        (LocationQuery, 8),
        (AmenitiesQuery, 8),
        (PaymentPlan, 8),
        (InventoryQuery, 6),
        (LegalTrust, 6),
        (Vague, 2),
        (Greeting, 1),
    ]
    .into_iter()
    .collect()
}

fn default_negative_signals() -> Vec<PhrasePenalty> {
    [("not interested", 20), ("no need", 20), ("just checking", 8)]
        .into_iter()
        .map(|(phrase, penalty)| PhrasePenalty {
            phrase: phrase.to_string(),
            penalty,
        })
        .collect()
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            intent_weights: default_intent_weights(),
            negative_signals: default_negative_signals(),
            thresholds: RankThresholds::default(),
        }
    }
}

impl ScoringConfig {
    /// Load from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: Self = super::load_yaml(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Weight for an intent, 0 when unlisted
    pub fn weight(&self, intent: Intent) -> i64 {
        self.intent_weights.get(&intent).copied().unwrap_or(0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thresholds.hot <= self.thresholds.warm {
            return Err(ConfigError::InvalidValue {
                field: "scoring.thresholds".to_string(),
                message: format!(
                    "hot ({}) must be greater than warm ({})",
                    self.thresholds.hot, self.thresholds.warm
                ),
            });
        }

        if let Some((intent, weight)) = self.intent_weights.iter().find(|(_, w)| **w < 0) {
            return Err(ConfigError::InvalidValue {
                field: format!("scoring.intent_weights.{}", intent),
                message: format!("Weights must not be negative, got {}", weight),
            });
        }

        for signal in &self.negative_signals {
            if signal.phrase.trim().is_empty() || signal.penalty <= 0 {
                return Err(ConfigError::InvalidValue {
                    field: "scoring.negative_signals".to_string(),
                    message: format!(
                        "Each signal needs a phrase and a positive penalty ({:?})",
                        signal
                    ),
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

    #[test]
    fn test_default_weights() {
        let config = ScoringConfig::default();
        assert_eq!(config.weight(Intent::SiteVisit), 30);
        assert_eq!(config.weight(Intent::CallbackRequest), 25);
        assert_eq!(config.weight(Intent::Greeting), 1);
        assert_eq!(config.weight(Intent::Unknown), 0);
        assert_eq!(config.negative_signals[0].phrase, "not interested");
    }

    #[test]
    fn test_threshold_order_validation() {
        let mut config = ScoringConfig::default();
        config.thresholds.warm = 40;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_positive_penalty_rejected() {
        let mut config = ScoringConfig::default();
        config.negative_signals.push(PhrasePenalty {
            phrase: "maybe later".to_string(),
            penalty: 0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
intent_weights:
  site_visit: 35
  price_query: 5
negative_signals:
  - phrase: "wrong number"
    penalty: 50
thresholds:
  hot: 45
  warm: 20
"#
        )
        .unwrap();

        let config = ScoringConfig::load(file.path()).unwrap();
        assert_eq!(config.weight(Intent::SiteVisit), 35);
        assert_eq!(config.weight(Intent::CallbackRequest), 0);
        assert_eq!(config.negative_signals.len(), 1);
        assert_eq!(config.thresholds.hot, 45);
    }

    #[test]
    fn test_load_missing_file() {
        let result = ScoringConfig::load("/nonexistent/scoring.yaml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }
}
