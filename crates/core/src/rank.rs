//! Lead rank tiers derived from score

use serde::{Deserialize, Serialize};

/// Coarse lead quality. Ordering is `Cold < Warm < Hot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Cold,
    Warm,
    Hot,
}

/// Inclusive lower bounds for each tier above cold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankThresholds {
    #[serde(default = "default_hot")]
    pub hot: i64,
    #[serde(default = "default_warm")]
    pub warm: i64,
}

fn default_hot() -> i64 {
    40
}

fn default_warm() -> i64 {
    15
}

impl Default for RankThresholds {
    fn default() -> Self {
        Self {
            hot: default_hot(),
            warm: default_warm(),
        }
    }
}

impl Rank {
    /// Evaluated high to low; scores may be negative.
    pub fn from_score(score: i64, thresholds: &RankThresholds) -> Self {
        if score >= thresholds.hot {
            Rank::Hot
        } else if score >= thresholds.warm {
            Rank::Warm
        } else {
            Rank::Cold
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Cold => "cold",
            Rank::Warm => "warm",
            Rank::Hot => "hot",
        }
    }

    /// Parse rank labels written by older records ("HOT", "Warm", ...)
    pub fn parse_label(value: &str) -> Option<Rank> {
        match value.trim().to_lowercase().as_str() {
            "cold" => Some(Rank::Cold),
            "warm" => Some(Rank::Warm),
            "hot" => Some(Rank::Hot),
            _ => None,
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
