//! Rating system configuration

use crate::error::{RankingError, Result};
use serde::{Deserialize, Serialize};

/// Elo parameters supplied by the caller
///
/// `k_factors` holds one more entry than `thresholds`: an entity with fewer
/// comparisons than `thresholds[i]` uses `k_factors[i]`, and once it passes
/// every threshold it uses the last K-factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EloConfig {
    /// Rating every entity starts from
    pub initial_rating: f64,
    /// Logistic scale; 400 is the classic chess value
    pub denominator: f64,
    /// Comparison counts at which the K-factor steps down
    pub thresholds: Vec<u32>,
    /// Maximum rating change per comparison for each threshold band
    pub k_factors: Vec<f64>,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            initial_rating: 1200.0,
            denominator: 400.0,
            thresholds: vec![4, 8],
            k_factors: vec![80.0, 40.0, 20.0],
        }
    }
}

impl EloConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.k_factors.len() != self.thresholds.len() + 1 {
            return Err(RankingError::configuration(format!(
                "Expected {} K-factors for {} thresholds, got {}",
                self.thresholds.len() + 1,
                self.thresholds.len(),
                self.k_factors.len()
            ))
            .into());
        }

        if !self.initial_rating.is_finite() {
            return Err(RankingError::configuration("Initial rating must be finite").into());
        }

        if !self.denominator.is_finite() || self.denominator <= 0.0 {
            return Err(RankingError::configuration("Denominator must be positive").into());
        }

        if self.k_factors.iter().any(|k| !k.is_finite()) {
            return Err(RankingError::configuration("K-factors must be finite").into());
        }

        Ok(())
    }
}
