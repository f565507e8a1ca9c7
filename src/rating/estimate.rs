//! Quantizing ratings into a discrete estimate scale

use crate::error::{RankingError, Result};

/// Fibonacci-style story point scale
pub const DEFAULT_ESTIMATE_SCALE: [f64; 6] = [1.0, 2.0, 3.0, 5.0, 8.0, 13.0];

/// Buckets ratings into one of an ordered set of estimate values
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateBucketer {
    values: Vec<f64>,
}

impl EstimateBucketer {
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(RankingError::configuration("Estimate scale must not be empty").into());
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Estimate for `rating` given the observed rating range
    ///
    /// The range is split into equal steps, walking down from the last value
    /// while the rating sits above `max_rating - step * index`. When every
    /// rating is equal the step is zero and the last value is returned.
    pub fn bucket(&self, rating: f64, min_rating: f64, max_rating: f64) -> f64 {
        let step = (max_rating - min_rating) / self.values.len() as f64;
        let mut index = self.values.len() - 1;
        while index > 0 && rating > max_rating - step * index as f64 {
            index -= 1;
        }
        self.values[index]
    }
}

impl Default for EstimateBucketer {
    fn default() -> Self {
        Self {
            values: DEFAULT_ESTIMATE_SCALE.to_vec(),
        }
    }
}
