//! Linear scaling of a rating range onto a target interval

use crate::error::{RankingError, Result};
use serde::{Deserialize, Serialize};

/// Target interval for a scaler, given as the outputs at the range ends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputRange {
    /// Output for the lowest observed rating
    pub at_min: f64,
    /// Output for the highest observed rating
    pub at_max: f64,
}

impl OutputRange {
    pub const UNIT: OutputRange = OutputRange {
        at_min: 0.0,
        at_max: 1.0,
    };

    pub const INVERTED_UNIT: OutputRange = OutputRange {
        at_min: 1.0,
        at_max: 0.0,
    };

    pub fn midpoint(&self) -> f64 {
        (self.at_min + self.at_max) / 2.0
    }
}

/// Maps the observed `[min, max]` rating range linearly onto an output range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeScaler {
    min_rating: f64,
    max_rating: f64,
    output: OutputRange,
}

impl RangeScaler {
    /// Fit a scaler over every rating in `ratings`
    pub fn fit(ratings: impl IntoIterator<Item = f64>, output: OutputRange) -> Result<Self> {
        let (min_rating, max_rating) = ratings
            .into_iter()
            .fold(None, |bounds: Option<(f64, f64)>, rating| match bounds {
                None => Some((rating, rating)),
                Some((min, max)) => Some((min.min(rating), max.max(rating))),
            })
            .ok_or_else(|| RankingError::configuration("Cannot fit a scaler over no ratings"))?;

        Ok(Self::new(min_rating, max_rating, output))
    }

    pub fn new(min_rating: f64, max_rating: f64, output: OutputRange) -> Self {
        Self {
            min_rating,
            max_rating,
            output,
        }
    }

    pub fn min_rating(&self) -> f64 {
        self.min_rating
    }

    pub fn max_rating(&self) -> f64 {
        self.max_rating
    }

    /// Scale a rating; a flat range maps everything to the output midpoint
    pub fn scale(&self, rating: f64) -> f64 {
        let span = self.max_rating - self.min_rating;
        if span == 0.0 {
            return self.output.midpoint();
        }

        let t = (rating - self.min_rating) / span;
        self.output.at_min + t * (self.output.at_max - self.output.at_min)
    }
}
