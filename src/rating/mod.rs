//! Elo rating engine for pairwise comparisons
//!
//! This module provides the Elo formulas, the rating store that replays a
//! comparison log, and the helpers that turn ratings into display values.

pub mod elo;
pub mod estimate;
pub mod scaler;
pub mod store;

// Re-export commonly used types
pub use estimate::{EstimateBucketer, DEFAULT_ESTIMATE_SCALE};
pub use scaler::{OutputRange, RangeScaler};
pub use store::{calculate_stats, RatingStore};
