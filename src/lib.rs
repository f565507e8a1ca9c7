//! Pairwise Ranker - Elo ratings from pairwise issue comparisons
//!
//! This crate replays a log of pairwise comparisons into Elo ratings, picks
//! informative groups to compare next, and turns effort and value ratings
//! into a priority report with recommended estimates.

pub mod comparisons;
pub mod config;
pub mod error;
pub mod matchup;
pub mod metrics;
pub mod rating;
pub mod report;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{RankingError, Result};
pub use types::*;

// Re-export key components
pub use comparisons::{ComparisonRepository, InMemoryComparisonRepository, JsonFileComparisonRepository};
pub use matchup::MatchupSelector;
pub use rating::{EstimateBucketer, RangeScaler, RatingStore};
pub use service::RankingService;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
