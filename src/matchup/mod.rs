//! Choosing what to compare next
//!
//! This module provides the biased random pick, the matchup selector that
//! builds comparison groups, and the reduction of a submitted ordering back
//! into pairwise comparisons.

pub mod ordering;
pub mod pick;
pub mod selector;

// Re-export commonly used types
pub use ordering::comparisons_from_ordering;
pub use pick::{biased_index, weighted_random_pick};
pub use selector::{MatchupConfig, MatchupSelector};
