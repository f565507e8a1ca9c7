//! Service layer for the pairwise ranker
//!
//! This module contains the ranking service that coordinates the comparison
//! repository, the rating engine, matchup selection and metrics.

pub mod ranking;

pub use ranking::RankingService;
