//! Utility functions for the ranking engine

use crate::types::{Comparison, EntityId, GroupId, IssueSummary};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use uuid::Uuid;

/// Generate a new unique comparison group ID
pub fn generate_group_id() -> GroupId {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Calculate the absolute difference between two ratings
pub fn rating_difference(rating1: f64, rating2: f64) -> f64 {
    (rating1 - rating2).abs()
}

/// Every entity id known from the summaries or referenced by the log
///
/// Issues deleted upstream still appear in old comparisons; including them
/// keeps a replay of the historical log valid.
pub fn entity_universe(summaries: &[IssueSummary], comparisons: &[Comparison]) -> HashSet<EntityId> {
    summaries
        .iter()
        .map(|issue| issue.id.clone())
        .chain(
            comparisons
                .iter()
                .flat_map(|c| [c.entity_a.clone(), c.entity_b.clone()]),
        )
        .collect()
}
