//! Reducing a submitted ordering to pairwise comparisons

use crate::error::{RankingError, Result};
use crate::types::{EntityId, PendingComparison};
use std::collections::HashSet;

/// Expand a best-first ordering into every implied pairwise win
///
/// For `[x0, x1, .., xn]` each `xi` beats every `xj` with `j > i`, giving
/// `n * (n - 1) / 2` comparisons ordered by the winner's position.
pub fn comparisons_from_ordering(order: &[EntityId]) -> Result<Vec<PendingComparison>> {
    let mut seen = HashSet::with_capacity(order.len());
    for id in order {
        if id.is_empty() {
            return Err(RankingError::invalid_comparison("ordering contains an empty id").into());
        }
        if !seen.insert(id) {
            return Err(RankingError::invalid_comparison(format!(
                "'{}' appears more than once in the ordering",
                id
            ))
            .into());
        }
    }

    let mut comparisons = Vec::with_capacity(order.len() * order.len().saturating_sub(1) / 2);
    for (i, winner) in order.iter().enumerate() {
        for loser in &order[i + 1..] {
            comparisons.push(PendingComparison {
                entity_a: winner.clone(),
                entity_b: loser.clone(),
                result: 1.0,
            });
        }
    }

    Ok(comparisons)
}
