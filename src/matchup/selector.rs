//! Matchup selection for the next comparison group
//!
//! The anchor is drawn with a strong bias toward the least-compared
//! candidates; the rest of the group is drawn with a milder bias toward
//! candidates whose rating sits closest to the anchor's, since close
//! matchups carry the most information.

use crate::error::{RankingError, Result};
use crate::matchup::pick::weighted_random_pick;
use crate::types::{EntityId, EntityStats, StatsMap};
use crate::utils::rating_difference;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// Configuration for matchup selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchupConfig {
    /// Exponent pulling the anchor toward the least-compared candidates
    pub anchor_bias_weight: f64,
    /// Exponent pulling the other members toward the anchor's rating
    pub proximity_bias_weight: f64,
    /// Number of entities in a group, anchor included
    pub group_size: usize,
}

impl Default for MatchupConfig {
    fn default() -> Self {
        Self {
            anchor_bias_weight: 8.0,
            proximity_bias_weight: 2.0,
            group_size: 5,
        }
    }
}

impl MatchupConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.group_size < 1 {
            return Err(RankingError::configuration("Group size must be at least 1").into());
        }

        for (name, weight) in [
            ("Anchor bias weight", self.anchor_bias_weight),
            ("Proximity bias weight", self.proximity_bias_weight),
        ] {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(RankingError::configuration(format!("{} must be positive", name)).into());
            }
        }

        Ok(())
    }
}

/// Builds comparison groups from current stats
#[derive(Debug, Clone)]
pub struct MatchupSelector {
    config: MatchupConfig,
}

impl MatchupSelector {
    pub fn new(config: MatchupConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MatchupConfig {
        &self.config
    }

    /// Draw a fresh group from `candidate_ids`, anchor first
    ///
    /// Returns fewer than `group_size` ids when there are not enough
    /// candidates, and an empty group for an empty candidate list.
    pub fn select_matchup(
        &self,
        candidate_ids: &[EntityId],
        stats: &StatsMap,
        rng: &mut impl Rng,
    ) -> Result<Vec<EntityId>> {
        let mut by_comparisons: Vec<(&EntityId, EntityStats)> = candidate_ids
            .iter()
            .map(|id| -> Result<(&EntityId, EntityStats)> { Ok((id, stats_for(stats, id)?)) })
            .collect::<Result<_>>()?;
        by_comparisons.sort_by_key(|(_, entry)| entry.comparisons);

        let ordered: Vec<&EntityId> = by_comparisons.into_iter().map(|(id, _)| id).collect();
        let anchor = match weighted_random_pick(&ordered, self.config.anchor_bias_weight, rng) {
            Some(anchor) => (*anchor).clone(),
            None => return Ok(Vec::new()),
        };

        self.complete_matchup(anchor, candidate_ids, stats, rng)
    }

    /// Fill a group around a caller-chosen anchor
    pub fn complete_matchup(
        &self,
        anchor: EntityId,
        candidate_ids: &[EntityId],
        stats: &StatsMap,
        rng: &mut impl Rng,
    ) -> Result<Vec<EntityId>> {
        let anchor_rating = stats_for(stats, &anchor)?.rating;
        let mut group = vec![anchor];

        while group.len() < self.config.group_size {
            let mut remaining: Vec<(&EntityId, f64)> = candidate_ids
                .iter()
                .filter(|id| !group.contains(id))
                .map(|id| -> Result<(&EntityId, f64)> {
                    let rating = stats_for(stats, id)?.rating;
                    Ok((id, rating_difference(anchor_rating, rating)))
                })
                .collect::<Result<_>>()?;

            if remaining.is_empty() {
                break;
            }

            remaining.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

            match weighted_random_pick(&remaining, self.config.proximity_bias_weight, rng) {
                Some((id, _)) => group.push((*id).clone()),
                None => break,
            }
        }

        debug!(
            "Selected matchup of {} entities anchored on '{}'",
            group.len(),
            group[0]
        );

        Ok(group)
    }
}

impl Default for MatchupSelector {
    fn default() -> Self {
        Self {
            config: MatchupConfig::default(),
        }
    }
}

fn stats_for(stats: &StatsMap, id: &EntityId) -> Result<EntityStats> {
    stats.get(id).copied().ok_or_else(|| {
        RankingError::ReferentialIntegrity {
            entity_id: id.clone(),
        }
        .into()
    })
}
