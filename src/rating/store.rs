//! Rating store: replays a comparison log into per-entity stats
//!
//! Ratings are never persisted. Every call folds the full, ordered log from
//! scratch, so identical inputs always produce identical stats.

use crate::config::rating::EloConfig;
use crate::error::{RankingError, Result};
use crate::rating::elo::{find_k_factor, update_rating};
use crate::types::{Comparison, EntityId, EntityStats, StatsMap};
use std::collections::HashSet;
use tracing::debug;

/// Fold `comparisons`, in the given order, into stats for every entity
///
/// Each comparison updates the first entity and then the second entity
/// against the first entity's already-updated rating. Both comparison counts
/// are bumped after both ratings are computed, so an entity compared with
/// itself gains two comparisons.
pub fn calculate_stats(
    entities: &HashSet<EntityId>,
    comparisons: &[Comparison],
    config: &EloConfig,
) -> Result<StatsMap> {
    config.validate()?;
    fold_comparisons(entities, comparisons, config)
}

fn fold_comparisons(
    entities: &HashSet<EntityId>,
    comparisons: &[Comparison],
    config: &EloConfig,
) -> Result<StatsMap> {
    let mut stats: StatsMap = entities
        .iter()
        .map(|id| {
            (
                id.clone(),
                EntityStats {
                    rating: config.initial_rating,
                    comparisons: 0,
                },
            )
        })
        .collect();

    for comparison in comparisons {
        let a = lookup(&stats, &comparison.entity_a)?;
        let b = lookup(&stats, &comparison.entity_b)?;

        let rating_a = update_rating(
            a.rating,
            b.rating,
            comparison.result,
            config.denominator,
            find_k_factor(a.comparisons, &config.thresholds, &config.k_factors),
        );
        // A self-comparison updates one entry twice, the second time from
        // the first update's result
        let b_rating = if comparison.entity_a == comparison.entity_b {
            rating_a
        } else {
            b.rating
        };
        let rating_b = update_rating(
            b_rating,
            rating_a,
            1.0 - comparison.result,
            config.denominator,
            find_k_factor(b.comparisons, &config.thresholds, &config.k_factors),
        );

        if let Some(entry) = stats.get_mut(&comparison.entity_a) {
            entry.rating = rating_a;
            entry.comparisons += 1;
        }
        if let Some(entry) = stats.get_mut(&comparison.entity_b) {
            entry.rating = rating_b;
            entry.comparisons += 1;
        }
    }

    debug!(
        "Replayed {} comparisons over {} entities",
        comparisons.len(),
        stats.len()
    );

    Ok(stats)
}

fn lookup(stats: &StatsMap, entity_id: &EntityId) -> Result<EntityStats> {
    stats.get(entity_id).copied().ok_or_else(|| {
        RankingError::ReferentialIntegrity {
            entity_id: entity_id.clone(),
        }
        .into()
    })
}

/// Rating store bound to a validated Elo configuration
#[derive(Debug, Clone)]
pub struct RatingStore {
    config: EloConfig,
}

impl RatingStore {
    /// Create a rating store, failing fast on an invalid configuration
    pub fn new(config: EloConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EloConfig {
        &self.config
    }

    /// Replay the full log; see [`calculate_stats`]
    pub fn calculate_stats(
        &self,
        entities: &HashSet<EntityId>,
        comparisons: &[Comparison],
    ) -> Result<StatsMap> {
        fold_comparisons(entities, comparisons, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparisons::id::ComparisonId;
    use proptest::prelude::*;

    fn entities(ids: &[&str]) -> HashSet<EntityId> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn comparison(seq: u64, a: &str, b: &str, result: f64) -> Comparison {
        Comparison::new(ComparisonId::new(1_700_000_000_000, seq), a, b, result).unwrap()
    }

    fn store() -> RatingStore {
        RatingStore::new(EloConfig::default()).unwrap()
    }

    #[test]
    fn test_no_history_keeps_initial_rating() {
        let stats = store()
            .calculate_stats(&entities(&["a", "b", "c"]), &[])
            .unwrap();

        assert_eq!(stats.len(), 3);
        for entry in stats.values() {
            assert_eq!(entry.rating, 1200.0);
            assert_eq!(entry.comparisons, 0);
        }
    }

    #[test]
    fn test_worked_scenario() {
        let stats = store()
            .calculate_stats(&entities(&["A", "B"]), &[comparison(0, "A", "B", 1.0)])
            .unwrap();

        assert_eq!(stats["A"].rating, 1240.0);
        assert_eq!(stats["A"].comparisons, 1);

        let expected_b = 1.0 / (1.0 + 10f64.powf(0.1));
        assert!((expected_b - 0.44272).abs() < 1e-4);
        assert!((stats["B"].rating - (1200.0 - 80.0 * expected_b)).abs() < 1e-9);
        assert!((stats["B"].rating - 1164.58).abs() < 0.01);
        assert_eq!(stats["B"].comparisons, 1);
    }

    #[test]
    fn test_second_entity_uses_updated_rating() {
        let stats = store()
            .calculate_stats(&entities(&["A", "B"]), &[comparison(0, "A", "B", 1.0)])
            .unwrap();

        // Textbook Elo would move B to exactly 1160
        assert!(stats["B"].rating > 1160.0);
    }

    #[test]
    fn test_draw_between_equals() {
        let stats = store()
            .calculate_stats(&entities(&["A", "B"]), &[comparison(0, "A", "B", 0.5)])
            .unwrap();

        assert_eq!(stats["A"].rating, 1200.0);
        assert_eq!(stats["B"].rating, 1200.0);
        assert_eq!(stats["B"].comparisons, 1);
    }

    #[test]
    fn test_k_factor_drops_after_threshold() {
        // A wins four times against fresh opponents, then a fifth time
        let ids = ["A", "B1", "B2", "B3", "B4", "B5"];
        let log: Vec<Comparison> = (1..=5)
            .map(|i| comparison(i as u64, "A", ids[i], 1.0))
            .collect();

        let before = store()
            .calculate_stats(&entities(&ids), &log[..4])
            .unwrap();
        let after = store().calculate_stats(&entities(&ids), &log).unwrap();

        assert_eq!(before["A"].comparisons, 4);
        let gain = after["A"].rating - before["A"].rating;
        let expected = 40.0
            * (1.0 - crate::rating::elo::expected_score(before["A"].rating, 1200.0, 400.0));
        assert!((gain - expected).abs() < 1e-9);
    }

    #[test]
    fn test_self_comparison_updates_twice() {
        let stats = store()
            .calculate_stats(&entities(&["A"]), &[comparison(0, "A", "A", 1.0)])
            .unwrap();

        // 1200 -> 1240 as the winner, then back to 1200 as the loser
        assert_eq!(stats["A"].rating, 1200.0);
        assert_eq!(stats["A"].comparisons, 2);
    }

    #[test]
    fn test_unknown_entity_is_rejected() {
        let err = store()
            .calculate_stats(&entities(&["A"]), &[comparison(0, "A", "ghost", 1.0)])
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<RankingError>(),
            Some(&RankingError::ReferentialIntegrity {
                entity_id: "ghost".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_first_entity_reported_first() {
        let err = store()
            .calculate_stats(&entities(&["A"]), &[comparison(0, "x", "y", 1.0)])
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<RankingError>(),
            Some(&RankingError::ReferentialIntegrity {
                entity_id: "x".to_string()
            })
        );
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = EloConfig {
            k_factors: vec![80.0],
            ..EloConfig::default()
        };
        assert!(RatingStore::new(config.clone()).is_err());
        assert!(calculate_stats(&entities(&["A"]), &[], &config).is_err());
    }

    #[test]
    fn test_independent_comparisons_commute() {
        let ids = entities(&["A", "B", "C", "D"]);
        let forward = vec![comparison(0, "A", "B", 1.0), comparison(1, "C", "D", 0.0)];
        let reversed = vec![forward[1].clone(), forward[0].clone()];

        assert_eq!(
            store().calculate_stats(&ids, &forward).unwrap(),
            store().calculate_stats(&ids, &reversed).unwrap()
        );
    }

    #[test]
    fn test_shared_entity_order_matters() {
        let ids = entities(&["A", "B", "C"]);
        let forward = vec![comparison(0, "A", "B", 1.0), comparison(1, "B", "C", 1.0)];
        let reversed = vec![forward[1].clone(), forward[0].clone()];

        let first = store().calculate_stats(&ids, &forward).unwrap();
        let second = store().calculate_stats(&ids, &reversed).unwrap();

        assert!((first["B"].rating - second["B"].rating).abs() > 1e-6);
        assert_eq!(first["B"].comparisons, second["B"].comparisons);
    }

    fn arb_log() -> impl Strategy<Value = Vec<(usize, usize, u8)>> {
        prop::collection::vec((0usize..5, 0usize..5, 0u8..3), 0..40)
    }

    proptest! {
        #[test]
        fn prop_replay_is_deterministic(log in arb_log()) {
            let ids = ["a", "b", "c", "d", "e"];
            let comparisons: Vec<Comparison> = log
                .iter()
                .enumerate()
                .map(|(i, (a, b, r))| comparison(i as u64, ids[*a], ids[*b], f64::from(*r) / 2.0))
                .collect();

            let first = store().calculate_stats(&entities(&ids), &comparisons).unwrap();
            let second = store().calculate_stats(&entities(&ids), &comparisons).unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_untouched_entities_keep_initial_rating(log in arb_log()) {
            let ids = ["a", "b", "c", "d", "e", "idle"];
            let comparisons: Vec<Comparison> = log
                .iter()
                .enumerate()
                .map(|(i, (a, b, r))| comparison(i as u64, ids[*a], ids[*b], f64::from(*r) / 2.0))
                .collect();

            let stats = store().calculate_stats(&entities(&ids), &comparisons).unwrap();
            prop_assert_eq!(stats["idle"].rating, 1200.0);
            prop_assert_eq!(stats["idle"].comparisons, 0);

            let total: u32 = stats.values().map(|s| s.comparisons).sum();
            prop_assert_eq!(total as usize, comparisons.len() * 2);
        }
    }
}
