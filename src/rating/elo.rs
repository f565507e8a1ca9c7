//! Elo update formulas
//!
//! Logistic expected score, the K-factor step function and the single-sided
//! rating update used by the rating store.

/// Expected score of `rating` against `opponent_rating`
pub fn expected_score(rating: f64, opponent_rating: f64, denominator: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent_rating - rating) / denominator))
}

/// K-factor for an entity that has already been compared `comparisons` times
///
/// Advances through `thresholds` while the count has reached them, so K
/// shrinks as an entity accumulates comparisons. `k_factors` must hold
/// `thresholds.len() + 1` entries.
pub fn find_k_factor(comparisons: u32, thresholds: &[u32], k_factors: &[f64]) -> f64 {
    let mut index = 0;
    while index < thresholds.len() && comparisons >= thresholds[index] {
        index += 1;
    }
    k_factors[index]
}

/// New rating after scoring `actual_result` against `opponent_rating`
///
/// `actual_result` is 1 for a win, 0.5 for a draw and 0 for a loss.
pub fn update_rating(
    rating: f64,
    opponent_rating: f64,
    actual_result: f64,
    denominator: f64,
    k_factor: f64,
) -> f64 {
    rating + k_factor * (actual_result - expected_score(rating, opponent_rating, denominator))
}
