//! Priority report combining the effort and value rating axes
//!
//! Both axes are normalized over every known issue so they can be
//! subtracted: cheap, valuable issues float to the top. An effort comparison
//! is won by the issue needing less work, so a high effort rating means an
//! easy issue.

use crate::error::{RankingError, Result};
use crate::rating::estimate::EstimateBucketer;
use crate::rating::scaler::{OutputRange, RangeScaler};
use crate::types::{relevant_issues, EntityId, EntityStats, IssueSummary, StatsMap};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Scaled view of one rating axis for an issue
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisScore {
    pub rating: f64,
    pub comparisons: u32,
    pub scaled: f64,
}

/// One line of the priority report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityRow {
    pub id: EntityId,
    pub identifier: String,
    pub title: String,
    pub current_estimate: Option<f64>,
    pub recommended_estimate: f64,
    /// Compared often enough and the current estimate differs from the
    /// recommended one
    pub estimate_out_of_date: bool,
    pub effort: AxisScore,
    pub value: AxisScore,
    /// `value.scaled - effort.scaled`
    pub priority: f64,
}

/// Priority rows for the relevant issues, highest priority first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityReport {
    pub rows: Vec<PriorityRow>,
    /// Rows flagged with `estimate_out_of_date`
    pub out_of_date_estimates: usize,
}

/// Effort comparisons an issue needs before its estimate is checked
pub const DEFAULT_MIN_ESTIMATE_COMPARISONS: u32 = 4;

/// Effort is scaled from 1 for the hardest issue down to 0 for the easiest
pub const EFFORT_OUTPUT: OutputRange = OutputRange::INVERTED_UNIT;

/// Value is scaled from 0 (least value) up to 1 (most value)
pub const VALUE_OUTPUT: OutputRange = OutputRange::UNIT;

/// Build the report over `summaries`
///
/// The scalers are fitted over every summary, whatever its state, and the
/// estimate range spans every entity in `effort_stats`. Only relevant issues
/// get a row. An estimate is out of date once the issue has at least
/// `min_comparisons` effort comparisons and its estimate differs from the
/// recommended one.
pub fn priority_report(
    summaries: &[IssueSummary],
    effort_stats: &StatsMap,
    value_stats: &StatsMap,
    bucketer: &EstimateBucketer,
    min_comparisons: u32,
) -> Result<PriorityReport> {
    if summaries.is_empty() {
        return Ok(PriorityReport::default());
    }

    let effort_scaler = RangeScaler::fit(
        summaries
            .iter()
            .map(|issue| stats_for(effort_stats, &issue.id).map(|s| s.rating))
            .collect::<Result<Vec<f64>>>()?,
        EFFORT_OUTPUT,
    )?;
    let value_scaler = RangeScaler::fit(
        summaries
            .iter()
            .map(|issue| stats_for(value_stats, &issue.id).map(|s| s.rating))
            .collect::<Result<Vec<f64>>>()?,
        VALUE_OUTPUT,
    )?;
    let estimate_range = RangeScaler::fit(
        effort_stats.values().map(|s| s.rating),
        OutputRange::UNIT,
    )?;

    let mut rows: Vec<PriorityRow> = relevant_issues(summaries)
        .into_iter()
        .map(|issue| -> Result<PriorityRow> {
            let effort = stats_for(effort_stats, &issue.id)?;
            let value = stats_for(value_stats, &issue.id)?;

            let effort = AxisScore {
                rating: effort.rating,
                comparisons: effort.comparisons,
                scaled: effort_scaler.scale(effort.rating),
            };
            let value = AxisScore {
                rating: value.rating,
                comparisons: value.comparisons,
                scaled: value_scaler.scale(value.rating),
            };
            let recommended_estimate = bucketer.bucket(
                effort.rating,
                estimate_range.min_rating(),
                estimate_range.max_rating(),
            );

            Ok(PriorityRow {
                id: issue.id.clone(),
                identifier: issue.identifier.clone(),
                title: issue.title.clone(),
                current_estimate: issue.estimate,
                recommended_estimate,
                estimate_out_of_date: effort.comparisons >= min_comparisons
                    && issue.estimate != Some(recommended_estimate),
                priority: value.scaled - effort.scaled,
                effort,
                value,
            })
        })
        .collect::<Result<_>>()?;

    rows.sort_by(|a, b| {
        b.priority
            .partial_cmp(&a.priority)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    let out_of_date_estimates = rows.iter().filter(|row| row.estimate_out_of_date).count();

    Ok(PriorityReport {
        rows,
        out_of_date_estimates,
    })
}

fn stats_for(stats: &StatsMap, id: &EntityId) -> Result<EntityStats> {
    stats.get(id).copied().ok_or_else(|| {
        RankingError::ReferentialIntegrity {
            entity_id: id.clone(),
        }
        .into()
    })
}
