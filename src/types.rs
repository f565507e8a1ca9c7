//! Common types used throughout the ranking engine

use crate::comparisons::id::ComparisonId;
use crate::error::{RankingError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for a ranked work item
pub type EntityId = String;

/// Unique identifier for a pending comparison group
pub type GroupId = Uuid;

/// Derived rating state for an entity, recomputed from the log on every call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityStats {
    pub rating: f64,
    pub comparisons: u32,
}

/// Per-entity stats produced by a full replay of a comparison log
pub type StatsMap = HashMap<EntityId, EntityStats>;

/// Rating axis a comparison log belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonProperty {
    Effort,
    Value,
}

impl ComparisonProperty {
    pub const ALL: [ComparisonProperty; 2] = [ComparisonProperty::Effort, ComparisonProperty::Value];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonProperty::Effort => "effort",
            ComparisonProperty::Value => "value",
        }
    }
}

impl std::fmt::Display for ComparisonProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComparisonProperty {
    type Err = RankingError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "effort" => Ok(ComparisonProperty::Effort),
            "value" => Ok(ComparisonProperty::Value),
            other => Err(RankingError::configuration(format!(
                "Unknown comparison property: {}",
                other
            ))),
        }
    }
}

/// Workflow state of an issue as reported by the issue tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Triage,
    Backlog,
    Unstarted,
    Started,
    Completed,
    Canceled,
}

impl IssueState {
    /// Whether issues in this state are still worth comparing
    pub fn is_relevant(&self) -> bool {
        matches!(
            self,
            IssueState::Triage | IssueState::Backlog | IssueState::Unstarted
        )
    }
}

/// Issue summary supplied by the issue tracker; only `id` feeds the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub id: EntityId,
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub title: String,
    pub state: IssueState,
    #[serde(default)]
    pub estimate: Option<f64>,
}

/// Keep only the summaries still open for comparison
pub fn relevant_issues(summaries: &[IssueSummary]) -> Vec<&IssueSummary> {
    summaries
        .iter()
        .filter(|issue| issue.state.is_relevant())
        .collect()
}

/// Check that a result is one of the three allowed outcomes
pub fn is_valid_result(result: f64) -> bool {
    result == 0.0 || result == 0.5 || result == 1.0
}

/// A comparison outcome before the log assigns it an id and date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingComparison {
    pub entity_a: EntityId,
    pub entity_b: EntityId,
    /// 1 = A wins, 0 = B wins, 0.5 = draw
    pub result: f64,
}

impl PendingComparison {
    pub fn new(entity_a: impl Into<EntityId>, entity_b: impl Into<EntityId>, result: f64) -> Result<Self> {
        let pending = Self {
            entity_a: entity_a.into(),
            entity_b: entity_b.into(),
            result,
        };
        pending.validate()?;
        Ok(pending)
    }

    pub fn validate(&self) -> Result<()> {
        if self.entity_a.is_empty() || self.entity_b.is_empty() {
            return Err(RankingError::invalid_comparison("entity ids must not be empty").into());
        }
        if !is_valid_result(self.result) {
            return Err(RankingError::invalid_comparison(format!(
                "result must be 0, 0.5 or 1, got {}",
                self.result
            ))
            .into());
        }
        Ok(())
    }
}

/// One recorded pairwise outcome between two entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub id: ComparisonId,
    pub entity_a: EntityId,
    pub entity_b: EntityId,
    /// Result from `entity_a`'s perspective: 1 = A wins, 0 = B wins, 0.5 = draw
    pub result: f64,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Comparison {
    /// Build a comparison, dating it from its id
    pub fn new(
        id: ComparisonId,
        entity_a: impl Into<EntityId>,
        entity_b: impl Into<EntityId>,
        result: f64,
    ) -> Result<Self> {
        let pending = PendingComparison::new(entity_a, entity_b, result)?;
        Ok(Self::from_pending(id, pending, None))
    }

    pub(crate) fn from_pending(
        id: ComparisonId,
        pending: PendingComparison,
        user_id: Option<String>,
    ) -> Self {
        Self {
            date: id.timestamp(),
            id,
            entity_a: pending.entity_a,
            entity_b: pending.entity_b,
            result: pending.result,
            user_id,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.entity_a.is_empty() || self.entity_b.is_empty() {
            return Err(RankingError::invalid_comparison(format!(
                "comparison {} has an empty entity id",
                self.id
            ))
            .into());
        }
        if !is_valid_result(self.result) {
            return Err(RankingError::invalid_comparison(format!(
                "comparison {} has result {}, expected 0, 0.5 or 1",
                self.id, self.result
            ))
            .into());
        }
        Ok(())
    }
}

/// A group of entities waiting for the user's ordering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonGroup {
    pub id: GroupId,
    pub property: ComparisonProperty,
    pub entity_ids: Vec<EntityId>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relevant_states() {
        assert!(IssueState::Triage.is_relevant());
        assert!(IssueState::Backlog.is_relevant());
        assert!(IssueState::Unstarted.is_relevant());
        assert!(!IssueState::Started.is_relevant());
        assert!(!IssueState::Completed.is_relevant());
        assert!(!IssueState::Canceled.is_relevant());
    }

    #[test]
    fn test_pending_comparison_rejects_bad_result() {
        assert!(PendingComparison::new("a", "b", 1.0).is_ok());
        assert!(PendingComparison::new("a", "b", 0.5).is_ok());
        assert!(PendingComparison::new("a", "b", 0.0).is_ok());

        let err = PendingComparison::new("a", "b", 0.7).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RankingError>(),
            Some(RankingError::InvalidComparison { .. })
        ));
    }

    #[test]
    fn test_comparison_dated_from_id() {
        let id: ComparisonId = "1700000000000-0".parse().unwrap();
        let comparison = Comparison::new(id.clone(), "a", "b", 1.0).unwrap();
        assert_eq!(comparison.date.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(comparison.id, id);
    }

    #[test]
    fn test_property_parsing() {
        assert_eq!(
            "Effort".parse::<ComparisonProperty>().unwrap(),
            ComparisonProperty::Effort
        );
        assert_eq!(
            "value".parse::<ComparisonProperty>().unwrap(),
            ComparisonProperty::Value
        );
        assert!("impact".parse::<ComparisonProperty>().is_err());
    }

    #[test]
    fn test_issue_summary_deserializes_minimal_json() {
        let issue: IssueSummary =
            serde_json::from_str(r#"{"id": "ISS-1", "state": "backlog"}"#).unwrap();
        assert_eq!(issue.id, "ISS-1");
        assert_eq!(issue.state, IssueState::Backlog);
        assert!(issue.estimate.is_none());
    }
}
