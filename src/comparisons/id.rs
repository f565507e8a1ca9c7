//! Sortable comparison ids
//!
//! Ids follow the stream-entry layout `<unix-millis>-<sequence>` and order
//! numerically, so the log can be replayed and paged by id.

use crate::error::RankingError;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a logged comparison, ordered by `(millis, sequence)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComparisonId {
    millis: u64,
    sequence: u64,
}

impl ComparisonId {
    pub fn new(millis: u64, sequence: u64) -> Self {
        Self { millis, sequence }
    }

    pub fn millis(&self) -> u64 {
        self.millis
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Next id after `last` at wall-clock `now_millis`; never goes backwards
    pub fn next_after(last: Option<&ComparisonId>, now_millis: u64) -> Self {
        match last {
            Some(last) if now_millis <= last.millis => Self::new(last.millis, last.sequence + 1),
            _ => Self::new(now_millis, 0),
        }
    }

    /// Wall-clock time the entry was appended
    pub fn timestamp(&self) -> DateTime<Utc> {
        let millis = i64::try_from(self.millis).unwrap_or(i64::MAX);
        Utc.timestamp_millis_opt(millis)
            .single()
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl fmt::Display for ComparisonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.millis, self.sequence)
    }
}

impl FromStr for ComparisonId {
    type Err = RankingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RankingError::InvalidComparisonId {
            value: s.to_string(),
        };

        let (millis, sequence) = match s.split_once('-') {
            Some((millis, sequence)) => (millis, sequence),
            // A bare millisecond value is accepted, like stream range queries do
            None => (s, "0"),
        };

        Ok(Self {
            millis: millis.parse().map_err(|_| invalid())?,
            sequence: sequence.parse().map_err(|_| invalid())?,
        })
    }
}

impl TryFrom<String> for ComparisonId {
    type Error = RankingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ComparisonId> for String {
    fn from(id: ComparisonId) -> Self {
        id.to_string()
    }
}
