//! Ordered comparison log shared by the repository implementations

use crate::comparisons::id::ComparisonId;
use crate::error::Result;
use crate::types::{Comparison, PendingComparison};
use serde::{Deserialize, Serialize};

/// Default cap on entries kept per property
pub const DEFAULT_MAX_LEN: usize = 10_000;

/// Comparisons kept in ascending id order, capped at `max_len` entries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComparisonLog {
    entries: Vec<Comparison>,
}

impl ComparisonLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from stored entries, restoring id order
    pub fn from_entries(mut entries: Vec<Comparison>) -> Result<Self> {
        for entry in &entries {
            entry.validate()?;
        }
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[Comparison] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_id(&self) -> Option<&ComparisonId> {
        self.entries.last().map(|entry| &entry.id)
    }

    /// Entries strictly after `after`, at most `limit` of them
    pub fn page(&self, after: Option<&ComparisonId>, limit: usize) -> Vec<Comparison> {
        self.entries[self.start_after(after)..]
            .iter()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Every entry strictly after `after`
    pub fn entries_after(&self, after: Option<&ComparisonId>) -> Vec<Comparison> {
        self.entries[self.start_after(after)..].to_vec()
    }

    /// Assign ids to `pending` and append them, returning the new entries
    ///
    /// Either every pending comparison is valid and appended, or none is.
    pub fn append(
        &mut self,
        pending: Vec<PendingComparison>,
        user_id: Option<String>,
        now_millis: u64,
    ) -> Result<Vec<Comparison>> {
        for comparison in &pending {
            comparison.validate()?;
        }

        let mut appended = Vec::with_capacity(pending.len());
        for comparison in pending {
            let id = ComparisonId::next_after(self.last_id(), now_millis);
            let entry = Comparison::from_pending(id, comparison, user_id.clone());
            self.entries.push(entry.clone());
            appended.push(entry);
        }

        Ok(appended)
    }

    /// Drop the oldest entries beyond `max_len`; returns how many were dropped
    pub fn trim(&mut self, max_len: usize) -> usize {
        if self.entries.len() <= max_len {
            return 0;
        }
        let excess = self.entries.len() - max_len;
        self.entries.drain(..excess);
        excess
    }

    fn start_after(&self, after: Option<&ComparisonId>) -> usize {
        match after {
            Some(mark) => self.entries.partition_point(|entry| entry.id <= *mark),
            None => 0,
        }
    }
}
