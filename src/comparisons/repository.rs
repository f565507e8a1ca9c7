//! Comparison repository interface and in-memory implementation
//!
//! The rating engine never reads the log itself; callers load it through a
//! repository and pass the full, ordered log in.

use crate::comparisons::clock::{Clock, SystemClock};
use crate::comparisons::id::ComparisonId;
use crate::comparisons::log::{ComparisonLog, DEFAULT_MAX_LEN};
use crate::error::Result;
use crate::types::{Comparison, ComparisonProperty, PendingComparison};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Default number of comparisons fetched per page
pub const DEFAULT_PAGE_SIZE: usize = 5_000;

/// Trait for comparison log storage operations
#[async_trait]
pub trait ComparisonRepository: Send + Sync {
    /// Comparisons strictly after `after`, ascending by id, at most `limit`
    async fn load_page(
        &self,
        property: ComparisonProperty,
        after: Option<ComparisonId>,
        limit: usize,
    ) -> Result<Vec<Comparison>>;

    /// Append new comparisons and return every entry after `high_water_mark`
    ///
    /// Without a high-water mark only the newly appended entries are
    /// returned. With one, entries appended by other writers since the mark
    /// are returned as well, so the caller can extend its copy of the log.
    async fn append(
        &self,
        property: ComparisonProperty,
        pending: Vec<PendingComparison>,
        high_water_mark: Option<ComparisonId>,
        user_id: Option<String>,
    ) -> Result<Vec<Comparison>>;

    /// Page size used by [`ComparisonRepository::load_all`]
    fn page_size(&self) -> usize {
        DEFAULT_PAGE_SIZE
    }

    /// The full log, fetched page by page until a short page
    async fn load_all(&self, property: ComparisonProperty) -> Result<Vec<Comparison>> {
        let page_size = self.page_size().max(1);
        let mut comparisons: Vec<Comparison> = Vec::new();

        loop {
            let cursor = comparisons.last().map(|entry| entry.id.clone());
            let page = self.load_page(property, cursor, page_size).await?;
            let full_page = page.len() == page_size;
            comparisons.extend(page);

            if !full_page {
                break;
            }
        }

        debug!(
            "Loaded {} {} comparisons",
            comparisons.len(),
            property
        );

        Ok(comparisons)
    }
}

/// Settings shared by the repository implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryLimits {
    /// Entries fetched per page when loading the full log
    pub page_size: usize,
    /// Entries kept per property before the oldest are trimmed
    pub max_len: usize,
}

impl Default for RepositoryLimits {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_len: DEFAULT_MAX_LEN,
        }
    }
}

/// Append to `log`, trim it and compute the entries to hand back
pub(crate) fn append_to_log(
    log: &mut ComparisonLog,
    property: ComparisonProperty,
    pending: Vec<PendingComparison>,
    high_water_mark: Option<&ComparisonId>,
    user_id: Option<String>,
    now_millis: u64,
    max_len: usize,
) -> Result<Vec<Comparison>> {
    let appended = log.append(pending, user_id, now_millis)?;

    let trimmed = log.trim(max_len);
    if trimmed > 0 {
        warn!(
            "Trimmed {} oldest {} comparisons to stay within {} entries",
            trimmed, property, max_len
        );
    }

    info!(
        "Appended {} {} comparisons, log now holds {}",
        appended.len(),
        property,
        log.len()
    );

    Ok(match high_water_mark {
        Some(mark) => log.entries_after(Some(mark)),
        None => appended,
    })
}

/// In-memory comparison repository implementation
pub struct InMemoryComparisonRepository {
    logs: RwLock<HashMap<ComparisonProperty, ComparisonLog>>,
    clock: Arc<dyn Clock>,
    limits: RepositoryLimits,
}

impl InMemoryComparisonRepository {
    /// Create an empty repository using the system clock
    pub fn new(limits: RepositoryLimits) -> Self {
        Self::with_clock(limits, Arc::new(SystemClock))
    }

    pub fn with_clock(limits: RepositoryLimits, clock: Arc<dyn Clock>) -> Self {
        Self {
            logs: RwLock::new(HashMap::new()),
            clock,
            limits,
        }
    }

    /// Preset a property's log (for fixtures and imports)
    pub async fn preset(&self, property: ComparisonProperty, entries: Vec<Comparison>) -> Result<()> {
        let log = ComparisonLog::from_entries(entries)?;
        self.logs.write().await.insert(property, log);
        Ok(())
    }

    /// Number of comparisons held for a property
    pub async fn len(&self, property: ComparisonProperty) -> usize {
        self.logs
            .read()
            .await
            .get(&property)
            .map(ComparisonLog::len)
            .unwrap_or(0)
    }
}

impl Default for InMemoryComparisonRepository {
    fn default() -> Self {
        Self::new(RepositoryLimits::default())
    }
}

#[async_trait]
impl ComparisonRepository for InMemoryComparisonRepository {
    async fn load_page(
        &self,
        property: ComparisonProperty,
        after: Option<ComparisonId>,
        limit: usize,
    ) -> Result<Vec<Comparison>> {
        let logs = self.logs.read().await;
        Ok(logs
            .get(&property)
            .map(|log| log.page(after.as_ref(), limit))
            .unwrap_or_default())
    }

    async fn append(
        &self,
        property: ComparisonProperty,
        pending: Vec<PendingComparison>,
        high_water_mark: Option<ComparisonId>,
        user_id: Option<String>,
    ) -> Result<Vec<Comparison>> {
        let mut logs = self.logs.write().await;
        let log = logs.entry(property).or_default();
        append_to_log(
            log,
            property,
            pending,
            high_water_mark.as_ref(),
            user_id,
            self.clock.now_millis(),
            self.limits.max_len,
        )
    }

    fn page_size(&self) -> usize {
        self.limits.page_size
    }
}
