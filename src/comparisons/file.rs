//! JSON file backed comparison repository
//!
//! Each property's log lives in `<data_dir>/<property>-comparisons.json` as
//! a JSON array in ascending id order.

use crate::comparisons::clock::{Clock, SystemClock};
use crate::comparisons::id::ComparisonId;
use crate::comparisons::log::ComparisonLog;
use crate::comparisons::repository::{append_to_log, ComparisonRepository, RepositoryLimits};
use crate::error::{RankingError, Result};
use crate::types::{Comparison, ComparisonProperty, PendingComparison};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Comparison repository storing one JSON file per property
pub struct JsonFileComparisonRepository {
    data_dir: PathBuf,
    clock: Arc<dyn Clock>,
    limits: RepositoryLimits,
    /// Serializes read-modify-write cycles on the files
    write_lock: Mutex<()>,
}

impl JsonFileComparisonRepository {
    pub fn new(data_dir: impl Into<PathBuf>, limits: RepositoryLimits) -> Self {
        Self::with_clock(data_dir, limits, Arc::new(SystemClock))
    }

    pub fn with_clock(
        data_dir: impl Into<PathBuf>,
        limits: RepositoryLimits,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            clock,
            limits,
            write_lock: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the file holding a property's log
    pub fn log_path(&self, property: ComparisonProperty) -> PathBuf {
        self.data_dir
            .join(format!("{}-comparisons.json", property.as_str()))
    }

    async fn read_log(&self, property: ComparisonProperty) -> Result<ComparisonLog> {
        let path = self.log_path(property);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No comparison log at {}, starting empty", path.display());
                return Ok(ComparisonLog::new());
            }
            Err(e) => {
                return Err(RankingError::storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                ))
                .into())
            }
        };

        let entries: Vec<Comparison> = serde_json::from_str(&contents).map_err(|e| {
            RankingError::storage(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        ComparisonLog::from_entries(entries)
    }

    async fn write_log(&self, property: ComparisonProperty, log: &ComparisonLog) -> Result<()> {
        tokio::fs::create_dir_all(&self.data_dir).await.map_err(|e| {
            RankingError::storage(format!(
                "Failed to create {}: {}",
                self.data_dir.display(),
                e
            ))
        })?;

        let path = self.log_path(property);
        let staging = path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(log)
            .map_err(|e| RankingError::storage(format!("Failed to encode log: {}", e)))?;

        tokio::fs::write(&staging, contents).await.map_err(|e| {
            RankingError::storage(format!("Failed to write {}: {}", staging.display(), e))
        })?;
        tokio::fs::rename(&staging, &path).await.map_err(|e| {
            RankingError::storage(format!("Failed to replace {}: {}", path.display(), e))
        })?;

        Ok(())
    }
}

#[async_trait]
impl ComparisonRepository for JsonFileComparisonRepository {
    async fn load_page(
        &self,
        property: ComparisonProperty,
        after: Option<ComparisonId>,
        limit: usize,
    ) -> Result<Vec<Comparison>> {
        let log = self.read_log(property).await?;
        Ok(log.page(after.as_ref(), limit))
    }

    async fn append(
        &self,
        property: ComparisonProperty,
        pending: Vec<PendingComparison>,
        high_water_mark: Option<ComparisonId>,
        user_id: Option<String>,
    ) -> Result<Vec<Comparison>> {
        let _guard = self.write_lock.lock().await;

        let mut log = self.read_log(property).await?;
        let returned = append_to_log(
            &mut log,
            property,
            pending,
            high_water_mark.as_ref(),
            user_id,
            self.clock.now_millis(),
            self.limits.max_len,
        )?;
        self.write_log(property, &log).await?;

        Ok(returned)
    }

    fn page_size(&self) -> usize {
        self.limits.page_size
    }
}
