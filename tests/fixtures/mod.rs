//! Test fixtures and mock implementations for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use pairwise_ranker::comparisons::{ComparisonId, ComparisonRepository, InMemoryComparisonRepository};
use pairwise_ranker::config::AppConfig;
use pairwise_ranker::error::{RankingError, Result};
use pairwise_ranker::metrics::MetricsCollector;
use pairwise_ranker::types::{Comparison, ComparisonProperty, IssueState, IssueSummary, PendingComparison};
use pairwise_ranker::RankingService;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Issue summary in the given state
pub fn issue(id: &str, state: IssueState) -> IssueSummary {
    IssueSummary {
        id: id.to_string(),
        identifier: format!("ENG-{}", id),
        title: format!("Issue {}", id),
        state,
        estimate: None,
    }
}

/// Backlog issues with the given ids
pub fn backlog(ids: &[&str]) -> Vec<IssueSummary> {
    ids.iter().map(|id| issue(id, IssueState::Backlog)).collect()
}

pub fn order(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

/// One recorded `append` call
#[derive(Debug, Clone)]
pub struct AppendCall {
    pub property: ComparisonProperty,
    pub pending: usize,
    pub high_water_mark: Option<ComparisonId>,
    pub user_id: Option<String>,
}

/// Repository wrapper that records calls and can be told to fail appends
#[derive(Default)]
pub struct RecordingRepository {
    inner: InMemoryComparisonRepository,
    append_calls: Arc<Mutex<Vec<AppendCall>>>,
    page_calls: Arc<Mutex<Vec<Option<ComparisonId>>>>,
    fail_appends: AtomicBool,
}

impl RecordingRepository {
    pub fn new(inner: InMemoryComparisonRepository) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    pub fn inner(&self) -> &InMemoryComparisonRepository {
        &self.inner
    }

    /// Make every following append fail with a storage error
    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Get all recorded append calls (for testing)
    pub fn append_calls(&self) -> Vec<AppendCall> {
        self.append_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Get the cursor of every page request (for testing)
    pub fn page_calls(&self) -> Vec<Option<ComparisonId>> {
        self.page_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ComparisonRepository for RecordingRepository {
    async fn load_page(
        &self,
        property: ComparisonProperty,
        after: Option<ComparisonId>,
        limit: usize,
    ) -> Result<Vec<Comparison>> {
        if let Ok(mut calls) = self.page_calls.lock() {
            calls.push(after.clone());
        }
        self.inner.load_page(property, after, limit).await
    }

    async fn append(
        &self,
        property: ComparisonProperty,
        pending: Vec<PendingComparison>,
        high_water_mark: Option<ComparisonId>,
        user_id: Option<String>,
    ) -> Result<Vec<Comparison>> {
        if let Ok(mut calls) = self.append_calls.lock() {
            calls.push(AppendCall {
                property,
                pending: pending.len(),
                high_water_mark: high_water_mark.clone(),
                user_id: user_id.clone(),
            });
        }

        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(RankingError::storage("append rejected by test").into());
        }

        self.inner
            .append(property, pending, high_water_mark, user_id)
            .await
    }

    fn page_size(&self) -> usize {
        self.inner.page_size()
    }
}

/// Service over `repository` with default configuration
pub fn create_service(repository: Arc<dyn ComparisonRepository>) -> RankingService {
    RankingService::new(
        repository,
        &AppConfig::default(),
        Arc::new(MetricsCollector::new().expect("Failed to create metrics collector")),
    )
    .expect("Failed to create ranking service")
}
