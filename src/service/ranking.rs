//! Ranking service tying the comparison log to the rating engine
//!
//! The service owns a cached copy of each property's log. Appends go through
//! the repository with the cache's last id as high-water mark, and every
//! comparison the repository hands back (ours and any other writer's) is
//! folded into the cache before stats are recomputed.

use crate::comparisons::{ComparisonId, ComparisonRepository};
use crate::config::AppConfig;
use crate::error::{RankingError, Result};
use crate::matchup::{comparisons_from_ordering, MatchupSelector};
use crate::metrics::MetricsCollector;
use crate::rating::{EstimateBucketer, RatingStore};
use crate::report::{priority_report, PriorityReport};
use crate::types::{
    relevant_issues, Comparison, ComparisonGroup, ComparisonProperty, EntityId, GroupId,
    IssueSummary, StatsMap,
};
use crate::utils::{current_timestamp, entity_universe, generate_group_id};
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// Ranking service coordinating comparisons, stats and groups
pub struct RankingService {
    repository: Arc<dyn ComparisonRepository>,
    rating_store: RatingStore,
    selector: MatchupSelector,
    bucketer: EstimateBucketer,
    metrics: Arc<MetricsCollector>,
    /// Effort comparisons needed before an estimate is flagged out of date
    min_estimate_comparisons: u32,
    /// Cached logs are trimmed to this many entries, like the repository's
    max_log_len: usize,

    /// Groups handed out and not yet submitted
    groups: RwLock<HashMap<GroupId, ComparisonGroup>>,

    /// Cached logs; holding the lock serializes append and recompute
    logs: Mutex<HashMap<ComparisonProperty, Vec<Comparison>>>,
}

impl RankingService {
    /// Build the service from a validated configuration
    pub fn new(
        repository: Arc<dyn ComparisonRepository>,
        config: &AppConfig,
        metrics: Arc<MetricsCollector>,
    ) -> Result<Self> {
        Ok(Self {
            repository,
            rating_store: RatingStore::new(config.rating.clone())?,
            selector: MatchupSelector::new(config.matchup.clone())?,
            bucketer: config.estimate_bucketer()?,
            metrics,
            min_estimate_comparisons: config.estimates.min_comparisons,
            max_log_len: config.storage.max_len,
            groups: RwLock::new(HashMap::new()),
            logs: Mutex::new(HashMap::new()),
        })
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    pub fn rating_store(&self) -> &RatingStore {
        &self.rating_store
    }

    /// Stats for every summary and every entity the log references
    ///
    /// Always reloads the full log from the repository.
    pub async fn stats(
        &self,
        property: ComparisonProperty,
        summaries: &[IssueSummary],
    ) -> Result<StatsMap> {
        let mut logs = self.logs.lock().await;
        let log = self.load_log(property).await?;
        let stats = self.compute_stats(property, summaries, &log)?;
        logs.insert(property, log);
        Ok(stats)
    }

    /// Generate the next group to order, registering it for submission
    ///
    /// Candidates are the relevant summaries. With an `anchor` the group is
    /// built around that entity instead of a drawn one. Groups of fewer than
    /// two entities carry no comparison and are returned unregistered.
    pub async fn create_group(
        &self,
        property: ComparisonProperty,
        summaries: &[IssueSummary],
        anchor: Option<EntityId>,
        rng: &mut impl Rng,
    ) -> Result<ComparisonGroup> {
        let stats = self.stats(property, summaries).await?;
        let candidates: Vec<EntityId> = relevant_issues(summaries)
            .into_iter()
            .map(|issue| issue.id.clone())
            .collect();

        let entity_ids = match anchor {
            Some(anchor) => self
                .selector
                .complete_matchup(anchor, &candidates, &stats, rng)?,
            None => self.selector.select_matchup(&candidates, &stats, rng)?,
        };

        let group = ComparisonGroup {
            id: generate_group_id(),
            property,
            entity_ids,
            created_at: current_timestamp(),
        };

        if group.entity_ids.len() < 2 {
            warn!(
                "Only {} {} candidates available, group {} not registered",
                group.entity_ids.len(),
                property,
                group.id
            );
            return Ok(group);
        }

        self.groups.write().await.insert(group.id, group.clone());
        self.metrics.record_group_created(property);

        info!(
            "Created {} group {} with {} entities",
            property,
            group.id,
            group.entity_ids.len()
        );

        Ok(group)
    }

    /// Look up a pending group
    pub async fn group(&self, group_id: GroupId) -> Option<ComparisonGroup> {
        self.groups.read().await.get(&group_id).cloned()
    }

    /// Number of groups waiting for an ordering
    pub async fn pending_groups(&self) -> usize {
        self.groups.read().await.len()
    }

    /// Record the user's ordering of a pending group, best first
    ///
    /// The group is consumed on success. Returns the comparisons appended
    /// for this ordering.
    pub async fn submit_group(
        &self,
        group_id: GroupId,
        order: &[EntityId],
        user_id: Option<String>,
    ) -> Result<Vec<Comparison>> {
        let group = {
            let mut groups = self.groups.write().await;
            let group = match groups.get(&group_id) {
                Some(group) => group,
                None => {
                    self.metrics.record_rejected_submission("unknown_group");
                    return Err(RankingError::GroupNotFound {
                        group_id: group_id.to_string(),
                    }
                    .into());
                }
            };

            if let Err(e) = check_permutation(&group.entity_ids, order) {
                self.metrics.record_rejected_submission("invalid_order");
                return Err(e);
            }

            match groups.remove(&group_id) {
                Some(group) => group,
                None => {
                    return Err(RankingError::GroupNotFound {
                        group_id: group_id.to_string(),
                    }
                    .into())
                }
            }
        };

        let recorded = {
            let mut logs = self.logs.lock().await;
            self.append_ordering(&mut logs, group.property, order, user_id)
                .await
        };

        match recorded {
            Ok(recorded) => {
                self.metrics.record_group_submitted(group.property);
                info!(
                    "Group {} submitted, {} {} comparisons recorded",
                    group_id,
                    recorded.len(),
                    group.property
                );
                Ok(recorded)
            }
            Err(e) => {
                error!("Failed to record group {}: {}", group_id, e);
                self.groups.write().await.insert(group.id, group);
                Err(e)
            }
        }
    }

    /// Record an ordering, best first, and return the updated stats
    pub async fn record_ordering(
        &self,
        property: ComparisonProperty,
        order: &[EntityId],
        summaries: &[IssueSummary],
        user_id: Option<String>,
    ) -> Result<StatsMap> {
        let mut logs = self.logs.lock().await;
        self.append_ordering(&mut logs, property, order, user_id)
            .await?;

        let log = logs.get(&property).map(Vec::as_slice).unwrap_or_default();
        self.compute_stats(property, summaries, log)
    }

    /// Priority report with a row per relevant summary
    pub async fn report(&self, summaries: &[IssueSummary]) -> Result<PriorityReport> {
        let effort = self.stats(ComparisonProperty::Effort, summaries).await?;
        let value = self.stats(ComparisonProperty::Value, summaries).await?;

        let timer = self.metrics.start_timer();
        let report = priority_report(
            summaries,
            &effort,
            &value,
            &self.bucketer,
            self.min_estimate_comparisons,
        )?;
        let duration = timer.stop();
        self.metrics.record_report(duration);

        debug!(
            "Built priority report of {} rows ({} out-of-date estimates) in {:.2}ms",
            report.rows.len(),
            report.out_of_date_estimates,
            duration.as_secs_f64() * 1000.0
        );

        Ok(report)
    }

    async fn append_ordering(
        &self,
        logs: &mut HashMap<ComparisonProperty, Vec<Comparison>>,
        property: ComparisonProperty,
        order: &[EntityId],
        user_id: Option<String>,
    ) -> Result<Vec<Comparison>> {
        let pending = comparisons_from_ordering(order)?;
        if pending.is_empty() {
            debug!("Ordering of {} entities carries no comparisons", order.len());
            return Ok(Vec::new());
        }
        let count = pending.len();

        // An empty cache has no mark to catch up from
        if logs.get(&property).map_or(true, Vec::is_empty) {
            let log = self.load_log(property).await?;
            logs.insert(property, log);
        }
        let log = logs.entry(property).or_default();
        let mark: Option<ComparisonId> = log.last().map(|entry| entry.id.clone());

        let start_time = Instant::now();
        let result = self
            .repository
            .append(property, pending, mark, user_id)
            .await;
        self.metrics
            .record_repository_operation("append", result.is_ok(), start_time.elapsed());
        let returned = result?;

        let ours: HashSet<&ComparisonId> = returned.iter().rev().take(count).map(|c| &c.id).collect();
        let foreign = returned.len().saturating_sub(count);
        if foreign > 0 {
            info!(
                "Picked up {} {} comparisons from other writers",
                foreign, property
            );
        }
        let recorded: Vec<Comparison> = returned
            .iter()
            .filter(|c| ours.contains(&c.id))
            .cloned()
            .collect();

        log.extend(returned);
        if log.len() > self.max_log_len {
            let excess = log.len() - self.max_log_len;
            log.drain(..excess);
            debug!("Dropped {} oldest cached {} comparisons", excess, property);
        }
        self.metrics.record_comparisons(property, count);

        Ok(recorded)
    }

    async fn load_log(&self, property: ComparisonProperty) -> Result<Vec<Comparison>> {
        let start_time = Instant::now();
        let result = self.repository.load_all(property).await;
        self.metrics
            .record_repository_operation("load_all", result.is_ok(), start_time.elapsed());

        if let Err(e) = &result {
            error!("Failed to load {} comparisons: {}", property, e);
        }
        result
    }

    fn compute_stats(
        &self,
        property: ComparisonProperty,
        summaries: &[IssueSummary],
        log: &[Comparison],
    ) -> Result<StatsMap> {
        let timer = self.metrics.start_timer();
        let entities = entity_universe(summaries, log);
        let stats = self.rating_store.calculate_stats(&entities, log)?;
        let duration = timer.stop();

        self.metrics.record_stats_calculation(
            property,
            stats.values().map(|entry| &entry.rating),
            duration,
        );

        debug!(
            "Computed {} stats for {} entities from {} comparisons in {:.2}ms",
            property,
            stats.len(),
            log.len(),
            duration.as_secs_f64() * 1000.0
        );

        Ok(stats)
    }
}

/// `order` must contain exactly the group's entities
fn check_permutation(expected: &[EntityId], order: &[EntityId]) -> Result<()> {
    let expected_set: HashSet<&EntityId> = expected.iter().collect();
    let order_set: HashSet<&EntityId> = order.iter().collect();

    if order.len() != expected.len() || order_set != expected_set {
        return Err(RankingError::invalid_comparison(format!(
            "ordering must contain exactly the group's {} entities",
            expected.len()
        ))
        .into());
    }
    Ok(())
}
