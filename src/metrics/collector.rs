//! Metrics collection using Prometheus
//!
//! Counters and histograms covering recorded comparisons, generated groups,
//! stats replays and comparison log access.

use crate::types::ComparisonProperty;
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the ranking service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Comparison and group metrics
    ranking_metrics: RankingMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Comparison and group metrics
#[derive(Clone)]
pub struct RankingMetrics {
    /// Comparisons appended to the log, by property
    pub comparisons_recorded_total: IntCounterVec,

    /// Comparison groups handed out, by property
    pub groups_created_total: IntCounterVec,

    /// Orderings submitted for a group, by property
    pub groups_submitted_total: IntCounterVec,

    /// Submissions that were rejected, by reason
    pub rejected_submissions_total: IntCounterVec,

    /// Number of rated entities after the last replay, by property
    pub rated_entities: IntGaugeVec,

    /// Distribution of ratings seen during replays, by property
    pub rating_distribution: HistogramVec,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Time spent replaying a comparison log into stats
    pub stats_calculation_duration: HistogramVec,

    /// Comparison repository operation durations
    pub repository_operation_duration: HistogramVec,

    /// Time spent building a priority report
    pub report_duration: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let ranking_metrics = RankingMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            ranking_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get ranking metrics
    pub fn ranking(&self) -> &RankingMetrics {
        &self.ranking_metrics
    }

    /// Get performance metrics
    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Record comparisons appended for a property
    pub fn record_comparisons(&self, property: ComparisonProperty, count: usize) {
        self.ranking_metrics
            .comparisons_recorded_total
            .with_label_values(&[property.as_str()])
            .inc_by(count as u64);
    }

    /// Record a generated comparison group
    pub fn record_group_created(&self, property: ComparisonProperty) {
        self.ranking_metrics
            .groups_created_total
            .with_label_values(&[property.as_str()])
            .inc();
    }

    /// Record a submitted ordering
    pub fn record_group_submitted(&self, property: ComparisonProperty) {
        self.ranking_metrics
            .groups_submitted_total
            .with_label_values(&[property.as_str()])
            .inc();
    }

    /// Record a rejected submission
    pub fn record_rejected_submission(&self, reason: &str) {
        self.ranking_metrics
            .rejected_submissions_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Record the outcome of a stats replay
    pub fn record_stats_calculation<'a>(
        &self,
        property: ComparisonProperty,
        ratings: impl IntoIterator<Item = &'a f64>,
        duration: Duration,
    ) {
        let label = property.as_str();
        let histogram = self
            .ranking_metrics
            .rating_distribution
            .with_label_values(&[label]);

        let mut count = 0;
        for rating in ratings {
            histogram.observe(*rating);
            count += 1;
        }

        self.ranking_metrics
            .rated_entities
            .with_label_values(&[label])
            .set(count);
        self.performance_metrics
            .stats_calculation_duration
            .with_label_values(&[label])
            .observe(duration.as_secs_f64());
    }

    /// Record a comparison repository operation
    pub fn record_repository_operation(&self, operation: &str, success: bool, duration: Duration) {
        let status = if success { "success" } else { "error" };

        self.performance_metrics
            .repository_operation_duration
            .with_label_values(&[operation, status])
            .observe(duration.as_secs_f64());
    }

    /// Record report generation duration
    pub fn record_report(&self, duration: Duration) {
        self.performance_metrics
            .report_duration
            .observe(duration.as_secs_f64());
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }

    /// Render every registered metric in the Prometheus text format
    pub fn gather_text(&self) -> Result<String> {
        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        Ok(encoder.encode_to_string(&metric_families)?)
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl RankingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let comparisons_recorded_total = IntCounterVec::new(
            Opts::new(
                "pairwise_ranker_comparisons_recorded_total",
                "Total comparisons appended to the log",
            ),
            &["property"],
        )?;
        registry.register(Box::new(comparisons_recorded_total.clone()))?;

        let groups_created_total = IntCounterVec::new(
            Opts::new(
                "pairwise_ranker_groups_created_total",
                "Total comparison groups generated",
            ),
            &["property"],
        )?;
        registry.register(Box::new(groups_created_total.clone()))?;

        let groups_submitted_total = IntCounterVec::new(
            Opts::new(
                "pairwise_ranker_groups_submitted_total",
                "Total orderings submitted",
            ),
            &["property"],
        )?;
        registry.register(Box::new(groups_submitted_total.clone()))?;

        let rejected_submissions_total = IntCounterVec::new(
            Opts::new(
                "pairwise_ranker_rejected_submissions_total",
                "Total rejected submissions",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(rejected_submissions_total.clone()))?;

        let rated_entities = IntGaugeVec::new(
            Opts::new(
                "pairwise_ranker_rated_entities",
                "Entities rated by the last replay",
            ),
            &["property"],
        )?;
        registry.register(Box::new(rated_entities.clone()))?;

        let rating_distribution = HistogramVec::new(
            HistogramOpts::new(
                "pairwise_ranker_rating_distribution",
                "Entity rating distribution",
            )
            .buckets(vec![
                800.0, 1000.0, 1100.0, 1200.0, 1300.0, 1400.0, 1600.0, 2000.0,
            ]),
            &["property"],
        )?;
        registry.register(Box::new(rating_distribution.clone()))?;

        Ok(Self {
            comparisons_recorded_total,
            groups_created_total,
            groups_submitted_total,
            rejected_submissions_total,
            rated_entities,
            rating_distribution,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let stats_calculation_duration = HistogramVec::new(
            HistogramOpts::new(
                "pairwise_ranker_stats_calculation_duration_seconds",
                "Comparison log replay time",
            )
            .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5]),
            &["property"],
        )?;
        registry.register(Box::new(stats_calculation_duration.clone()))?;

        let repository_operation_duration = HistogramVec::new(
            HistogramOpts::new(
                "pairwise_ranker_repository_operation_duration_seconds",
                "Comparison repository operation duration",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation", "status"],
        )?;
        registry.register(Box::new(repository_operation_duration.clone()))?;

        let report_duration = Histogram::with_opts(
            HistogramOpts::new(
                "pairwise_ranker_report_duration_seconds",
                "Priority report generation time",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(report_duration.clone()))?;

        Ok(Self {
            stats_calculation_duration,
            repository_operation_duration,
            report_duration,
        })
    }
}
