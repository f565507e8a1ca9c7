//! Metrics for the ranking service
//!
//! Prometheus counters and histograms, rendered in the text exposition
//! format on demand.

pub mod collector;

pub use collector::{MetricsCollector, MetricsTimer, PerformanceMetrics, RankingMetrics};
