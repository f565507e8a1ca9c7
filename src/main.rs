//! Command line entry point for the pairwise ranker
//!
//! Reads issue summaries from a JSON file, works against the comparison logs
//! in the data directory and prints JSON results on stdout. Logs go to
//! stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pairwise_ranker::config::AppConfig;
use pairwise_ranker::metrics::MetricsCollector;
use pairwise_ranker::{
    ComparisonProperty, EntityId, IssueSummary, JsonFileComparisonRepository, RankingService,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Pairwise Ranker - Elo ratings for issue effort and value
#[derive(Parser)]
#[command(
    name = "pairwise-ranker",
    version,
    about = "Rank issues by effort and value from pairwise comparisons",
    long_about = "Pairwise Ranker replays a log of pairwise issue comparisons into Elo ratings, \
                 suggests the next group of issues to order, records orderings, and reports \
                 priorities with recommended estimates."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Data directory override
    #[arg(long, value_name = "DIR", help = "Override comparison log directory")]
    data_dir: Option<PathBuf>,

    /// Dump Prometheus metrics to stderr after the command
    #[arg(long, help = "Print collected metrics in Prometheus text format on exit")]
    print_metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the current rating stats for a property
    Stats {
        #[arg(long, value_name = "FILE", help = "JSON array of issue summaries")]
        issues: PathBuf,
        #[arg(long, default_value = "effort")]
        property: ComparisonProperty,
    },

    /// Suggest the next group of issues to order
    Next {
        #[arg(long, value_name = "FILE", help = "JSON array of issue summaries")]
        issues: PathBuf,
        #[arg(long, default_value = "effort")]
        property: ComparisonProperty,
        /// Build the group around this issue
        #[arg(long, value_name = "ID")]
        anchor: Option<EntityId>,
    },

    /// Record an ordering of issues, best first
    Submit {
        #[arg(long, value_name = "FILE", help = "JSON array of issue summaries")]
        issues: PathBuf,
        #[arg(long, default_value = "effort")]
        property: ComparisonProperty,
        /// User submitting the ordering
        #[arg(long, value_name = "ID")]
        user: Option<String>,
        /// Issue ids, best first
        #[arg(required = true, num_args = 2..)]
        order: Vec<EntityId>,
    },

    /// Print the priority report for all relevant issues
    Report {
        #[arg(long, value_name = "FILE", help = "JSON array of issue summaries")]
        issues: PathBuf,
    },
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Display startup information
fn display_startup_banner(config: &AppConfig) {
    debug!("Pairwise Ranker v{}", pairwise_ranker::VERSION);
    debug!("   Service: {}", config.service.name);
    debug!("   Data dir: {}", config.storage.data_dir.display());
    debug!(
        "   Elo: initial {}, K-factors {:?} at {:?}",
        config.rating.initial_rating, config.rating.k_factors, config.rating.thresholds
    );
    debug!("   Group size: {}", config.matchup.group_size);
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if let Some(data_dir) = &args.data_dir {
        config.storage.data_dir = data_dir.clone();
    }

    pairwise_ranker::config::validate_config(&config)?;
    Ok(config)
}

fn read_issues(path: &Path) -> Result<Vec<IssueSummary>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read issues from {}", path.display()))?;
    let issues: Vec<IssueSummary> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse issues from {}", path.display()))?;
    info!("Loaded {} issue summaries", issues.len());
    Ok(issues)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(command: Command, service: &RankingService) -> Result<()> {
    match command {
        Command::Stats { issues, property } => {
            let issues = read_issues(&issues)?;
            let stats: BTreeMap<_, _> = service.stats(property, &issues).await?.into_iter().collect();
            print_json(&stats)
        }
        Command::Next {
            issues,
            property,
            anchor,
        } => {
            let issues = read_issues(&issues)?;
            let mut rng = rand::rng();
            let group = service
                .create_group(property, &issues, anchor, &mut rng)
                .await?;
            print_json(&group)
        }
        Command::Submit {
            issues,
            property,
            user,
            order,
        } => {
            let issues = read_issues(&issues)?;
            let stats: BTreeMap<_, _> = service
                .record_ordering(property, &order, &issues, user)
                .await?
                .into_iter()
                .filter(|(id, _)| order.contains(id))
                .collect();
            print_json(&stats)
        }
        Command::Report { issues } => {
            let issues = read_issues(&issues)?;
            let report = service.report(&issues).await?;
            print_json(&report)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    // Initialize logging early (before any other operations)
    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_startup_banner(&config);

    let metrics = Arc::new(MetricsCollector::new()?);
    let repository = Arc::new(JsonFileComparisonRepository::new(
        config.storage.data_dir.clone(),
        config.storage.limits(),
    ));
    let service = RankingService::new(repository, &config, metrics.clone())?;

    let print_metrics = args.print_metrics;
    let outcome = run(args.command, &service).await;

    if print_metrics {
        eprint!("{}", metrics.gather_text()?);
    }

    if let Err(e) = outcome {
        error!("Command failed: {:#}", e);
        return Err(e);
    }

    Ok(())
}
