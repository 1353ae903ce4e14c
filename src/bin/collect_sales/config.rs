//! Configuration for the sales collector.
//!
//! Configuration comes from two sources:
//! - Environment variables (via .env file or shell): endpoint, timeout
//! - CLI arguments: collection and output parameters

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use seaport_trades::{analysis, collect::CollectorConfig, subgraph};
use url::Url;

/// Largest page the subgraph serves.
pub const MAX_BATCH_SIZE: usize = 1000;

/// Environment configuration.
#[derive(Debug, serde::Deserialize)]
pub struct EnvConfig {
    /// GraphQL endpoint of the Seaport subgraph
    pub subgraph_url: String,

    /// Optional per-request timeout in seconds (default: 30s)
    pub timeout_seconds: Option<u64>,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    pub fn subgraph_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.subgraph_url)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(subgraph::DEFAULT_TIMEOUT)
    }
}

/// CLI arguments of the collector.
#[derive(Debug, Parser)]
#[command(name = "collect-sales")]
#[command(about = "Collect recent Seaport sales from the subgraph and summarize them")]
pub struct CliConfig {
    /// Number of records to collect
    #[arg(long, default_value = "5000")]
    pub total_records: usize,

    /// Records requested per page
    #[arg(long, default_value = "100")]
    pub batch_size: usize,

    /// Save progress every time this many more records are collected
    #[arg(long, default_value = "500")]
    pub save_interval: usize,

    /// Size of the representative sample
    #[arg(long, default_value_t = analysis::SAMPLE_SIZE)]
    pub sample_size: usize,

    /// Checkpoint file, removed once the run completes
    #[arg(long, default_value = "temp_nft_transactions.csv")]
    pub checkpoint: PathBuf,

    /// Directory for the dataset and summary tables
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Derive dates and hours in UTC instead of the local time zone
    #[arg(long)]
    pub utc: bool,

    /// Skip records already collected
    #[arg(long)]
    pub dedupe: bool,

    /// Pause between page requests, in milliseconds
    #[arg(long, default_value = "1000")]
    pub page_delay_ms: u64,

    /// Pause after a failed page request, in milliseconds
    #[arg(long, default_value = "5000")]
    pub error_delay_ms: u64,
}

impl CliConfig {
    /// Convert CLI arguments to the collector configuration.
    pub fn to_collector_config(&self) -> Result<CollectorConfig, ConfigError> {
        if self.total_records == 0 {
            return Err(ConfigError::ZeroTotalRecords);
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        Ok(CollectorConfig {
            target: self.total_records,
            page_size: self.batch_size,
            checkpoint_interval: self.save_interval,
            page_delay: Duration::from_millis(self.page_delay_ms),
            error_delay: Duration::from_millis(self.error_delay_ms),
            dedupe: self.dedupe,
            ..Default::default()
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("total_records must be positive")]
    ZeroTotalRecords,

    #[error("batch_size must be between 1 and {MAX_BATCH_SIZE}, got {0}")]
    InvalidBatchSize(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> CliConfig {
        CliConfig::parse_from(std::iter::once("collect-sales").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let config = cli(&[]).to_collector_config().unwrap();
        assert_eq!(config.target, 5000);
        assert_eq!(config.page_size, 100);
        assert_eq!(config.checkpoint_interval, 500);
        assert_eq!(config.page_delay, Duration::from_secs(1));
        assert_eq!(config.error_delay, Duration::from_secs(5));
        assert_eq!(config.max_consecutive_failures, 5);
        assert!(!config.dedupe);
    }

    #[test]
    fn test_overrides() {
        let cli = cli(&[
            "--total-records",
            "250",
            "--batch-size",
            "50",
            "--dedupe",
            "--utc",
            "--checkpoint",
            "/tmp/progress.csv",
        ]);
        assert!(cli.utc);
        assert_eq!(cli.checkpoint, PathBuf::from("/tmp/progress.csv"));

        let config = cli.to_collector_config().unwrap();
        assert_eq!(config.target, 250);
        assert_eq!(config.page_size, 50);
        assert!(config.dedupe);
    }

    #[test]
    fn test_invalid_sizes() {
        assert!(matches!(
            cli(&["--total-records", "0"]).to_collector_config(),
            Err(ConfigError::ZeroTotalRecords)
        ));
        assert!(matches!(
            cli(&["--batch-size", "0"]).to_collector_config(),
            Err(ConfigError::InvalidBatchSize(0))
        ));
        assert!(matches!(
            cli(&["--batch-size", "1001"]).to_collector_config(),
            Err(ConfigError::InvalidBatchSize(1001))
        ));
    }
}
