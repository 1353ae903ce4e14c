//! End to end collection run: subgraph pages to dataset, sample and tables.

use std::fmt::Display;

use chrono::TimeZone;
use seaport_trades::{
    analysis::{self, BasicStats},
    checkpoint::CsvCheckpoint,
    collect::{Collector, StopReason},
    normalize::Normalizer,
    subgraph::SubgraphClient,
};
use tracing::{info, warn};

use crate::{
    config::{CliConfig, EnvConfig},
    error::Result,
};

/// Collect, persist and summarize trades, deriving calendar fields in `tz`.
pub async fn run<Tz>(env: &EnvConfig, cli: &CliConfig, tz: Tz) -> Result<()>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let config = cli.to_collector_config()?;
    let client = SubgraphClient::new(env.subgraph_url()?, env.timeout())?;
    let store = CsvCheckpoint::new(&cli.checkpoint);

    info!(
        endpoint = %client.endpoint(),
        target = config.target,
        page_size = config.page_size,
        checkpoint = %store.path().display(),
        "Starting sales collection"
    );

    let collector = Collector::new(
        &client,
        &store,
        Normalizer::new(tz),
        config,
        tokio::time::sleep,
    );
    let report = collector.collect().await;

    info!(
        records = report.records.len(),
        resumed_from = report.resumed_from,
        pages = report.pages_requested,
        dropped = report.dropped,
        duplicates = report.duplicates,
        stop_reason = ?report.stop_reason,
        "Collection finished"
    );

    if report.records.is_empty() {
        warn!("No trades collected, nothing to write");
        return Ok(());
    }

    let records = &report.records;
    let sample = analysis::sample(records, cli.sample_size, &mut rand::thread_rng());
    analysis::write_tables(&cli.output_dir, records, &sample)?;

    print_summary(records);

    match report.stop_reason {
        StopReason::TargetReached => collector.finish(),
        StopReason::BreakerTripped => warn!(
            checkpoint = %store.path().display(),
            "Target not reached, keeping checkpoint for the next run"
        ),
    }
    Ok(())
}

fn print_summary(records: &[seaport_trades::types::TradeRecord]) {
    println!("{}", BasicStats::new(records));

    println!("\nTrades by hour:");
    for row in analysis::by_hour(records) {
        println!("  {:02}:00  {}", row.hour, row.transactions);
    }

    println!("\nTrades by weekday:");
    for row in analysis::by_weekday(records) {
        println!("  {:<9}  {}", row.day_name, row.transactions);
    }

    println!("\nTop buyers:");
    for row in analysis::top_buyers(records, analysis::SUMMARY_TRADERS) {
        println!("  {}  {}", row.address, row.transactions);
    }

    println!("\nTop sellers:");
    for row in analysis::top_sellers(records, analysis::SUMMARY_TRADERS) {
        println!("  {}  {}", row.address, row.transactions);
    }
}
