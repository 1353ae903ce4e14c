//! Summary tables and the representative sample of a collected dataset.

use std::{cmp::Reverse, collections::HashSet, fmt::Display, path::Path};

use itertools::{Itertools, MinMaxResult};
use rand::Rng;
use serde::Serialize;
use tracing::info;

use crate::{error::SinkError, sink, types::TradeRecord};

/// Number of rows in the top buyers/sellers tables.
pub const TOP_TRADERS: usize = 100;

/// Number of buyers/sellers listed in the printed summary.
pub const SUMMARY_TRADERS: usize = 10;

/// Default sample size.
pub const SAMPLE_SIZE: usize = 1000;

/// Dataset wide figures.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BasicStats {
    pub total: usize,

    /// Earliest and latest trade date.
    pub date_range: Option<(String, String)>,
    pub unique_buyers: usize,
    pub unique_sellers: usize,
}

impl BasicStats {
    pub fn new(records: &[TradeRecord]) -> Self {
        let date_range = match records.iter().map(|r| &r.date).minmax() {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(date) => Some((date.clone(), date.clone())),
            MinMaxResult::MinMax(first, last) => Some((first.clone(), last.clone())),
        };
        Self {
            total: records.len(),
            date_range,
            unique_buyers: records.iter().map(|r| &r.buyer).collect::<HashSet<_>>().len(),
            unique_sellers: records.iter().map(|r| &r.seller).collect::<HashSet<_>>().len(),
        }
    }
}

impl Display for BasicStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total transactions: {}", self.total)?;
        if let Some((first, last)) = &self.date_range {
            writeln!(f, "Date range: {first} to {last}")?;
        }
        writeln!(f, "Unique buyers: {}", self.unique_buyers)?;
        write!(f, "Unique sellers: {}", self.unique_sellers)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HourCount {
    pub hour: u8,
    pub transactions: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WeekdayCount {
    pub day_of_week: u8,
    pub day_name: String,
    pub transactions: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DateCount {
    pub date: String,
    pub transactions: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TraderCount {
    pub address: String,
    pub transactions: usize,
}

/// Trades per hour of day, for the hours that have any.
pub fn by_hour(records: &[TradeRecord]) -> Vec<HourCount> {
    records
        .iter()
        .map(|r| r.hour)
        .counts()
        .into_iter()
        .sorted()
        .map(|(hour, transactions)| HourCount { hour, transactions })
        .collect()
}

/// Trades per weekday, Monday first.
pub fn by_weekday(records: &[TradeRecord]) -> Vec<WeekdayCount> {
    records
        .iter()
        .map(|r| (r.day_of_week, &r.day_name))
        .counts()
        .into_iter()
        .sorted()
        .map(|((day_of_week, day_name), transactions)| WeekdayCount {
            day_of_week,
            day_name: day_name.clone(),
            transactions,
        })
        .collect()
}

/// Trades per calendar date, oldest first.
pub fn by_date(records: &[TradeRecord]) -> Vec<DateCount> {
    records
        .iter()
        .map(|r| &r.date)
        .counts()
        .into_iter()
        .sorted()
        .map(|(date, transactions)| DateCount {
            date: date.clone(),
            transactions,
        })
        .collect()
}

fn top<'a>(addresses: impl Iterator<Item = &'a String>, n: usize) -> Vec<TraderCount> {
    addresses
        .counts()
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
        .take(n)
        .map(|(address, transactions)| TraderCount {
            address: address.clone(),
            transactions,
        })
        .collect()
}

/// `n` most active buyers, by trade count.
pub fn top_buyers(records: &[TradeRecord], n: usize) -> Vec<TraderCount> {
    top(records.iter().map(|r| &r.buyer), n)
}

/// `n` most active sellers, by trade count.
pub fn top_sellers(records: &[TradeRecord], n: usize) -> Vec<TraderCount> {
    top(records.iter().map(|r| &r.seller), n)
}

/// Sample row, a subset of [`TradeRecord`] columns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SampledRecord {
    /// 1-based rank in the dataset sorted by timestamp, most recent first.
    pub transaction_index: usize,
    pub transaction_hash: String,
    pub seller: String,
    pub buyer: String,
    pub date: String,
    pub time: String,
    pub day_name: String,
    pub hour: u8,
    pub is_weekend: bool,
}

impl SampledRecord {
    fn new(transaction_index: usize, record: &TradeRecord) -> Self {
        Self {
            transaction_index,
            transaction_hash: record.transaction_hash.clone(),
            seller: record.seller.clone(),
            buyer: record.buyer.clone(),
            date: record.date.clone(),
            time: record.time.clone(),
            day_name: record.day_name.clone(),
            hour: record.hour,
            is_weekend: record.is_weekend,
        }
    }
}

/// Representative sample of at most `size` records.
///
/// With more than `size` records, the `size / 2` most recent are kept and
/// the rest of the sample is drawn uniformly, without replacement, from the
/// older ones. Rows come out in rank order.
pub fn sample<R: Rng + ?Sized>(records: &[TradeRecord], size: usize, rng: &mut R) -> Vec<SampledRecord> {
    let ranked = records
        .iter()
        .sorted_by_key(|r| Reverse(r.timestamp))
        .collect_vec();

    if ranked.len() <= size {
        return ranked
            .into_iter()
            .enumerate()
            .map(|(i, record)| SampledRecord::new(i + 1, record))
            .collect();
    }

    let recent = size / 2;
    let older = rand::seq::index::sample(rng, ranked.len() - recent, size - recent)
        .into_vec()
        .into_iter()
        .map(|i| recent + i)
        .sorted();

    (0..recent)
        .chain(older)
        .map(|i| SampledRecord::new(i + 1, ranked[i]))
        .collect()
}

/// Output file names, relative to the output directory.
pub mod files {
    pub const DATASET: &str = "nft_transactions.csv";
    pub const SAMPLE: &str = "llm_nft_transactions_sample.csv";
    pub const HOURLY: &str = "llm_hourly_stats.csv";
    pub const WEEKDAY: &str = "llm_weekday_stats.csv";
    pub const TOP_BUYERS: &str = "llm_top_buyers.csv";
    pub const TOP_SELLERS: &str = "llm_top_sellers.csv";
    pub const DAILY: &str = "llm_daily_transactions.csv";
}

fn write_table<T, I>(dir: &Path, name: &str, rows: I) -> Result<(), SinkError>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let path = dir.join(name);
    let written = sink::write_csv(&path, rows)?;
    info!(path = %path.display(), rows = written, "Saved table");
    Ok(())
}

/// Write the dataset, `sample` and every summary table into `dir`.
pub fn write_tables(
    dir: &Path,
    records: &[TradeRecord],
    sample: &[SampledRecord],
) -> Result<(), SinkError> {
    write_table(dir, files::DATASET, records)?;
    write_table(dir, files::SAMPLE, sample)?;
    write_table(dir, files::HOURLY, by_hour(records))?;
    write_table(dir, files::WEEKDAY, by_weekday(records))?;
    write_table(dir, files::TOP_BUYERS, top_buyers(records, TOP_TRADERS))?;
    write_table(dir, files::TOP_SELLERS, top_sellers(records, TOP_TRADERS))?;
    write_table(dir, files::DAILY, by_date(records))
}
