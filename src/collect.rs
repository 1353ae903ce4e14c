//! Resumable, checkpointed collection of subgraph trades.
//!
//! [`Collector::collect`] drives repeated page requests against a
//! [`PageSource`] until the configured number of records is accumulated,
//! or until [`CollectorConfig::max_consecutive_failures`] requests in a row
//! brought nothing back.
//!
//! Progress survives restarts: the accumulated records are periodically
//! written to a [`CheckpointStore`], and a new run resumes from the
//! length of the stored snapshot.

use std::{collections::HashSet, future::Future, time::Duration};

use chrono::TimeZone;
use tracing::{debug, info, warn};

use crate::{
    checkpoint::CheckpointStore,
    normalize::Normalizer,
    subgraph::{PageOutcome, PageSource},
    types::TradeRecord,
};

/// Consecutive empty or failed pages after which collection stops.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;

#[derive(Clone, Debug)]
pub struct CollectorConfig {
    /// Number of records to accumulate.
    pub target: usize,

    /// Records requested per page.
    pub page_size: usize,

    /// Save a checkpoint each time the record count crosses a multiple of
    /// this value. Zero saves only when the target is reached.
    pub checkpoint_interval: usize,

    /// Pause between consecutive page requests.
    pub page_delay: Duration,

    /// Pause after a failed page request.
    pub error_delay: Duration,

    pub max_consecutive_failures: u32,

    /// Skip records whose `(transaction_hash, order_hash)` is already
    /// collected, e.g. when new trades shift subgraph offsets between pages.
    pub dedupe: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            target: 5000,
            page_size: 100,
            checkpoint_interval: 1000,
            page_delay: Duration::from_secs(1),
            error_delay: Duration::from_secs(5),
            max_consecutive_failures: MAX_CONSECUTIVE_FAILURES,
            dedupe: false,
        }
    }
}

/// Why the collection loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    TargetReached,
    BreakerTripped,
}

/// Accumulated records, in collection order.
#[derive(Clone, Debug, Default)]
pub struct CollectionState {
    records: Vec<TradeRecord>,
    seen: HashSet<(String, String)>,
}

impl CollectionState {
    pub fn new(records: Vec<TradeRecord>) -> Self {
        let seen = records.iter().map(owned_key).collect();
        Self { records, seen }
    }

    pub fn processed_count(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<TradeRecord> {
        self.records
    }

    /// Append a batch, returning the number of records actually added.
    pub fn merge(&mut self, batch: Vec<TradeRecord>, dedupe: bool) -> usize {
        let before = self.records.len();
        for record in batch {
            let fresh = self.seen.insert(owned_key(&record));
            if dedupe && !fresh {
                continue;
            }
            self.records.push(record);
        }
        self.records.len() - before
    }
}

fn owned_key(record: &TradeRecord) -> (String, String) {
    let (tx, order) = record.key();
    (tx.to_string(), order.to_string())
}

/// Outcome of [`Collector::collect`].
#[derive(Debug)]
pub struct CollectionReport {
    pub records: Vec<TradeRecord>,
    pub stop_reason: StopReason,

    /// Number of records restored from the checkpoint.
    pub resumed_from: usize,

    /// Page requests issued, including failed ones.
    pub pages_requested: usize,

    /// Raw records rejected by the normalizer.
    pub dropped: usize,

    /// Records skipped as already collected.
    pub duplicates: usize,
}

pub struct Collector<P, C, Tz, S> {
    source: P,
    store: C,
    normalizer: Normalizer<Tz>,
    config: CollectorConfig,
    sleep: S,
}

impl<P, C, Tz, S, SFut> Collector<P, C, Tz, S>
where
    P: PageSource,
    C: CheckpointStore,
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
    S: Fn(Duration) -> SFut,
    SFut: Future<Output = ()>,
{
    /// `sleep` is used for the pauses between requests; pass
    /// [`tokio::time::sleep`] at runtime.
    pub fn new(
        source: P,
        store: C,
        normalizer: Normalizer<Tz>,
        config: CollectorConfig,
        sleep: S,
    ) -> Self {
        Self {
            source,
            store,
            normalizer,
            config,
            sleep,
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    fn restore(&self) -> CollectionState {
        match self.store.load() {
            Ok(Some(records)) => {
                info!(records = records.len(), "Loaded previous progress from checkpoint");
                CollectionState::new(records)
            }
            Ok(None) => CollectionState::default(),
            Err(err) => {
                warn!(%err, "Failed to read checkpoint, starting from scratch");
                CollectionState::default()
            }
        }
    }

    /// Returns whether the checkpoint now holds every collected record.
    fn save(&self, state: &CollectionState) -> bool {
        match self.store.save(state.records()) {
            Ok(()) => {
                info!(records = state.processed_count(), "Checkpoint saved");
                true
            }
            Err(err) => {
                warn!(%err, records = state.processed_count(), "Failed to save checkpoint");
                false
            }
        }
    }

    /// Collect records until the target is reached or the failure breaker
    /// trips. Never fails: a tripped breaker saves and returns what was
    /// accumulated.
    pub async fn collect(&self) -> CollectionReport {
        let target = self.config.target;
        let page_size = self.config.page_size.max(1);

        let mut state = self.restore();
        let resumed_from = state.processed_count();

        // Remote offset of the next page
        let mut offset = resumed_from;
        // Records already held by the checkpoint
        let mut saved = resumed_from;
        let mut consecutive_failures = 0u32;
        let mut pages_requested = 0usize;
        let mut dropped = 0usize;
        let mut duplicates = 0usize;

        let stop_reason = loop {
            let processed = state.processed_count();
            if processed >= target {
                break StopReason::TargetReached;
            }

            let first = page_size.min(target - processed);
            pages_requested += 1;
            let outcome = self.source.fetch_page(first, offset).await;
            let request_failed = matches!(outcome, PageOutcome::Failed(_));

            match outcome {
                PageOutcome::Records(batch) => {
                    consecutive_failures = 0;
                    offset += batch.len();

                    let mut normalized = Vec::with_capacity(batch.len());
                    for raw in &batch {
                        match self.normalizer.normalize(raw) {
                            Ok(record) => normalized.push(record),
                            Err(err) => {
                                debug!(%err, id = ?raw.id, "Dropping malformed record");
                                dropped += 1;
                            }
                        }
                    }
                    let candidates = normalized.len();
                    let added = state.merge(normalized, self.config.dedupe);
                    duplicates += candidates - added;

                    let after = state.processed_count();
                    info!(skip = offset - batch.len(), added, processed = after, target, "Merged page");

                    if crosses_interval(processed, after, self.config.checkpoint_interval)
                        || after >= target
                    {
                        if self.save(&state) {
                            saved = after;
                        }
                    }
                }
                PageOutcome::Empty | PageOutcome::Failed(_) => {
                    consecutive_failures += 1;
                    warn!(
                        skip = offset,
                        consecutive_failures,
                        max = self.config.max_consecutive_failures,
                        "No records fetched"
                    );
                    if consecutive_failures >= self.config.max_consecutive_failures {
                        warn!(
                            processed = state.processed_count(),
                            "Too many consecutive failures, stopping"
                        );
                        if state.processed_count() > saved {
                            self.save(&state);
                        }
                        break StopReason::BreakerTripped;
                    }
                }
            }

            if state.processed_count() < target {
                (self.sleep)(if request_failed {
                    self.config.error_delay
                } else {
                    self.config.page_delay
                })
                .await;
            }
        };

        CollectionReport {
            records: state.into_records(),
            stop_reason,
            resumed_from,
            pages_requested,
            dropped,
            duplicates,
        }
    }

    /// Drop the checkpoint once the collected data has been persisted
    /// elsewhere.
    pub fn finish(&self) {
        match self.store.clear() {
            Ok(()) => info!("Checkpoint removed"),
            Err(err) => warn!(%err, "Failed to remove checkpoint"),
        }
    }
}

fn crosses_interval(before: usize, after: usize, interval: usize) -> bool {
    interval > 0 && before / interval < after / interval
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crosses_interval() {
        assert!(crosses_interval(900, 1000, 1000));
        assert!(crosses_interval(950, 1050, 1000));
        assert!(!crosses_interval(1000, 1099, 1000));
        assert!(!crosses_interval(0, 99, 100));
        assert!(crosses_interval(0, 100, 100));
        assert!(!crosses_interval(0, 5000, 0));
    }

    #[test]
    fn test_state_merge() {
        let record = |tx: &str, order: &str| TradeRecord {
            transaction_hash: tx.to_string(),
            order_hash: order.to_string(),
            seller: String::new(),
            buyer: String::new(),
            zone: String::new(),
            timestamp: 0,
            date: String::new(),
            time: String::new(),
            day_of_week: 3,
            day_name: "Thursday".to_string(),
            hour: 0,
            is_weekend: false,
            block_number: 0,
        };

        let mut state = CollectionState::new(vec![record("0x1", "0xa")]);
        assert_eq!(state.merge(vec![record("0x1", "0xa"), record("0x1", "0xb")], true), 1);
        assert_eq!(state.processed_count(), 2);

        // Plain append keeps repeated keys
        assert_eq!(state.merge(vec![record("0x1", "0xa")], false), 1);
        assert_eq!(state.processed_count(), 3);
        assert_eq!(state.records().len(), 3);
    }
}
