//! Test doubles and fixtures.
//!
//! [`ScriptedSource`] serves pages out of a synthetic remote dataset and can
//! be told to answer specific requests with an empty page or a failure.
//! [`MemoryCheckpoint`] keeps the checkpoint in memory and counts saves.
//!
//! [`raw_sale`] and [`order_fulfilled`] build subgraph records and Seaport
//! logs for normalizer and decoder tests.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    time::Duration,
};

use alloy::{
    primitives::{Address, B256, Log, U256},
    sol_types::SolEvent,
};

use crate::{
    abi::seaport::Seaport::{OrderFulfilled, ReceivedItem, SpentItem},
    checkpoint::CheckpointStore,
    error::{CheckpointError, FetchError},
    subgraph::{PageOutcome, PageSource},
    types::{BigInt, RawSale, TradeRecord},
};

/// Timestamp of the most recent synthetic trade.
pub const LATEST_TIMESTAMP: i64 = 1_700_000_000;

/// Sleep replacement that returns immediately.
pub fn no_sleep(_: Duration) -> futures::future::Ready<()> {
    futures::future::ready(())
}

/// Raw subgraph record with the given fields and a derived order hash.
pub fn raw_sale(tx_hash: &str, offerer: &str, recipient: &str, ts: &str, block: &str) -> RawSale {
    RawSale {
        id: Some(format!("{tx_hash}-0")),
        offerer: Some(offerer.to_string()),
        recipient: Some(recipient.to_string()),
        zone: Some(Address::ZERO.to_string()),
        order_hash: Some(format!("{tx_hash}-order")),
        offer: None,
        consideration: None,
        block_number: Some(BigInt::Text(block.to_string())),
        transaction_hash: Some(tx_hash.to_string()),
        block_timestamp: Some(BigInt::Text(ts.to_string())),
    }
}

/// Scripted answer to a single page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Serve the requested window of the synthetic dataset.
    Serve,
    Empty,
    Fail,
}

/// Page source over `rows` synthetic trades, one minute apart, most recent
/// first.
///
/// Requests consume [`Step`]s from the script; once it is exhausted every
/// request is served.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    rows: usize,
    malformed_every: Option<usize>,
    script: RefCell<VecDeque<Step>>,
    requests: RefCell<Vec<(usize, usize)>>,
}

impl ScriptedSource {
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            ..Default::default()
        }
    }

    pub fn with_script(self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.script.borrow_mut().extend(steps);
        self
    }

    /// Every row whose index is a multiple of `n` carries a malformed
    /// timestamp.
    pub fn with_malformed_every(mut self, n: usize) -> Self {
        self.malformed_every = Some(n.max(1));
        self
    }

    /// `(first, skip)` of every request received so far.
    pub fn requests(&self) -> Vec<(usize, usize)> {
        self.requests.borrow().clone()
    }

    /// Synthetic row at the given remote offset.
    pub fn row(&self, index: usize) -> RawSale {
        let ts = LATEST_TIMESTAMP - 60 * index as i64;
        let mut sale = raw_sale(
            &format!("0x{index:064x}"),
            &format!("0xseller{:02}", index % 7),
            &format!("0xbuyer{:02}", index % 11),
            &ts.to_string(),
            &(18_000_000 - index as i64 / 4).to_string(),
        );
        if self.malformed_every.is_some_and(|n| index % n == 0) {
            sale.block_timestamp = Some(BigInt::Text("not-a-timestamp".to_string()));
        }
        sale
    }
}

impl PageSource for ScriptedSource {
    async fn fetch_page(&self, first: usize, skip: usize) -> PageOutcome {
        self.requests.borrow_mut().push((first, skip));
        let step = self.script.borrow_mut().pop_front().unwrap_or(Step::Serve);
        match step {
            Step::Serve => {
                let end = (skip + first).min(self.rows);
                PageOutcome::from(Ok((skip.min(end)..end).map(|i| self.row(i)).collect()))
            }
            Step::Empty => PageOutcome::Empty,
            Step::Fail => PageOutcome::Failed(FetchError::Status {
                status: 503,
                body: "service unavailable".to_string(),
            }),
        }
    }
}

/// In-memory checkpoint.
#[derive(Debug, Default)]
pub struct MemoryCheckpoint {
    records: RefCell<Option<Vec<TradeRecord>>>,
    saves: Cell<usize>,
    fail_saves: bool,
}

impl MemoryCheckpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<TradeRecord>) -> Self {
        Self {
            records: RefCell::new(Some(records)),
            ..Default::default()
        }
    }

    /// Checkpoint whose saves always fail.
    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Default::default()
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.get()
    }

    pub fn stored(&self) -> Option<Vec<TradeRecord>> {
        self.records.borrow().clone()
    }
}

impl CheckpointStore for MemoryCheckpoint {
    fn load(&self) -> Result<Option<Vec<TradeRecord>>, CheckpointError> {
        Ok(self.records.borrow().clone())
    }

    fn save(&self, records: &[TradeRecord]) -> Result<(), CheckpointError> {
        self.saves.set(self.saves.get() + 1);
        if self.fail_saves {
            return Err(CheckpointError::Io(std::io::Error::other("disk full")));
        }
        *self.records.borrow_mut() = Some(records.to_vec());
        Ok(())
    }

    fn clear(&self) -> Result<(), CheckpointError> {
        self.records.borrow_mut().take();
        Ok(())
    }
}

pub fn spent_item(item_type: u8, token: Address, identifier: u64, amount: u64) -> SpentItem {
    SpentItem {
        itemType: item_type,
        token,
        identifier: U256::from(identifier),
        amount: U256::from(amount),
    }
}

pub fn received_item(item_type: u8, token: Address, amount: U256, recipient: Address) -> ReceivedItem {
    ReceivedItem {
        itemType: item_type,
        token,
        identifier: U256::ZERO,
        amount,
        recipient,
    }
}

/// `OrderFulfilled` event of a single NFT sold for ETH, with the price split
/// between the seller and a fee recipient.
pub fn order_fulfilled(
    offerer: Address,
    recipient: Address,
    nft: Address,
    token_id: u64,
    seller_share: U256,
    fee: U256,
    fee_recipient: Address,
) -> OrderFulfilled {
    OrderFulfilled {
        orderHash: B256::repeat_byte(0x42),
        offerer,
        zone: Address::ZERO,
        recipient,
        offer: vec![spent_item(2, nft, token_id, 1)],
        consideration: vec![
            received_item(0, Address::ZERO, seller_share, offerer),
            received_item(0, Address::ZERO, fee, fee_recipient),
        ],
    }
}

/// Log emitted by `emitter` carrying the given event.
pub fn event_log(emitter: Address, event: &OrderFulfilled) -> Log {
    Log {
        address: emitter,
        data: event.encode_log_data(),
    }
}
