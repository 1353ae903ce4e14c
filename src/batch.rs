//! Decoding of transaction hash lists into flat rows.

use std::{fmt::Display, future::Future, path::Path};

use alloy::{primitives::TxHash, providers::Provider};
use chrono::TimeZone;
use fastnum::UD256;
use itertools::Itertools;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    decode::TransactionDecoder,
    error::{DecodeError, SinkError},
    naming::NameLookup,
    num, sink,
    types::DecodedTransaction,
};

/// Anything that turns a transaction hash into a [`DecodedTransaction`].
pub trait TransactionSource {
    fn decode(&self, hash: TxHash) -> impl Future<Output = Result<DecodedTransaction, DecodeError>>;
}

impl<P: Provider, L: NameLookup> TransactionSource for TransactionDecoder<P, L> {
    fn decode(&self, hash: TxHash) -> impl Future<Output = Result<DecodedTransaction, DecodeError>> {
        TransactionDecoder::decode(self, hash)
    }
}

/// Decode result of a single input hash.
#[derive(Debug)]
pub struct BatchItem {
    pub hash: TxHash,
    pub result: Result<DecodedTransaction, DecodeError>,
}

/// Decode `hashes` one after another, in input order.
///
/// Failures are kept in the corresponding [`BatchItem`] and do not stop the
/// batch.
pub async fn decode_batch<S: TransactionSource>(source: &S, hashes: &[TxHash]) -> Vec<BatchItem> {
    let mut items = Vec::with_capacity(hashes.len());
    for (i, hash) in hashes.iter().copied().enumerate() {
        info!(n = i + 1, total = hashes.len(), %hash, "Processing transaction");
        let result = source.decode(hash).await;
        if let Err(err) = &result {
            warn!(%hash, %err, "Failed to decode transaction");
        }
        items.push(BatchItem { hash, result });
    }
    items
}

/// Flat, CSV friendly view of a [`BatchItem`].
///
/// Rows of failed decodes carry only `hash` and `error`. Trade columns are
/// filled from the first `OrderFulfilled` event and its first NFT item.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TransactionRow {
    pub hash: String,
    pub block_number: Option<u64>,
    pub timestamp: Option<u64>,

    /// `YYYY-MM-DD HH:MM:SS` of the block timestamp.
    pub datetime: Option<String>,

    #[serde(rename = "from_address")]
    pub from: Option<String>,

    #[serde(rename = "to_address")]
    pub to: Option<String>,

    pub gas_used: Option<u64>,
    pub gas_price_gwei: Option<String>,

    #[serde(rename = "tx_fee_eth")]
    pub fee_eth: Option<String>,

    pub has_nft_trade: bool,
    pub seller: Option<String>,
    pub buyer: Option<String>,
    pub price_eth: Option<String>,
    pub nft_token_address: Option<String>,
    pub nft_token_id: Option<String>,
    pub nft_collection: Option<String>,
    pub nft_type: Option<String>,
    pub error: Option<String>,
}

impl TransactionRow {
    pub fn new<Tz>(item: &BatchItem, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        match &item.result {
            Ok(tx) => Self::decoded(tx, tz),
            Err(err) => Self {
                hash: item.hash.to_string(),
                error: Some(err.to_string()),
                ..Default::default()
            },
        }
    }

    fn decoded<Tz>(tx: &DecodedTransaction, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let datetime = i64::try_from(tx.block_timestamp)
            .ok()
            .and_then(|ts| tz.timestamp_opt(ts, 0).single())
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string());
        let trade = tx.trade();
        let nft = trade.and_then(|t| t.first_nft());

        Self {
            hash: tx.hash.to_string(),
            block_number: Some(tx.block_number),
            timestamp: Some(tx.block_timestamp),
            datetime,
            from: Some(tx.from.to_string()),
            to: tx.to.map(|to| to.to_string()),
            gas_used: Some(tx.gas_used),
            gas_price_gwei: Some(tx.gas_price_gwei().to_string()),
            fee_eth: Some(tx.fee_eth().to_string()),
            has_nft_trade: tx.has_order_fulfilled(),
            seller: trade.map(|t| t.offerer.to_string()),
            buyer: trade.map(|t| t.recipient.to_string()),
            price_eth: trade.map(|_| tx.total_price_eth.to_string()),
            nft_token_address: nft.map(|i| i.token.to_string()),
            nft_token_id: nft.and_then(|i| i.identifier).map(|id| id.to_string()),
            nft_collection: nft.and_then(|i| i.collection_name.clone()),
            nft_type: nft.map(|i| i.item_type.to_string()),
            error: None,
        }
    }
}

/// Flatten `items` into rows.
pub fn rows<Tz>(items: &[BatchItem], tz: &Tz) -> Vec<TransactionRow>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    items.iter().map(|item| TransactionRow::new(item, tz)).collect()
}

/// Write rows as CSV to `path`.
pub fn write_rows(path: &Path, rows: &[TransactionRow]) -> Result<usize, SinkError> {
    let written = sink::write_csv(path, rows)?;
    info!(path = %path.display(), rows = written, "Saved transactions");
    Ok(written)
}

/// Aggregates over a decoded batch.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchSummary {
    pub transactions: usize,
    pub failed: usize,
    pub nft_trades: usize,

    /// Mean `total_price_eth` over NFT trades.
    pub average_price_eth: Option<UD256>,
    pub max_price_eth: Option<UD256>,

    /// Most traded collections with their trade count, most frequent first.
    pub top_collections: Vec<(String, usize)>,
}

impl BatchSummary {
    pub const TOP_COLLECTIONS: usize = 5;

    pub fn new(items: &[BatchItem]) -> Self {
        let trades = items
            .iter()
            .filter_map(|item| item.result.as_ref().ok())
            .filter(|tx| tx.has_order_fulfilled())
            .collect_vec();

        let prices = trades.iter().map(|tx| tx.total_price_eth).collect_vec();
        let average_price_eth = (!prices.is_empty()).then(|| {
            let sum = prices.iter().fold(UD256::ZERO, |acc, p| acc + *p);
            sum / num::Converter::new(0).from_u128(prices.len() as u128)
        });
        let max_price_eth = prices.iter().copied().reduce(|a, b| if b > a { b } else { a });

        let top_collections = trades
            .iter()
            .filter_map(|tx| tx.trade()?.first_nft()?.collection_name.clone())
            .counts()
            .into_iter()
            .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
            .take(Self::TOP_COLLECTIONS)
            .collect();

        Self {
            transactions: items.len(),
            failed: items.iter().filter(|item| item.result.is_err()).count(),
            nft_trades: trades.len(),
            average_price_eth,
            max_price_eth,
            top_collections,
        }
    }
}

impl Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Transactions: {}", self.transactions)?;
        writeln!(f, "Failed: {}", self.failed)?;
        writeln!(f, "NFT trades: {}", self.nft_trades)?;
        if let Some(avg) = &self.average_price_eth {
            writeln!(f, "Average price: {avg} ETH")?;
        }
        if let Some(max) = &self.max_price_eth {
            writeln!(f, "Max price: {max} ETH")?;
        }
        if !self.top_collections.is_empty() {
            writeln!(f, "Top collections:")?;
            for (name, count) in &self.top_collections {
                writeln!(f, "  {name}: {count}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use alloy::primitives::{Address, B256, U256};
    use chrono::Utc;
    use fastnum::{decimal::Context, udec256};

    use super::*;
    use crate::{
        error::Missing,
        types::{ItemType, OfferItem, TradeEvent},
    };

    fn trade(collection: &str, price: UD256) -> TradeEvent {
        TradeEvent {
            order_hash: B256::repeat_byte(1),
            offerer: Address::repeat_byte(0x11),
            zone: Address::ZERO,
            recipient: Address::repeat_byte(0x22),
            offer: vec![OfferItem {
                item_type: ItemType::Erc721,
                token: Address::repeat_byte(0x33),
                identifier: Some(U256::from(42)),
                amount: U256::from(1),
                collection_name: Some(collection.to_string()),
                marketplace_link: None,
            }],
            consideration: vec![crate::types::ConsiderationItem {
                item_type: ItemType::Native,
                token: Address::ZERO,
                identifier: None,
                amount: U256::ZERO,
                recipient: Address::repeat_byte(0x11),
                amount_eth: Some(price),
            }],
        }
    }

    fn transaction(hash: TxHash, events: Vec<TradeEvent>) -> DecodedTransaction {
        let total_price_eth = events
            .first()
            .map(TradeEvent::total_price_eth)
            .unwrap_or(UD256::ZERO);
        DecodedTransaction {
            hash,
            from: Address::repeat_byte(0x22),
            to: Some(Address::repeat_byte(0x44)),
            block_number: 18_500_000,
            block_timestamp: 1_700_000_000,
            gas_used: 200_000,
            gas_price: 30_000_000_000,
            events,
            total_price_eth,
        }
    }

    fn decimal(column: &Option<String>) -> UD256 {
        UD256::from_str(column.as_deref().unwrap(), Context::default()).unwrap()
    }

    struct FakeSource {
        transactions: HashMap<TxHash, DecodedTransaction>,
    }

    impl TransactionSource for FakeSource {
        async fn decode(&self, hash: TxHash) -> Result<DecodedTransaction, DecodeError> {
            self.transactions
                .get(&hash)
                .cloned()
                .ok_or(DecodeError::NotFound {
                    what: Missing::Transaction,
                    hash,
                })
        }
    }

    fn source() -> FakeSource {
        let transactions = [
            transaction(B256::repeat_byte(1), vec![trade("Azuki", udec256!(12.5))]),
            transaction(B256::repeat_byte(2), vec![]),
            transaction(
                B256::repeat_byte(3),
                vec![trade("Doodles", udec256!(2.5)), trade("Azuki", udec256!(100))],
            ),
            transaction(B256::repeat_byte(4), vec![trade("Azuki", udec256!(3))]),
        ]
        .into_iter()
        .map(|tx| (tx.hash, tx))
        .collect();
        FakeSource { transactions }
    }

    #[tokio::test]
    async fn test_batch_isolates_failures() {
        let hashes = [
            B256::repeat_byte(1),
            B256::repeat_byte(9),
            B256::repeat_byte(2),
            B256::repeat_byte(3),
        ];
        let items = decode_batch(&source(), &hashes).await;

        assert_eq!(items.len(), 4);
        assert_eq!(items.iter().map(|i| i.hash).collect_vec(), hashes);
        assert!(matches!(
            items[1].result,
            Err(DecodeError::NotFound {
                what: Missing::Transaction,
                ..
            })
        ));

        let rows = rows(&items, &Utc);
        let failed = &rows[1];
        assert_eq!(failed.hash, B256::repeat_byte(9).to_string());
        assert!(failed.error.as_deref().unwrap().contains("transaction not found"));
        assert_eq!(
            failed,
            &TransactionRow {
                hash: failed.hash.clone(),
                error: failed.error.clone(),
                ..Default::default()
            }
        );

        let sale = &rows[0];
        assert!(sale.has_nft_trade);
        assert_eq!(sale.datetime.as_deref(), Some("2023-11-14 22:13:20"));
        assert_eq!(decimal(&sale.price_eth), udec256!(12.5));
        assert_eq!(decimal(&sale.gas_price_gwei), udec256!(30));
        assert_eq!(decimal(&sale.fee_eth), udec256!(0.006));
        assert_eq!(sale.nft_token_id.as_deref(), Some("42"));
        assert_eq!(sale.nft_type.as_deref(), Some("ERC721"));
        assert_eq!(sale.nft_collection.as_deref(), Some("Azuki"));
        assert_eq!(sale.error, None);

        let plain = &rows[2];
        assert!(!plain.has_nft_trade);
        assert_eq!(plain.seller, None);
        assert_eq!(plain.price_eth, None);
        assert_eq!(plain.block_number, Some(18_500_000));

        // First event is the trade
        assert_eq!(rows[3].nft_collection.as_deref(), Some("Doodles"));
        assert_eq!(decimal(&rows[3].price_eth), udec256!(2.5));
    }

    #[tokio::test]
    async fn test_batch_summary() {
        let hashes = (1..=4).map(B256::repeat_byte).chain([B256::repeat_byte(9)]).collect_vec();
        let items = decode_batch(&source(), &hashes).await;
        let summary = BatchSummary::new(&items);

        assert_eq!(summary.transactions, 5);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.nft_trades, 3);
        assert_eq!(summary.average_price_eth, Some(udec256!(6)));
        assert_eq!(summary.max_price_eth, Some(udec256!(12.5)));
        assert_eq!(
            summary.top_collections,
            vec![("Azuki".to_string(), 2), ("Doodles".to_string(), 1)]
        );

        let empty = BatchSummary::new(&[]);
        assert_eq!(empty.average_price_eth, None);
        assert!(empty.top_collections.is_empty());
    }

    #[tokio::test]
    async fn test_write_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nft_transactions.csv");
        let items = decode_batch(&source(), &[B256::repeat_byte(1), B256::repeat_byte(9)]).await;

        assert_eq!(write_rows(&path, &rows(&items, &Utc)).unwrap(), 2);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "hash");
        assert_eq!(&headers[4], "from_address");
        assert_eq!(&headers[8], "tx_fee_eth");
        assert_eq!(&headers[17], "error");
        assert_eq!(reader.records().count(), 2);
    }
}
