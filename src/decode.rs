//! Seaport trade decoding from transaction receipts.
//!
//! The module separates pure log processing from async I/O:
//!
//! - [`order_fulfilled_events`] - Pure scan of receipt logs for Seaport events
//! - [`consideration_items`] - Pure classification and ETH valuation of payments
//! - [`TransactionDecoder`] - Fetches transaction, receipt and block, then
//!   assembles a [`DecodedTransaction`]

use alloy::{
    eips::BlockNumberOrTag,
    network::TransactionResponse,
    primitives::{Address, Log, TxHash, U256},
    providers::Provider,
    sol_types::SolEvent,
};
use fastnum::UD256;
use tracing::{debug, info};

use crate::{
    Seaport,
    abi::seaport::Seaport::{OrderFulfilled, ReceivedItem, SpentItem},
    error::{DecodeError, Missing},
    naming::NameLookup,
    num,
    types::{ConsiderationItem, DecodedTransaction, ItemType, OfferItem, TradeEvent},
};

/// Decode every `OrderFulfilled` event emitted by `seaport` among `logs`.
///
/// Logs from other contracts, and Seaport logs of other events, are skipped.
pub fn order_fulfilled_events<'a>(
    seaport: Address,
    logs: impl IntoIterator<Item = &'a Log>,
) -> Vec<OrderFulfilled> {
    logs.into_iter()
        .filter(|log| log.address == seaport)
        .filter_map(|log| match OrderFulfilled::decode_log(log) {
            Ok(decoded) => Some(decoded.data),
            Err(err) => {
                debug!(%err, topic = ?log.topics().first(), "Skipping non-OrderFulfilled log");
                None
            }
        })
        .collect()
}

fn identifier(item_type: ItemType, identifier: U256) -> Option<U256> {
    (!item_type.is_currency()).then_some(identifier)
}

/// Classify consideration items, valuing currency items in ETH.
pub fn consideration_items(items: &[ReceivedItem]) -> Vec<ConsiderationItem> {
    items
        .iter()
        .map(|item| {
            let item_type = ItemType::from(item.itemType);
            ConsiderationItem {
                item_type,
                token: item.token,
                identifier: identifier(item_type, item.identifier),
                amount: item.amount,
                recipient: item.recipient,
                amount_eth: item_type
                    .is_currency()
                    .then(|| num::ETHER.from_unsigned(item.amount)),
            }
        })
        .collect()
}

/// Decodes Seaport trades out of transactions.
#[derive(Debug)]
pub struct TransactionDecoder<P, L> {
    provider: P,
    seaport: Seaport,
    names: L,
}

impl<P: Provider, L: NameLookup> TransactionDecoder<P, L> {
    pub fn new(provider: P, seaport: Seaport, names: L) -> Self {
        Self {
            provider,
            seaport,
            names,
        }
    }

    pub fn seaport(&self) -> &Seaport {
        &self.seaport
    }

    /// Fetch and decode a single transaction.
    ///
    /// Fails with [`DecodeError::NotFound`] if the transaction, its receipt or
    /// its block is not available from the provider.
    pub async fn decode(&self, hash: TxHash) -> Result<DecodedTransaction, DecodeError> {
        let (tx, receipt) = futures::try_join!(
            self.provider.get_transaction_by_hash(hash),
            self.provider.get_transaction_receipt(hash)
        )?;
        let tx = tx.ok_or(DecodeError::NotFound {
            what: Missing::Transaction,
            hash,
        })?;
        let receipt = receipt.ok_or(DecodeError::NotFound {
            what: Missing::Receipt,
            hash,
        })?;
        let not_found_block = DecodeError::NotFound {
            what: Missing::Block,
            hash,
        };
        let block_number = receipt.block_number.ok_or(not_found_block)?;
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(block_number))
            .await?
            .ok_or(DecodeError::NotFound {
                what: Missing::Block,
                hash,
            })?;

        let raw_events = order_fulfilled_events(
            self.seaport.address(),
            receipt.inner.logs().iter().map(|log| &log.inner),
        );
        let mut events = Vec::with_capacity(raw_events.len());
        for event in raw_events {
            events.push(self.trade_event(event).await);
        }
        let total_price_eth = events
            .first()
            .map(TradeEvent::total_price_eth)
            .unwrap_or(UD256::ZERO);

        info!(
            %hash,
            block_number,
            trades = events.len(),
            %total_price_eth,
            "Decoded transaction"
        );

        Ok(DecodedTransaction {
            hash,
            from: TransactionResponse::from(&tx),
            to: alloy::consensus::Transaction::to(&tx),
            block_number,
            block_timestamp: block.header.timestamp,
            gas_used: receipt.gas_used,
            gas_price: receipt.effective_gas_price,
            events,
            total_price_eth,
        })
    }

    /// Classify the items of a decoded event, naming NFT collections.
    pub async fn trade_event(&self, event: OrderFulfilled) -> TradeEvent {
        let mut offer = Vec::with_capacity(event.offer.len());
        for item in &event.offer {
            offer.push(self.offer_item(item).await);
        }
        TradeEvent {
            order_hash: event.orderHash,
            offerer: event.offerer,
            zone: event.zone,
            recipient: event.recipient,
            offer,
            consideration: consideration_items(&event.consideration),
        }
    }

    async fn offer_item(&self, item: &SpentItem) -> OfferItem {
        let item_type = ItemType::from(item.itemType);
        let (collection_name, marketplace_link) = if item_type.is_nft() {
            let name = self
                .names
                .name(item.token)
                .await
                .unwrap_or_else(|| item.token.to_string());
            (
                Some(name),
                Some(self.seaport.asset_link(item.token, item.identifier)),
            )
        } else {
            (None, None)
        };
        OfferItem {
            item_type,
            token: item.token,
            identifier: identifier(item_type, item.identifier),
            amount: item.amount,
            collection_name,
            marketplace_link,
        }
    }
}
