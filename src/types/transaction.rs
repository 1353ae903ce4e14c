use alloy::primitives::{Address, B256, TxHash, U256};
use fastnum::UD256;

use super::{ConsiderationItem, OfferItem};
use crate::num;

/// Decoded Seaport `OrderFulfilled` event.
#[derive(Clone, Debug, PartialEq)]
pub struct TradeEvent {
    pub order_hash: B256,

    /// Seller.
    pub offerer: Address,

    pub zone: Address,

    /// Buyer.
    pub recipient: Address,

    /// What the offerer provided, in event order.
    pub offer: Vec<OfferItem>,

    /// What the offerer is owed, in event order.
    pub consideration: Vec<ConsiderationItem>,
}

impl TradeEvent {
    /// Sum of consideration items valued in ETH.
    ///
    /// Includes marketplace fees and royalties, not just the seller's share.
    pub fn total_price_eth(&self) -> UD256 {
        self.consideration
            .iter()
            .filter_map(|item| item.amount_eth)
            .fold(UD256::ZERO, |acc, eth| acc + eth)
    }

    /// First NFT item of the offer.
    pub fn first_nft(&self) -> Option<&OfferItem> {
        self.offer.iter().find(|item| item.is_nft())
    }
}

/// Transaction with its Seaport trade details.
#[derive(Clone, derive_more::Debug)]
pub struct DecodedTransaction {
    pub hash: TxHash,

    /// Sender.
    pub from: Address,

    /// Receiver, `None` for contract creation.
    pub to: Option<Address>,

    pub block_number: u64,

    /// Block timestamp, unix seconds.
    pub block_timestamp: u64,

    pub gas_used: u64,

    /// Effective gas price in wei.
    pub gas_price: u128,

    /// All `OrderFulfilled` events emitted by the Seaport contract, in log
    /// order.
    pub events: Vec<TradeEvent>,

    /// [`TradeEvent::total_price_eth`] of the first event, zero if there are none.
    #[debug("{total_price_eth}")]
    pub total_price_eth: UD256,
}

impl DecodedTransaction {
    pub fn has_order_fulfilled(&self) -> bool {
        !self.events.is_empty()
    }

    /// Trade represented by this transaction: the first decoded event.
    pub fn trade(&self) -> Option<&TradeEvent> {
        self.events.first()
    }

    pub fn gas_price_gwei(&self) -> UD256 {
        num::GWEI.from_u128(self.gas_price)
    }

    /// Transaction fee, `gas_used * gas_price`, in ETH.
    pub fn fee_eth(&self) -> UD256 {
        num::ETHER.from_unsigned(U256::from(self.gas_used) * U256::from(self.gas_price))
    }
}
