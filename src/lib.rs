//! Seaport trade collection SDK.
//!
//! # Overview
//!
//! Two independent pipelines over Seaport `OrderFulfilled` events:
//!
//! * Subgraph collection. [`collect::Collector`] pages through a GraphQL
//!   indexing endpoint via a [`subgraph::PageSource`], normalizes every raw
//!   record into a [`types::TradeRecord`] with [`normalize::Normalizer`],
//!   and periodically persists progress to a [`checkpoint::CheckpointStore`]
//!   so an interrupted run resumes where it stopped.
//!
//! * Transaction decoding. [`decode::TransactionDecoder`] fetches a
//!   transaction, its receipt and block through an alloy provider, scans the
//!   receipt logs for events emitted by the [`Seaport`] contract and
//!   classifies offer/consideration items. [`batch`] runs it over a list of
//!   hashes and flattens the results into rows.
//!
//! [`analysis`] produces summary tables and the representative sample over
//! a collected dataset.
//!
//! # Limitations/follow-ups
//!
//! * Subgraph pagination uses `skip` offsets, so trades inserted between
//!   page requests shift the window. [`collect::CollectorConfig::dedupe`]
//!   guards against the resulting duplicates but can not recover skipped
//!   records.
//!
//! * `total_price_eth` sums every currency consideration item, i.e. seller
//!   proceeds together with marketplace fees and royalties.
//!
//! # Testing
//!
//! [`testing`] module provides scripted page sources, an in-memory
//! checkpoint store and builders for raw subgraph records and Seaport logs.

pub mod abi;
pub mod analysis;
pub mod batch;
pub mod checkpoint;
pub mod collect;
pub mod decode;
pub mod error;
pub mod naming;
pub mod normalize;
pub mod num;
pub mod sink;
pub mod subgraph;
pub mod testing;
pub mod types;

use alloy::primitives::{Address, address};

#[derive(Clone, Debug)]
/// Seaport deployment the decoder is looking for.
pub struct Seaport {
    chain_id: u64,
    address: Address,
    marketplace_url: String,
}

impl Seaport {
    /// Seaport 1.5 on Ethereum mainnet.
    pub fn mainnet() -> Self {
        Self {
            chain_id: 1,
            address: address!("0x00000000000000ADc04C56Bf30aC9d3c0aAF14dC"),
            marketplace_url: "https://opensea.io/assets".to_string(),
        }
    }

    pub fn custom(chain_id: u64, address: Address, marketplace_url: impl Into<String>) -> Self {
        Self {
            chain_id,
            address,
            marketplace_url: marketplace_url.into(),
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Link to the marketplace page of the given token.
    pub fn asset_link(&self, token: Address, identifier: impl std::fmt::Display) -> String {
        format!(
            "{}/{}/{}",
            self.marketplace_url.trim_end_matches('/'),
            token,
            identifier
        )
    }
}
