use std::fmt;

use alloy::primitives::{Address, U256};
use fastnum::UD256;

/// Seaport item type.
///
/// * [`ItemType::Native`] and [`ItemType::Erc20`] are currencies, their amounts
///   are valued in ETH.
/// * [`ItemType::Erc721`], [`ItemType::Erc1155`] and their criteria-based variants
///   are NFT items.
/// * Values outside the known table are kept as [`ItemType::Unknown`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemType {
    Native,
    Erc20,
    Erc721,
    Erc1155,
    Erc721WithCriteria,
    Erc1155WithCriteria,
    Unknown(u8),
}

impl ItemType {
    /// On-chain enum value.
    pub fn raw(&self) -> u8 {
        match self {
            ItemType::Native => 0,
            ItemType::Erc20 => 1,
            ItemType::Erc721 => 2,
            ItemType::Erc1155 => 3,
            ItemType::Erc721WithCriteria => 4,
            ItemType::Erc1155WithCriteria => 5,
            ItemType::Unknown(v) => *v,
        }
    }

    pub fn is_nft(&self) -> bool {
        matches!(
            self,
            ItemType::Erc721
                | ItemType::Erc1155
                | ItemType::Erc721WithCriteria
                | ItemType::Erc1155WithCriteria
        )
    }

    pub fn is_currency(&self) -> bool {
        matches!(self, ItemType::Native | ItemType::Erc20)
    }
}

impl From<u8> for ItemType {
    fn from(value: u8) -> Self {
        match value {
            0 => ItemType::Native,
            1 => ItemType::Erc20,
            2 => ItemType::Erc721,
            3 => ItemType::Erc1155,
            4 => ItemType::Erc721WithCriteria,
            5 => ItemType::Erc1155WithCriteria,
            v => ItemType::Unknown(v),
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::Native => f.write_str("NATIVE"),
            ItemType::Erc20 => f.write_str("ERC20"),
            ItemType::Erc721 => f.write_str("ERC721"),
            ItemType::Erc1155 => f.write_str("ERC1155"),
            ItemType::Erc721WithCriteria => f.write_str("ERC721_WITH_CRITERIA"),
            ItemType::Erc1155WithCriteria => f.write_str("ERC1155_WITH_CRITERIA"),
            ItemType::Unknown(v) => write!(f, "UNKNOWN ({v})"),
        }
    }
}

/// Item provided by the offerer, typically the NFT being sold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OfferItem {
    pub item_type: ItemType,

    pub token: Address,

    /// Token identifier, `None` for currency items.
    pub identifier: Option<U256>,

    /// Amount in the smallest unit of the token.
    pub amount: U256,

    /// Human-readable collection name for NFT items, falls back to the
    /// token address when the name is unknown.
    pub collection_name: Option<String>,

    /// Marketplace page of the NFT item.
    pub marketplace_link: Option<String>,
}

/// Item the offerer is owed, paid out to `recipient`.
#[derive(Clone, Debug, PartialEq)]
pub struct ConsiderationItem {
    pub item_type: ItemType,

    pub token: Address,

    pub identifier: Option<U256>,

    pub amount: U256,

    pub recipient: Address,

    /// Amount valued in ETH for currency items.
    pub amount_eth: Option<UD256>,
}

impl OfferItem {
    pub fn is_nft(&self) -> bool {
        self.item_type.is_nft()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_type_names() {
        assert_eq!(ItemType::from(0).to_string(), "NATIVE");
        assert_eq!(ItemType::from(1).to_string(), "ERC20");
        assert_eq!(ItemType::from(2).to_string(), "ERC721");
        assert_eq!(ItemType::from(3).to_string(), "ERC1155");
        assert_eq!(ItemType::from(5).to_string(), "ERC1155_WITH_CRITERIA");
        assert_eq!(ItemType::from(6).to_string(), "UNKNOWN (6)");
        assert_eq!(ItemType::from(255).to_string(), "UNKNOWN (255)");
    }

    #[test]
    fn test_item_type_classes() {
        for v in 0..=1 {
            assert!(ItemType::from(v).is_currency());
            assert!(!ItemType::from(v).is_nft());
        }
        for v in 2..=5 {
            assert!(ItemType::from(v).is_nft());
            assert!(!ItemType::from(v).is_currency());
        }
        assert!(!ItemType::from(9).is_nft());
        assert!(!ItemType::from(9).is_currency());
        assert_eq!(ItemType::from(9).raw(), 9);
        assert_eq!(ItemType::Erc721WithCriteria.raw(), 4);
    }
}
