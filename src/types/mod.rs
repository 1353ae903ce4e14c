mod item;
mod sale;
mod trade;
mod transaction;

pub use item::{ConsiderationItem, ItemType, OfferItem};
pub use sale::{BigInt, RawSale};
pub use trade::{TradeRecord, WEEKDAY_NAMES};
pub use transaction::{DecodedTransaction, TradeEvent};
