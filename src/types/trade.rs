use serde::{Deserialize, Serialize};

/// Weekday names indexed by `day_of_week`, Monday first.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Normalized subgraph trade.
///
/// Field names double as the checkpoint and dataset column names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub transaction_hash: String,
    pub order_hash: String,

    /// Offerer of the order.
    pub seller: String,

    /// Recipient of the offered items.
    pub buyer: String,

    pub zone: String,

    /// Block timestamp, unix seconds.
    pub timestamp: i64,

    /// `YYYY-MM-DD`.
    pub date: String,

    /// `HH:MM:SS`.
    pub time: String,

    /// 0 = Monday, 6 = Sunday.
    pub day_of_week: u8,
    pub day_name: String,
    pub hour: u8,
    pub is_weekend: bool,
    pub block_number: u64,
}

impl TradeRecord {
    /// Identity of the fulfilled order, unique across the dataset unless the
    /// subgraph returns the same event twice.
    pub fn key(&self) -> (&str, &str) {
        (&self.transaction_hash, &self.order_hash)
    }
}
