//! Raw subgraph record normalization.

use std::fmt::Display;

use chrono::{Datelike, TimeZone, Timelike};

use crate::{
    error::NormalizeError,
    types::{BigInt, RawSale, TradeRecord, WEEKDAY_NAMES},
};

/// Converts raw subgraph records into [`TradeRecord`]s.
///
/// Wall-clock fields are derived in the time zone given at construction,
/// [`chrono::Local`] to match the analyst's clock or [`chrono::Utc`] for
/// reproducible output.
#[derive(Clone, Debug)]
pub struct Normalizer<Tz> {
    tz: Tz,
}

impl<Tz> Normalizer<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Normalize a single record.
    ///
    /// Fails if the transaction hash is missing or the block timestamp is not
    /// an integer. Missing addresses and order hash default to empty strings,
    /// a missing or malformed block number to zero.
    pub fn normalize(&self, raw: &RawSale) -> Result<TradeRecord, NormalizeError> {
        let transaction_hash = raw
            .transaction_hash
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or(NormalizeError::MissingField("transactionHash"))?
            .to_string();

        let timestamp = integer(raw.block_timestamp.as_ref(), "blockTimestamp")?;
        let block_number = raw
            .block_number
            .as_ref()
            .and_then(BigInt::as_i64)
            .and_then(|n| u64::try_from(n).ok())
            .unwrap_or_default();

        let date_time = self
            .tz
            .timestamp_opt(timestamp, 0)
            .single()
            .ok_or(NormalizeError::TimestampOutOfRange(timestamp))?;
        let day_of_week = date_time.weekday().num_days_from_monday() as u8;

        Ok(TradeRecord {
            transaction_hash,
            order_hash: raw.order_hash.clone().unwrap_or_default(),
            seller: raw.offerer.clone().unwrap_or_default(),
            buyer: raw.recipient.clone().unwrap_or_default(),
            zone: raw.zone.clone().unwrap_or_default(),
            timestamp,
            date: date_time.format("%Y-%m-%d").to_string(),
            time: date_time.format("%H:%M:%S").to_string(),
            day_of_week,
            day_name: WEEKDAY_NAMES[day_of_week as usize].to_string(),
            hour: date_time.hour() as u8,
            is_weekend: day_of_week >= 5,
            block_number,
        })
    }
}

fn integer(value: Option<&BigInt>, field: &'static str) -> Result<i64, NormalizeError> {
    let value = value.ok_or(NormalizeError::MissingField(field))?;
    value.as_i64().ok_or_else(|| NormalizeError::InvalidInteger {
        field,
        value: value.as_text(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, Utc};

    use super::*;
    use crate::testing::raw_sale;

    #[test]
    fn test_normalize_reference_record() {
        let raw = raw_sale("0xabc", "0xA", "0xB", "1700000000", "100");
        let record = Normalizer::new(Utc).normalize(&raw).unwrap();

        assert_eq!(record.transaction_hash, "0xabc");
        assert_eq!(record.seller, "0xA");
        assert_eq!(record.buyer, "0xB");
        assert_eq!(record.timestamp, 1700000000);
        assert_eq!(record.block_number, 100);
        assert_eq!(record.date, "2023-11-14");
        assert_eq!(record.time, "22:13:20");
        assert_eq!(record.day_of_week, 1);
        assert_eq!(record.day_name, "Tuesday");
        assert_eq!(record.hour, 22);
        assert!(!record.is_weekend);
    }

    #[test]
    fn test_normalize_uses_configured_zone() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let raw = raw_sale("0xabc", "0xA", "0xB", "1700000000", "100");
        let record = Normalizer::new(tokyo).normalize(&raw).unwrap();

        assert_eq!(record.date, "2023-11-15");
        assert_eq!(record.time, "07:13:20");
        assert_eq!(record.day_name, "Wednesday");
        assert_eq!(record.hour, 7);
    }

    #[test]
    fn test_weekend_boundaries() {
        let normalizer = Normalizer::new(Utc);
        let at = |ts: &str| {
            normalizer
                .normalize(&raw_sale("0x1", "0xA", "0xB", ts, "1"))
                .unwrap()
        };

        // Friday 23:59:59, Saturday 00:00:00
        assert!(!at("1700265599").is_weekend);
        let saturday = at("1700265600");
        assert_eq!(saturday.day_name, "Saturday");
        assert!(saturday.is_weekend);

        // Sunday 23:59:59, Monday 00:00:00
        let sunday = at("1700438399");
        assert_eq!(sunday.day_of_week, 6);
        assert!(sunday.is_weekend);
        let monday = at("1700438400");
        assert_eq!(monday.day_of_week, 0);
        assert!(!monday.is_weekend);
    }

    #[test]
    fn test_weekend_matches_day_of_week() {
        let normalizer = Normalizer::new(Utc);
        for step in 0..(14 * 24) {
            let ts = (1699920000 + step * 3600 + 17).to_string();
            let record = normalizer
                .normalize(&raw_sale("0x1", "0xA", "0xB", &ts, "1"))
                .unwrap();
            assert_eq!(record.is_weekend, record.day_of_week >= 5);
            assert_eq!(record.day_name, WEEKDAY_NAMES[record.day_of_week as usize]);
            assert_eq!(record.hour as i64, (step % 24) as i64);
        }
    }

    #[test]
    fn test_normalize_rejects_malformed() {
        let normalizer = Normalizer::new(Utc);

        let mut missing_hash = raw_sale("0xabc", "0xA", "0xB", "1700000000", "100");
        missing_hash.transaction_hash = None;
        assert_eq!(
            normalizer.normalize(&missing_hash),
            Err(NormalizeError::MissingField("transactionHash"))
        );

        let empty_hash = raw_sale("", "0xA", "0xB", "1700000000", "100");
        assert!(normalizer.normalize(&empty_hash).is_err());

        let bad_ts = raw_sale("0xabc", "0xA", "0xB", "yesterday", "100");
        assert_eq!(
            normalizer.normalize(&bad_ts),
            Err(NormalizeError::InvalidInteger {
                field: "blockTimestamp",
                value: "yesterday".to_string()
            })
        );

        let mut missing_ts = raw_sale("0xabc", "0xA", "0xB", "1", "100");
        missing_ts.block_timestamp = None;
        assert_eq!(
            normalizer.normalize(&missing_ts),
            Err(NormalizeError::MissingField("blockTimestamp"))
        );
    }

    #[test]
    fn test_normalize_defaults_optional_fields() {
        let raw = RawSale {
            transaction_hash: Some("0xabc".to_string()),
            block_timestamp: Some(BigInt::Number(1700000000)),
            ..Default::default()
        };
        let record = Normalizer::new(Utc).normalize(&raw).unwrap();
        assert_eq!(record.seller, "");
        assert_eq!(record.order_hash, "");
        assert_eq!(record.block_number, 0);
    }
}
