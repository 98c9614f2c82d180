//! MBO CSV record decoding.
//!
//! Expected column order (header row is skipped by the source):
//!
//! | # | Column | Use |
//! |---|--------|-----|
//! | 0 | ts_recv | pass-through |
//! | 1 | ts_event | pass-through |
//! | 2 | rtype | pass-through |
//! | 3 | publisher_id | pass-through |
//! | 4 | instrument_id | pass-through |
//! | 5 | action | `A`/`C`/`M`/`T`/`F`, others ignored |
//! | 6 | side | `B`/`A`/`N` |
//! | 7 | price | decimal, scaled to fixed point |
//! | 8 | size | unsigned |
//! | 9 | channel_id | unused |
//! | 10 | order_id | unsigned |
//! | 11 | flags | pass-through |
//! | 12 | ts_in_delta | pass-through |
//! | 13 | sequence | pass-through |
//! | 14 | symbol | pass-through |
//!
//! Numeric fields that fail to parse decode as zero and are counted;
//! a bad field never rejects the row.

use csv::StringRecord;

use crate::price::Price;
use crate::types::{Action, MboEvent, Side};

const TS_RECV: usize = 0;
const TS_EVENT: usize = 1;
const RTYPE: usize = 2;
const PUBLISHER_ID: usize = 3;
const INSTRUMENT_ID: usize = 4;
const ACTION: usize = 5;
const SIDE: usize = 6;
const PRICE: usize = 7;
const SIZE: usize = 8;
const ORDER_ID: usize = 10;
const FLAGS: usize = 11;
const TS_IN_DELTA: usize = 12;
const SEQUENCE: usize = 13;
const SYMBOL: usize = 14;

/// Stateful record decoder. Tracks rows decoded and recovered fields.
#[derive(Debug, Clone, Default)]
pub struct MboDecoder {
    rows_decoded: u64,
    malformed_fields: u64,
}

impl MboDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one data record (header excluded). Missing trailing
    /// columns read as empty.
    pub fn decode(&mut self, record: &StringRecord) -> MboEvent {
        self.rows_decoded += 1;
        let line = record.position().map_or(self.rows_decoded, |p| p.line());
        let field = move |i: usize| record.get(i).unwrap_or("");

        let price = self.numeric(line, field(PRICE), "price", Price::parse);
        let size = self.numeric(line, field(SIZE), "size", |s| s.trim().parse::<u64>().ok());
        let order_id = self.numeric(line, field(ORDER_ID), "order_id", |s| {
            s.trim().parse::<u64>().ok()
        });

        MboEvent {
            ts_recv: field(TS_RECV).to_string(),
            ts_event: field(TS_EVENT).to_string(),
            rtype: field(RTYPE).to_string(),
            publisher_id: field(PUBLISHER_ID).to_string(),
            instrument_id: field(INSTRUMENT_ID).to_string(),
            action: field(ACTION)
                .bytes()
                .next()
                .map_or(Action::None, Action::from_byte),
            side: field(SIDE)
                .bytes()
                .next()
                .map_or(Side::None, Side::from_byte),
            price,
            size,
            order_id,
            flags: field(FLAGS).to_string(),
            ts_in_delta: field(TS_IN_DELTA).to_string(),
            sequence: field(SEQUENCE).to_string(),
            symbol: field(SYMBOL).to_string(),
        }
    }

    /// Data rows decoded so far.
    pub fn rows_decoded(&self) -> u64 {
        self.rows_decoded
    }

    /// Non-empty numeric fields that failed to parse and were zeroed.
    pub fn malformed_fields(&self) -> u64 {
        self.malformed_fields
    }

    fn numeric<T: Default>(
        &mut self,
        line: u64,
        raw: &str,
        name: &str,
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> T {
        if raw.trim().is_empty() {
            return T::default();
        }
        match parse(raw) {
            Some(value) => value,
            None => {
                self.malformed_fields += 1;
                log::debug!("Line {line}: unparsable {name} field {raw:?}, using 0");
                T::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADD_LINE: &str = "2025-07-17T08:05:03.360677248Z,2025-07-17T08:05:03.360677248Z,160,2,1108,A,B,5.51,100,0,817593,130,165200,851012,ARL";

    fn record(fields: &str) -> StringRecord {
        StringRecord::from(fields.split(',').collect::<Vec<_>>())
    }

    fn decode(fields: &str) -> MboEvent {
        MboDecoder::new().decode(&record(fields))
    }

    #[test]
    fn test_decode_full_record() {
        let event = decode(ADD_LINE);
        assert_eq!(event.ts_recv, "2025-07-17T08:05:03.360677248Z");
        assert_eq!(event.rtype, "160");
        assert_eq!(event.publisher_id, "2");
        assert_eq!(event.instrument_id, "1108");
        assert_eq!(event.action, Action::Add);
        assert_eq!(event.side, Side::Bid);
        assert_eq!(event.price, Price::from_raw(55_100));
        assert_eq!(event.size, 100);
        assert_eq!(event.order_id, 817_593);
        assert_eq!(event.flags, "130");
        assert_eq!(event.ts_in_delta, "165200");
        assert_eq!(event.sequence, "851012");
        assert_eq!(event.symbol, "ARL");
    }

    #[test]
    fn test_empty_price_is_absent_not_malformed() {
        let mut decoder = MboDecoder::new();
        let event = decoder.decode(&record("t,t,160,2,1108,R,N,,0,0,0,8,0,0,ARL"));
        assert_eq!(event.action, Action::Clear);
        assert_eq!(event.side, Side::None);
        assert_eq!(event.price, Price::ZERO);
        assert_eq!(decoder.malformed_fields(), 0);
    }

    #[test]
    fn test_malformed_numbers_default_to_zero() {
        let mut decoder = MboDecoder::new();
        let event = decoder.decode(&record("t,t,160,2,1108,A,A,abc,xyz,0,-5,0,0,0,ARL"));
        assert_eq!(event.price, Price::ZERO);
        assert_eq!(event.size, 0);
        assert_eq!(event.order_id, 0);
        assert_eq!(decoder.malformed_fields(), 3);
        assert_eq!(decoder.rows_decoded(), 1);
    }

    #[test]
    fn test_short_record_fills_defaults() {
        let event = decode("t1,t2,160,2,1108,C,A,10.5,3");
        assert_eq!(event.action, Action::Cancel);
        assert_eq!(event.price, Price::from_raw(105_000));
        assert_eq!(event.size, 3);
        assert_eq!(event.order_id, 0);
        assert_eq!(event.symbol, "");
    }
}
