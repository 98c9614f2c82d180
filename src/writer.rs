//! MBP-10 CSV sink.
//!
//! Header layout (first column is an unnamed row index):
//!
//! ```text
//! ,ts_recv,ts_event,rtype,publisher_id,instrument_id,action,side,depth,price,size,
//! flags,ts_in_delta,sequence,bid_px_00,bid_sz_00,bid_ct_00,ask_px_00,ask_sz_00,
//! ask_ct_00,...,bid_px_09,...,ask_ct_09,symbol,order_id
//! ```
//!
//! `rtype` is written as the level count, and `depth` as `-1` when the
//! order is gone after its own add or modify. Prices use
//! [`Price::to_mbp_string`](crate::price::Price::to_mbp_string): empty when
//! zero, at most two decimals otherwise.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{ReplayError, Result};
use crate::replay::Mbp10Record;

/// Default output file name for the CLI.
pub const DEFAULT_OUTPUT_PATH: &str = "output.csv";

/// Index of the first data row.
pub const FIRST_ROW_INDEX: u64 = 1;

/// Depth written when the event's order is no longer resting.
pub const MISSING_DEPTH: i64 = -1;

/// Writes MBP-10 records as CSV.
pub struct Mbp10Writer<W: Write> {
    out: W,
    levels: usize,
    next_index: u64,
}

impl Mbp10Writer<BufWriter<File>> {
    /// Create (or truncate) a CSV file.
    pub fn create(path: impl AsRef<Path>, levels: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| ReplayError::OutputCreate {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(BufWriter::new(file), levels))
    }
}

impl<W: Write> Mbp10Writer<W> {
    pub fn new(out: W, levels: usize) -> Self {
        Self {
            out,
            levels,
            next_index: FIRST_ROW_INDEX,
        }
    }

    /// Rows written so far.
    pub fn rows_written(&self) -> u64 {
        self.next_index - FIRST_ROW_INDEX
    }

    pub fn write_header(&mut self) -> Result<()> {
        self.out.write_all(
            b",ts_recv,ts_event,rtype,publisher_id,instrument_id,action,side,depth,price,size,flags,ts_in_delta,sequence",
        )?;
        for i in 0..self.levels {
            write!(
                self.out,
                ",bid_px_{i:02},bid_sz_{i:02},bid_ct_{i:02},ask_px_{i:02},ask_sz_{i:02},ask_ct_{i:02}"
            )?;
        }
        self.out.write_all(b",symbol,order_id\n")?;
        Ok(())
    }

    pub fn write_record(&mut self, record: &Mbp10Record<'_>) -> Result<()> {
        let e = record.event;
        write!(
            self.out,
            "{},{},{},{},{},{},{},{},{}",
            self.next_index,
            e.ts_recv,
            e.ts_event,
            self.levels,
            e.publisher_id,
            e.instrument_id,
            record.action.to_byte() as char,
            record.side.to_byte() as char,
            record.depth.map_or(MISSING_DEPTH, |d| d as i64),
        )?;
        write!(
            self.out,
            ",{},{},{},{},{}",
            e.price.to_mbp_string(),
            e.size,
            e.flags,
            e.ts_in_delta,
            e.sequence
        )?;

        for row in record.book.rows().iter().take(self.levels) {
            write!(
                self.out,
                ",{},{},{},{},{},{}",
                row.bid.price.to_mbp_string(),
                row.bid.size,
                row.bid.count,
                row.ask.price.to_mbp_string(),
                row.ask.size,
                row.ask.count
            )?;
        }
        writeln!(self.out, ",{},{}", e.symbol, e.order_id)?;

        self.next_index += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    /// Flush and return the inner writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
