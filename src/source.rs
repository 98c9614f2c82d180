//! MBO event sources.
//!
//! The replay loop only needs an iterator of events, so sources are
//! abstracted behind [`MarketDataSource`]. Two implementations ship:
//! - [`CsvSource`]: MBO CSV from a file or any `Read`
//! - [`VecSource`]: in-memory events, for tests and simulations
//!
//! # Example
//!
//! ```no_run
//! use mbp10_reconstructor::source::{CsvSource, MarketDataSource};
//!
//! let source = CsvSource::open("mbo.csv")?;
//! println!("Reading {:?}", source.metadata().file_path);
//!
//! for event in source.messages()? {
//!     let event = event?;
//!     // ...
//! }
//! # Ok::<(), mbp10_reconstructor::ReplayError>(())
//! ```

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{Reader, ReaderBuilder, StringRecord};

use crate::decoder::MboDecoder;
use crate::error::{ReplayError, Result};
use crate::types::MboEvent;

/// Read buffer for CSV input.
pub const IO_BUFFER_SIZE: usize = 1 << 20;

// ============================================================================
// Source Metadata
// ============================================================================

/// Metadata about an event source, for logging.
#[derive(Debug, Clone, Default)]
pub struct SourceMetadata {
    /// Original file path (if loaded from file)
    pub file_path: Option<PathBuf>,

    /// Provider name (e.g., "csv", "memory")
    pub provider: Option<String>,

    /// File size in bytes (if applicable)
    pub file_size: Option<u64>,
}

impl SourceMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file_path(mut self, path: impl AsRef<Path>) -> Self {
        self.file_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

// ============================================================================
// Market Data Source Trait
// ============================================================================

/// A single-pass source of MBO events.
///
/// `messages()` consumes `self`. Per-row decoding problems are recovered
/// inside the source; only I/O failures surface as `Err` items.
pub trait MarketDataSource {
    /// The iterator type for events.
    type MessageIter: Iterator<Item = Result<MboEvent>>;

    /// Consume the source and return an iterator over events.
    fn messages(self) -> Result<Self::MessageIter>;

    /// Metadata about the source.
    fn metadata(&self) -> &SourceMetadata;
}

// ============================================================================
// Vector Source (for testing)
// ============================================================================

/// In-memory source.
///
/// ```
/// use mbp10_reconstructor::source::{MarketDataSource, VecSource};
/// use mbp10_reconstructor::{Action, MboEvent, Price, Side};
///
/// let events = vec![
///     MboEvent::new(1, Action::Add, Side::Bid, Price::from_units(100), 10),
///     MboEvent::new(2, Action::Add, Side::Ask, Price::from_units(101), 10),
/// ];
/// let source = VecSource::new(events);
/// assert_eq!(source.messages().unwrap().count(), 2);
/// ```
pub struct VecSource {
    messages: Vec<MboEvent>,
    metadata: SourceMetadata,
}

impl VecSource {
    pub fn new(messages: Vec<MboEvent>) -> Self {
        Self {
            metadata: SourceMetadata::new().with_provider("memory"),
            messages,
        }
    }

    pub fn with_metadata(mut self, metadata: SourceMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

impl MarketDataSource for VecSource {
    type MessageIter =
        std::iter::Map<std::vec::IntoIter<MboEvent>, fn(MboEvent) -> Result<MboEvent>>;

    fn messages(self) -> Result<Self::MessageIter> {
        Ok(self.messages.into_iter().map(Ok as fn(MboEvent) -> Result<MboEvent>))
    }

    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }
}

// ============================================================================
// CSV Source
// ============================================================================

/// MBO CSV source. The first record is a header and is skipped.
///
/// Rows may be shorter or longer than the header; missing columns decode
/// as empty.
pub struct CsvSource<R: Read> {
    reader: Reader<R>,
    metadata: SourceMetadata,
}

fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder
        .has_headers(true)
        .flexible(true)
        .buffer_capacity(IO_BUFFER_SIZE);
    builder
}

impl CsvSource<File> {
    /// Open a CSV file.
    ///
    /// # Errors
    /// [`ReplayError::InputNotFound`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ReplayError::InputNotFound {
            path: path.to_path_buf(),
            source,
        })?;

        let mut metadata = SourceMetadata::new()
            .with_provider("csv")
            .with_file_path(path);
        if let Ok(meta) = file.metadata() {
            metadata.file_size = Some(meta.len());
        }

        Ok(Self {
            reader: reader_builder().from_reader(file),
            metadata,
        })
    }
}

impl<R: Read> CsvSource<R> {
    /// Wrap any reader.
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader: reader_builder().from_reader(reader),
            metadata: SourceMetadata::new().with_provider("csv"),
        }
    }
}

impl<R: Read> MarketDataSource for CsvSource<R> {
    type MessageIter = CsvEvents<R>;

    fn messages(self) -> Result<Self::MessageIter> {
        Ok(CsvEvents {
            reader: self.reader,
            decoder: MboDecoder::new(),
            record: StringRecord::new(),
            done: false,
        })
    }

    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }
}

/// Iterator over decoded CSV rows.
///
/// Blank rows are skipped. Iteration ends after the first read error.
pub struct CsvEvents<R: Read> {
    reader: Reader<R>,
    decoder: MboDecoder,
    record: StringRecord,
    done: bool,
}

impl<R: Read> CsvEvents<R> {
    /// The decoder, for its row and malformed-field counters.
    pub fn decoder(&self) -> &MboDecoder {
        &self.decoder
    }
}

impl<R: Read> Iterator for CsvEvents<R> {
    type Item = Result<MboEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.reader.read_record(&mut self.record) {
                Ok(true) => {
                    if self.record.iter().all(|f| f.trim().is_empty()) {
                        continue;
                    }
                    return Some(Ok(self.decoder.decode(&self.record)));
                }
                Ok(false) => self.done = true,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Action, Side};
    use std::io::Cursor;

    const CSV: &str = "ts_recv,ts_event,rtype,publisher_id,instrument_id,action,side,price,size,channel_id,order_id,flags,ts_in_delta,sequence,symbol
t0,t0,160,2,1108,R,N,,0,0,0,8,0,0,ARL

t1,t1,160,2,1108,A,B,5.51,100,0,817593,130,165200,851012,ARL
";

    #[test]
    fn test_csv_source_skips_header_and_blank_lines() {
        let source = CsvSource::from_reader(Cursor::new(CSV));
        assert_eq!(source.metadata().provider.as_deref(), Some("csv"));

        let mut events = source.messages().unwrap();
        let first = events.next().unwrap().unwrap();
        assert_eq!(first.action, Action::Clear);
        let second = events.next().unwrap().unwrap();
        assert_eq!(second.action, Action::Add);
        assert_eq!(second.side, Side::Bid);
        assert!(events.next().is_none());
        assert_eq!(events.decoder().rows_decoded(), 2);
    }

    #[test]
    fn test_crlf_and_quoted_fields() {
        let text = "ts_recv,ts_event,rtype,publisher_id,instrument_id,action,side,price,size,channel_id,order_id,flags,ts_in_delta,sequence,symbol\r\n\
                    t1,t1,160,2,1108,A,A,\"5.52\",200,0,42,130,165200,851013,\"ARL\"\r\n";
        let mut events = CsvSource::from_reader(Cursor::new(text)).messages().unwrap();
        let event = events.next().unwrap().unwrap();
        assert_eq!(event.side, Side::Ask);
        assert_eq!(event.price, crate::price::Price::from_raw(55_200));
        assert_eq!(event.order_id, 42);
        assert_eq!(event.symbol, "ARL");
        assert!(events.next().is_none());
    }

    #[test]
    fn test_short_row_is_accepted() {
        let text = "a,b,c\nt1,t2,160,2,1108,C,A,10.5,3\n";
        let mut events = CsvSource::from_reader(Cursor::new(text)).messages().unwrap();
        let event = events.next().unwrap().unwrap();
        assert_eq!(event.action, Action::Cancel);
        assert_eq!(event.size, 3);
        assert_eq!(event.symbol, "");
    }

    #[test]
    fn test_bad_utf8_ends_iteration_with_error() {
        let mut bytes = b"h1,h2\nt,t,160,2,1108,A,B,1.00,1,0,1,0,0,0,".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
        bytes.extend_from_slice(b"t,t,160,2,1108,A,B,1.00,1,0,2,0,0,0,ARL\n");
        let mut events = CsvSource::from_reader(Cursor::new(bytes)).messages().unwrap();
        assert!(matches!(events.next(), Some(Err(ReplayError::Csv(_)))));
        assert!(events.next().is_none());
    }

    #[test]
    fn test_header_only_yields_nothing() {
        let source = CsvSource::from_reader(Cursor::new("ts_recv,ts_event\n"));
        assert_eq!(source.messages().unwrap().count(), 0);
    }

    #[test]
    fn test_open_missing_file() {
        let err = CsvSource::open("/definitely/not/here.csv").err().unwrap();
        assert!(matches!(err, ReplayError::InputNotFound { .. }));
        assert!(err.is_startup());
    }

    #[test]
    fn test_vec_source() {
        let events = vec![MboEvent::new(
            1,
            Action::Add,
            Side::Bid,
            crate::price::Price::from_units(1),
            1,
        )];
        let source = VecSource::new(events)
            .with_metadata(SourceMetadata::new().with_provider("test"));
        assert_eq!(source.metadata().provider.as_deref(), Some("test"));
        assert_eq!(source.messages().unwrap().filter(|e| e.is_ok()).count(), 1);
    }
}
