//! # MBP-10 Reconstructor
//!
//! Replays a Market-By-Order (MBO) event stream into Market-By-Price
//! records with 10 levels per side (MBP-10).
//!
//! Each add, cancel, modify, trade or fill updates a single-instrument
//! order book. Events that change what a top-10 consumer can see (plus a
//! few boundary cases) are emitted as one output record carrying the
//! post-event snapshot.
//!
//! ## Quick Start
//!
//! ```rust
//! use mbp10_reconstructor::{Action, MboEvent, Mbp10Replayer, Price, Side};
//!
//! let mut replayer = Mbp10Replayer::new();
//!
//! let add = MboEvent::new(1, Action::Add, Side::Bid, Price::from_units(100), 10);
//! let record = replayer.process(&add).expect("add changes the view");
//!
//! assert_eq!(record.depth, Some(0));
//! assert_eq!(record.book.best_bid(), Some(Price::from_units(100)));
//! ```
//!
//! ### Replaying a CSV file
//!
//! ```no_run
//! use mbp10_reconstructor::{CsvSource, MarketDataSource, Mbp10Replayer, Mbp10Writer};
//!
//! let mut replayer = Mbp10Replayer::new();
//! let mut writer = Mbp10Writer::create("output.csv", replayer.book().levels())?;
//! replayer.run(CsvSource::open("mbo.csv")?.messages()?, &mut writer)?;
//! # Ok::<(), mbp10_reconstructor::ReplayError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`price`] | Fixed-point `Price` at 1/10,000 |
//! | [`types`] | `MboEvent`, `Action`, `Side`, `BookUpdate` |
//! | [`lob`] | `OrderBook`, ladders, order index, snapshots |
//! | [`replay`] | Emission rules and the replay driver |
//! | [`decoder`] | MBO CSV record decoding |
//! | [`source`] | `MarketDataSource` trait, CSV and in-memory sources |
//! | [`writer`] | MBP-10 CSV output |

pub mod decoder;
pub mod error;
pub mod lob;
pub mod price;
pub mod replay;
pub mod source;
pub mod types;
pub mod writer;

// Re-exports - Core types
pub use error::{ReplayError, Result};
pub use price::{format_price, Price, PRICE_SCALE};
pub use types::{Action, BookUpdate, MboEvent, Order, Side, MBP_LEVELS};

// Re-exports - Book
pub use lob::{
    BookConfig, BookSnapshot, BookStats, DepthRow, DuplicateAddPolicy, LevelView, OrderBook,
};

// Re-exports - Replay
pub use replay::{decide_emission, Emission, Mbp10Record, Mbp10Replayer, ReplayConfig, ReplayStats};

// Re-exports - I/O
pub use decoder::MboDecoder;
pub use source::{CsvSource, MarketDataSource, SourceMetadata, VecSource};
pub use writer::{Mbp10Writer, DEFAULT_OUTPUT_PATH};
